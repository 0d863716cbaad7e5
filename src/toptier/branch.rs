use crate::raw::RawAgencyRecord;

/// Which identifier namespace a staging row belongs to. `is_frec` decides it,
/// so the two branches never see the same row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Branch {
    Cgac,
    Frec,
}

/// Why a staging row did not contribute to any top-tier agency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Exclusion {
    /// `cgac_agency_code` (or `frec`) is null.
    MissingIdentifier,
    /// `agency_name` (or `frec_entity_description`) is null.
    MissingName,
    /// No `subtier_code` and `include_toptier_without_subtier` is not set.
    NoSubtier,
}

impl Exclusion {
    pub fn as_str(&self) -> &str {
        match self {
            Exclusion::MissingIdentifier => "missing_identifier",
            Exclusion::MissingName => "missing_name",
            Exclusion::NoSubtier => "no_subtier",
        }
    }
}

impl Branch {
    pub fn of(row: &RawAgencyRecord) -> Self {
        if row.is_frec {
            Branch::Frec
        } else {
            Branch::Cgac
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Branch::Cgac => "cgac",
            Branch::Frec => "frec",
        }
    }

    pub fn key<'r>(&self, row: &'r RawAgencyRecord) -> Option<&'r str> {
        match self {
            Branch::Cgac => row.cgac_agency_code.as_deref(),
            Branch::Frec => row.frec.as_deref(),
        }
    }

    pub fn name<'r>(&self, row: &'r RawAgencyRecord) -> Option<&'r str> {
        match self {
            Branch::Cgac => row.agency_name.as_deref(),
            Branch::Frec => row.frec_entity_description.as_deref(),
        }
    }

    pub fn abbreviation<'r>(&self, row: &'r RawAgencyRecord) -> Option<&'r str> {
        match self {
            Branch::Cgac => row.agency_abbreviation.as_deref(),
            Branch::Frec => row.frec_abbreviation.as_deref(),
        }
    }

    /// Apply this branch's inclusion filter, returning the grouping key.
    pub fn admit<'r>(&self, row: &'r RawAgencyRecord) -> Result<&'r str, Exclusion> {
        let key = self.key(row).ok_or(Exclusion::MissingIdentifier)?;
        if self.name(row).is_none() {
            return Err(Exclusion::MissingName);
        }
        if row.subtier_code.is_none() && !row.include_toptier_without_subtier {
            return Err(Exclusion::NoSubtier);
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cgac_row() -> RawAgencyRecord {
        RawAgencyRecord {
            cgac_agency_code: Some("012".into()),
            agency_name: Some("Dept X".into()),
            subtier_code: Some("1200".into()),
            frec: Some("FR01".into()),
            frec_entity_description: Some("Frec Agency".into()),
            ..Default::default()
        }
    }

    #[test]
    fn is_frec_picks_the_branch_and_key() {
        let mut row = cgac_row();
        assert_eq!(Branch::of(&row), Branch::Cgac);
        assert_eq!(Branch::of(&row).admit(&row), Ok("012"));

        row.is_frec = true;
        assert_eq!(Branch::of(&row), Branch::Frec);
        assert_eq!(Branch::of(&row).admit(&row), Ok("FR01"));
    }

    #[test]
    fn filter_reasons() {
        let mut row = cgac_row();
        row.subtier_code = None;
        assert_eq!(Branch::Cgac.admit(&row), Err(Exclusion::NoSubtier));
        row.include_toptier_without_subtier = true;
        assert_eq!(Branch::Cgac.admit(&row), Ok("012"));

        row.agency_name = None;
        assert_eq!(Branch::Cgac.admit(&row), Err(Exclusion::MissingName));
        row.cgac_agency_code = None;
        assert_eq!(Branch::Cgac.admit(&row), Err(Exclusion::MissingIdentifier));
    }
}
