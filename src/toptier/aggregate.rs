// src/toptier/aggregate.rs
use super::branch::{Branch, Exclusion};
use super::types::ToptierAgency;
use crate::raw::RawAgencyRecord;
use chrono::{DateTime, SubsecRound, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Descriptive columns resolved by taking the max non-null value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Abbreviation,
    Name,
    Mission,
    Website,
    Justification,
    IconFilename,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Abbreviation,
        Field::Name,
        Field::Mission,
        Field::Website,
        Field::Justification,
        Field::IconFilename,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Field::Abbreviation => "abbreviation",
            Field::Name => "name",
            Field::Mission => "mission",
            Field::Website => "website",
            Field::Justification => "justification",
            Field::IconFilename => "icon_filename",
        }
    }

    fn source<'r>(&self, branch: Branch, row: &'r RawAgencyRecord) -> Option<&'r str> {
        match self {
            Field::Abbreviation => branch.abbreviation(row),
            Field::Name => branch.name(row),
            Field::Mission => row.mission.as_deref(),
            Field::Website => row.website.as_deref(),
            Field::Justification => row.congressional_justification.as_deref(),
            Field::IconFilename => row.icon_filename.as_deref(),
        }
    }
}

/// Rows whose grouped staging records disagreed on a descriptive field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueConflict {
    pub cgac_code: String,
    pub field: Field,
    /// Distinct non-null values, ascending.
    pub candidates: Vec<String>,
    /// The value written to the output (the maximum).
    pub chosen: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateReport {
    pub input_rows: usize,
    /// Staging rows that passed each branch's filter.
    pub kept_rows: BTreeMap<Branch, usize>,
    /// Output agencies produced by each branch.
    pub agencies: BTreeMap<Branch, usize>,
    pub excluded: BTreeMap<(Branch, Exclusion), usize>,
    pub conflicts: Vec<ValueConflict>,
}

impl AggregateReport {
    pub fn excluded_total(&self) -> usize {
        self.excluded.values().sum()
    }

    pub fn agencies_in(&self, branch: Branch) -> usize {
        self.agencies.get(&branch).copied().unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct Aggregated {
    pub agencies: Vec<ToptierAgency>,
    pub report: AggregateReport,
}

/// Distinct non-null values seen per field for one identifier.
#[derive(Default)]
struct Group {
    values: BTreeMap<Field, BTreeSet<String>>,
}

impl Group {
    fn absorb(&mut self, branch: Branch, row: &RawAgencyRecord) {
        for field in Field::ALL {
            if let Some(v) = field.source(branch, row) {
                self.values.entry(field).or_default().insert(v.to_string());
            }
        }
    }

    fn max(&self, field: Field) -> Option<String> {
        self.values
            .get(&field)
            .and_then(|set| set.iter().next_back())
            .cloned()
    }
}

/// Collapse staging rows into one `ToptierAgency` per CGAC or FREC code.
///
/// Every output row is stamped with `now` (truncated to microseconds). CGAC
/// agencies come first, then FREC, each ordered by code.
#[tracing::instrument(level = "info", skip(rows), fields(rows = rows.len()))]
pub fn aggregate_toptier(rows: &[RawAgencyRecord], now: DateTime<Utc>) -> Aggregated {
    let now = now.trunc_subsecs(6);
    let mut report = AggregateReport {
        input_rows: rows.len(),
        ..Default::default()
    };
    let mut groups: BTreeMap<Branch, BTreeMap<String, Group>> = BTreeMap::new();

    for (idx, row) in rows.iter().enumerate() {
        let branch = Branch::of(row);
        match branch.admit(row) {
            Ok(key) => {
                *report.kept_rows.entry(branch).or_default() += 1;
                groups
                    .entry(branch)
                    .or_default()
                    .entry(key.to_string())
                    .or_default()
                    .absorb(branch, row);
            }
            Err(reason) => {
                debug!(
                    row = idx,
                    branch = branch.as_str(),
                    reason = reason.as_str(),
                    "excluded staging row"
                );
                *report.excluded.entry((branch, reason)).or_default() += 1;
            }
        }
    }

    let mut agencies = Vec::new();
    for branch in [Branch::Cgac, Branch::Frec] {
        let Some(by_code) = groups.remove(&branch) else {
            continue;
        };
        report.agencies.insert(branch, by_code.len());
        for (code, group) in by_code {
            for (field, set) in &group.values {
                if set.len() > 1 {
                    let candidates: Vec<String> = set.iter().cloned().collect();
                    let chosen = candidates[candidates.len() - 1].clone();
                    warn!(
                        code = %code,
                        field = field.as_str(),
                        candidates = candidates.len(),
                        chosen = %chosen,
                        "staging rows disagree; keeping max"
                    );
                    report.conflicts.push(ValueConflict {
                        cgac_code: code.clone(),
                        field: *field,
                        candidates,
                        chosen,
                    });
                }
            }

            // admit() guarantees a name for every grouped row
            let name = group.max(Field::Name).unwrap_or_default();
            agencies.push(ToptierAgency {
                create_date: now,
                update_date: now,
                abbreviation: group.max(Field::Abbreviation),
                name,
                mission: group.max(Field::Mission),
                website: group.max(Field::Website),
                justification: group.max(Field::Justification),
                icon_filename: group.max(Field::IconFilename),
                cgac_code: code,
            });
        }
    }

    info!(
        cgac = report.agencies_in(Branch::Cgac),
        frec = report.agencies_in(Branch::Frec),
        excluded = report.excluded_total(),
        conflicts = report.conflicts.len(),
        "aggregated toptier agencies"
    );
    Aggregated { agencies, report }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 1, 12, 0, 0).unwrap()
    }

    fn cgac(code: &str, name: &str, subtier: Option<&str>) -> RawAgencyRecord {
        RawAgencyRecord {
            cgac_agency_code: Some(code.into()),
            agency_name: Some(name.into()),
            subtier_code: subtier.map(Into::into),
            ..Default::default()
        }
    }

    fn frec(code: &str, desc: &str, subtier: Option<&str>) -> RawAgencyRecord {
        RawAgencyRecord {
            frec: Some(code.into()),
            frec_entity_description: Some(desc.into()),
            is_frec: true,
            subtier_code: subtier.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn cgac_row_with_subtier_is_kept() {
        let out = aggregate_toptier(&[cgac("012", "Dept X", Some("1200"))], ts());
        assert_eq!(out.agencies.len(), 1);
        let a = &out.agencies[0];
        assert_eq!(a.cgac_code, "012");
        assert_eq!(a.name, "Dept X");
        assert_eq!(a.create_date, ts());
        assert_eq!(a.update_date, ts());
    }

    #[test]
    fn cgac_row_without_subtier_is_dropped() {
        let out = aggregate_toptier(&[cgac("012", "Dept X", None)], ts());
        assert!(out.agencies.is_empty());
        assert_eq!(
            out.report.excluded.get(&(Branch::Cgac, Exclusion::NoSubtier)),
            Some(&1)
        );
    }

    #[test]
    fn frec_row_without_subtier_is_dropped() {
        let out = aggregate_toptier(&[frec("FR01", "Frec Agency", None)], ts());
        assert!(out.agencies.is_empty());
        assert_eq!(
            out.report.excluded.get(&(Branch::Frec, Exclusion::NoSubtier)),
            Some(&1)
        );
        assert_eq!(out.report.excluded_total(), 1);
        assert_eq!(out.report.agencies_in(Branch::Frec), 0);
    }

    #[test]
    fn frec_override_keeps_agency_without_subtier() {
        let mut row = frec("FR01", "Frec Agency", None);
        row.include_toptier_without_subtier = true;
        row.frec_abbreviation = Some("FA".into());
        row.agency_abbreviation = Some("IGNORED".into());
        row.agency_name = Some("Ignored Name".into());

        let out = aggregate_toptier(&[row], ts());
        assert_eq!(out.agencies.len(), 1);
        let a = &out.agencies[0];
        assert_eq!(a.cgac_code, "FR01");
        assert_eq!(a.name, "Frec Agency");
        assert_eq!(a.abbreviation.as_deref(), Some("FA"));
        assert_eq!(out.report.agencies_in(Branch::Frec), 1);
    }

    #[test]
    fn disagreeing_rows_take_max_and_report_conflict() {
        let mut a = cgac("012", "Dept X", Some("1200"));
        a.mission = Some("Alpha mission".into());
        a.website = Some("https://x.gov".into());
        let mut b = cgac("012", "Dept X", Some("1201"));
        b.mission = Some("Beta mission".into());
        let mut c = cgac("012", "Dept X", Some("1202"));
        c.mission = None;

        let out = aggregate_toptier(&[a, b, c], ts());
        assert_eq!(out.agencies.len(), 1);
        let agency = &out.agencies[0];
        assert_eq!(agency.mission.as_deref(), Some("Beta mission"));
        assert_eq!(agency.website.as_deref(), Some("https://x.gov"));
        assert_eq!(out.report.kept_rows.get(&Branch::Cgac), Some(&3));

        // name agrees across rows and website has one value: only mission conflicts
        assert_eq!(out.report.conflicts.len(), 1);
        let conflict = &out.report.conflicts[0];
        assert_eq!(conflict.field, Field::Mission);
        assert_eq!(conflict.cgac_code, "012");
        assert_eq!(conflict.candidates, vec!["Alpha mission", "Beta mission"]);
        assert_eq!(conflict.chosen, "Beta mission");
    }

    #[test]
    fn justification_comes_from_congressional_justification() {
        let mut row = cgac("097", "Defense", Some("9700"));
        row.congressional_justification = Some("https://cj.example".into());
        row.icon_filename = Some("dod.jpg".into());
        let out = aggregate_toptier(&[row], ts());
        assert_eq!(
            out.agencies[0].justification.as_deref(),
            Some("https://cj.example")
        );
        assert_eq!(out.agencies[0].icon_filename.as_deref(), Some("dod.jpg"));
    }

    #[test]
    fn branches_are_partitioned_by_is_frec() {
        // a FREC row carrying a CGAC code must not feed the CGAC branch
        let mut row = frec("FR01", "Frec Agency", Some("1200"));
        row.cgac_agency_code = Some("012".into());
        row.agency_name = Some("Dept X".into());
        let out = aggregate_toptier(&[row, cgac("020", "Treasury", Some("2000"))], ts());

        let codes: Vec<_> = out.agencies.iter().map(|a| a.cgac_code.as_str()).collect();
        assert_eq!(codes, vec!["020", "FR01"]);
    }

    #[test]
    fn filter_failures_never_reach_output() {
        let mut no_name = cgac("030", "x", Some("3000"));
        no_name.agency_name = None;
        let mut no_desc = frec("FR02", "x", Some("3001"));
        no_desc.frec_entity_description = None;
        let mut no_code = frec("FR03", "x", Some("3002"));
        no_code.frec = None;

        let out = aggregate_toptier(&[no_name, no_desc, no_code], ts());
        assert!(out.agencies.is_empty());
        assert_eq!(out.report.excluded_total(), 3);
        assert_eq!(
            out.report.excluded.get(&(Branch::Cgac, Exclusion::MissingName)),
            Some(&1)
        );
        assert_eq!(
            out.report.excluded.get(&(Branch::Frec, Exclusion::MissingName)),
            Some(&1)
        );
        assert_eq!(
            out.report
                .excluded
                .get(&(Branch::Frec, Exclusion::MissingIdentifier)),
            Some(&1)
        );
    }

    #[test]
    fn identifiers_are_unique_and_rerun_is_stable() {
        let rows = vec![
            cgac("012", "Dept X", Some("1200")),
            cgac("012", "Dept X", Some("1201")),
            cgac("013", "Dept Y", Some("1300")),
            frec("1601", "Frec A", Some("1600")),
            frec("1601", "Frec A", Some("1602")),
        ];
        let first = aggregate_toptier(&rows, ts());
        let codes: HashSet<_> = first.agencies.iter().map(|a| &a.cgac_code).collect();
        assert_eq!(codes.len(), first.agencies.len());
        assert_eq!(first.agencies.len(), 3);

        let later = ts() + chrono::Duration::hours(1);
        let second = aggregate_toptier(&rows, later);
        for (a, b) in first.agencies.iter().zip(&second.agencies) {
            assert_eq!(b.create_date, later);
            let b = ToptierAgency {
                create_date: a.create_date,
                update_date: a.update_date,
                ..b.clone()
            };
            assert_eq!(*a, b);
        }
    }

    #[test]
    fn timestamps_truncate_to_micros() {
        let precise = ts() + chrono::Duration::nanoseconds(1_234_567);
        let out = aggregate_toptier(&[cgac("012", "Dept X", Some("1200"))], precise);
        assert_eq!(
            out.agencies[0].create_date,
            ts() + chrono::Duration::microseconds(1_234)
        );
    }
}
