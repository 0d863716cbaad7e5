use super::clean::{clean_opt, parse_flag};
use anyhow::{Context, Result};
use csv::StringRecord;
use std::collections::HashMap;

/// One line of the `temp_load_agencies_raw_agency` staging relation.
///
/// A top-tier agency usually appears once per subtier, so several records can
/// describe the same agency with partially null or disagreeing fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAgencyRecord {
    pub cgac_agency_code: Option<String>,
    pub frec: Option<String>,
    pub is_frec: bool,
    pub subtier_code: Option<String>,
    pub include_toptier_without_subtier: bool,
    pub agency_abbreviation: Option<String>,
    pub agency_name: Option<String>,
    pub frec_abbreviation: Option<String>,
    pub frec_entity_description: Option<String>,
    pub mission: Option<String>,
    pub website: Option<String>,
    pub congressional_justification: Option<String>,
    pub icon_filename: Option<String>,
}

/// Maps staging column names to their position in a CSV header.
/// Columns the transform does not use are ignored; absent ones read as null.
#[derive(Debug)]
pub struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn from_headers(headers: &StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_ascii_lowercase(), i))
            .collect();
        Self { positions }
    }

    pub fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    fn cell<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        self.positions.get(column).and_then(|&i| record.get(i))
    }

    fn text(&self, record: &StringRecord, column: &str) -> Option<String> {
        clean_opt(self.cell(record, column))
    }

    fn flag(&self, record: &StringRecord, column: &str) -> Result<bool> {
        parse_flag(self.cell(record, column)).with_context(|| format!("column `{}`", column))
    }

    /// Build a `RawAgencyRecord` from one CSV data row.
    pub fn record(&self, record: &StringRecord) -> Result<RawAgencyRecord> {
        Ok(RawAgencyRecord {
            cgac_agency_code: self.text(record, "cgac_agency_code"),
            frec: self.text(record, "frec"),
            is_frec: self.flag(record, "is_frec")?,
            subtier_code: self.text(record, "subtier_code"),
            include_toptier_without_subtier: self
                .flag(record, "include_toptier_without_subtier")?,
            agency_abbreviation: self.text(record, "agency_abbreviation"),
            agency_name: self.text(record, "agency_name"),
            frec_abbreviation: self.text(record, "frec_abbreviation"),
            frec_entity_description: self.text(record, "frec_entity_description"),
            mission: self.text(record, "mission"),
            website: self.text(record, "website"),
            congressional_justification: self.text(record, "congressional_justification"),
            icon_filename: self.text(record, "icon_filename"),
        })
    }
}
