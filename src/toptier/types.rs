// src/toptier/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of `temp_load_agencies_toptier_agency`.
///
/// `cgac_code` carries either the CGAC code or the FREC code; both
/// namespaces share the column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToptierAgency {
    pub create_date: DateTime<Utc>,
    pub update_date: DateTime<Utc>,
    pub cgac_code: String,
    pub abbreviation: Option<String>,
    pub name: String,
    pub mission: Option<String>,
    pub website: Option<String>,
    pub justification: Option<String>,
    pub icon_filename: Option<String>,
}
