// src/table/mod.rs
pub mod arrow;
pub mod read;
pub mod write;

pub use self::arrow::{from_record_batch, to_record_batch, toptier_schema};
pub use read::read_toptier;
pub use write::materialize;

/// Name of the materialized output table.
pub const TOPTIER_TABLE: &str = "temp_load_agencies_toptier_agency";
