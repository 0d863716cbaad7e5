// src/raw/mod.rs
pub mod clean;
pub mod load;
pub mod record;

pub use load::{load_raw_csv, load_raw_glob, read_raw};
pub use record::RawAgencyRecord;
