pub mod aggregate;
pub mod branch;
pub mod types;

pub use aggregate::{aggregate_toptier, AggregateReport, Aggregated, Field, ValueConflict};
pub use branch::{Branch, Exclusion};
pub use types::ToptierAgency;
