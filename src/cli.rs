//! Command-line arguments for the `agencyload` binary.

use clap::Parser;
use std::path::PathBuf;

/// Build `temp_load_agencies_toptier_agency` from raw agency staging rows.
///
/// Examples:
///   agencyload --raw staging/agency_codes.csv
///   agencyload --raw 'staging/*.csv' --out-dir out --no-history
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Staging CSV path or glob pattern
    #[arg(long, value_name = "PATH|GLOB", env = "AGENCYLOAD_RAW")]
    pub raw: String,

    /// Directory the toptier table is materialized into
    #[arg(long, default_value = "out", value_name = "DIR", env = "AGENCYLOAD_OUT_DIR")]
    pub out_dir: PathBuf,

    /// Directory holding per-run history records
    #[arg(
        long,
        default_value = "history",
        value_name = "DIR",
        env = "AGENCYLOAD_HISTORY_DIR"
    )]
    pub history_dir: PathBuf,

    /// Skip writing a run history record
    #[arg(long)]
    pub no_history: bool,

    /// Abort before materializing if staging rows disagree on any field
    #[arg(long)]
    pub fail_on_conflict: bool,
}
