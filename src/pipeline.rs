use crate::cli::Args;
use crate::history::{RunHistory, RunRecord};
use crate::raw::load_raw_glob;
use crate::table::materialize;
use crate::toptier::{aggregate_toptier, AggregateReport};
use anyhow::{bail, Result};
use chrono::Utc;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug)]
pub struct LoadOutcome {
    pub table: PathBuf,
    pub report: AggregateReport,
    pub history: Option<PathBuf>,
}

/// Load staging rows, aggregate them, and materialize the toptier table.
pub fn run_load(args: &Args) -> Result<LoadOutcome> {
    let raw = load_raw_glob(&args.raw)?;
    info!(rows = raw.len(), "staging rows loaded");

    let run_time = Utc::now();
    let aggregated = aggregate_toptier(&raw, run_time);
    let report = aggregated.report;

    if args.fail_on_conflict && !report.conflicts.is_empty() {
        bail!(
            "{} conflicting staging values; table not materialized",
            report.conflicts.len()
        );
    }

    let table = materialize(&aggregated.agencies, &args.out_dir)?;

    let history = if args.no_history {
        None
    } else {
        let hist = RunHistory::new(&args.history_dir)?;
        Some(hist.record_run(&RunRecord::from_report(&report, run_time))?)
    };

    Ok(LoadOutcome {
        table,
        report,
        history,
    })
}
