use agencyload::{cli::Args, pipeline::run_load, toptier::Branch};
use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) parse args ───────────────────────────────────────────────
    let args = Args::parse();

    // ─── 3) load → aggregate → materialize ───────────────────────────
    let outcome = run_load(&args)?;

    for ((branch, reason), n) in &outcome.report.excluded {
        info!(
            branch = branch.as_str(),
            reason = reason.as_str(),
            rows = n,
            "excluded"
        );
    }
    info!(
        table = %outcome.table.display(),
        cgac = outcome.report.agencies_in(Branch::Cgac),
        frec = outcome.report.agencies_in(Branch::Frec),
        conflicts = outcome.report.conflicts.len(),
        "all done"
    );
    Ok(())
}
