use agencyload::table::read_toptier;
use anyhow::{Context, Result};
use std::{
    env,
    io::{self, Write},
    path::Path,
    process::exit,
};

/// Expect exactly one CLI argument: path to a materialized toptier table.
/// On a bad argv, returns the usage line instead.
fn table_arg(args: &[String]) -> Result<&str, String> {
    match args {
        [_, path] => Ok(path.as_str()),
        _ => {
            let prog = args.first().map(String::as_str).unwrap_or("inspect_toptier");
            Err(format!("Usage: {} <PARQUET_FILE>", prog))
        }
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let path = match table_arg(&args) {
        Ok(p) => p,
        Err(usage) => {
            eprintln!("{}", usage);
            exit(1);
        }
    };

    let rows = read_toptier(Path::new(path))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for row in &rows {
        serde_json::to_writer(&mut out, row).context("serializing row")?;
        out.write_all(b"\n")?;
    }
    eprintln!("{} rows", rows.len());
    Ok(())
}
