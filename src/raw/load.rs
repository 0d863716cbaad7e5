use super::record::{ColumnIndex, RawAgencyRecord};
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use glob::glob;
use rayon::prelude::*;
use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Read one staging CSV (header row required) into raw agency records.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_raw_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RawAgencyRecord>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open staging CSV: {:?}", path))?;
    let rows = read_raw(BufReader::new(file))
        .with_context(|| format!("Failed to load staging CSV: {:?}", path))?;
    info!(rows = rows.len(), "loaded staging rows");
    Ok(rows)
}

/// Parse staging rows from any reader.
pub fn read_raw<R: Read>(reader: R) -> Result<Vec<RawAgencyRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().context("reading CSV header row")?.clone();
    let index = ColumnIndex::from_headers(&headers);
    if !index.contains("cgac_agency_code") && !index.contains("frec") {
        warn!("header has neither `cgac_agency_code` nor `frec`; every row will be excluded");
    }

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row = index
            .record(&record)
            .with_context(|| format!("bad staging value on line {}", line))?;
        rows.push(row);
    }
    debug!(rows = rows.len(), "parsed staging records");
    Ok(rows)
}

/// Load `pattern` as a single staging CSV if it names an existing file,
/// otherwise expand it as a glob and load every match in parallel.
/// Rows are concatenated in sorted path order.
pub fn load_raw_glob(pattern: &str) -> Result<Vec<RawAgencyRecord>> {
    // a literal path wins, even when its name contains glob metacharacters
    if Path::new(pattern).is_file() {
        return load_raw_csv(pattern);
    }

    let mut paths: Vec<PathBuf> = glob(pattern)
        .with_context(|| format!("Failed to read glob pattern '{}'", pattern))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to expand glob pattern '{}'", pattern))?;
    paths.retain(|p| p.is_file());
    if paths.is_empty() {
        return Err(anyhow!("No staging files found under '{}'", pattern));
    }
    paths.sort();
    info!(files = paths.len(), pattern, "loading staging files");

    let per_file: Vec<Vec<RawAgencyRecord>> = paths
        .par_iter()
        .map(load_raw_csv)
        .collect::<Result<_>>()?;

    Ok(per_file.into_iter().flatten().collect())
}
