// src/history/mod.rs

use crate::table::write::{write_atomic, write_batch};
use crate::toptier::{AggregateReport, Branch};
use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Array, ArrayRef, Int64Array, TimestampMicrosecondArray},
    datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit},
    record_batch::RecordBatch,
};
use chrono::{DateTime, Utc};
use glob::glob;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{
    fs::{self, File},
    path::PathBuf,
    sync::Arc,
};
use tracing::{info, warn};

/// Summary of one agency load, one Parquet row per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub run_time: DateTime<Utc>,
    pub input_rows: i64,
    pub cgac_agencies: i64,
    pub frec_agencies: i64,
    pub excluded_rows: i64,
    pub conflicts: i64,
}

impl RunRecord {
    pub fn from_report(report: &AggregateReport, run_time: DateTime<Utc>) -> Self {
        Self {
            run_time,
            input_rows: report.input_rows as i64,
            cgac_agencies: report.agencies_in(Branch::Cgac) as i64,
            frec_agencies: report.agencies_in(Branch::Frec) as i64,
            excluded_rows: report.excluded_total() as i64,
            conflicts: report.conflicts.len() as i64,
        }
    }
}

const COUNT_COLUMNS: [&str; 5] = [
    "input_rows",
    "cgac_agencies",
    "frec_agencies",
    "excluded_rows",
    "conflicts",
];

fn run_schema() -> SchemaRef {
    let mut fields = vec![Field::new(
        "run_time",
        DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        false,
    )];
    fields.extend(
        COUNT_COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Int64, false)),
    );
    Arc::new(Schema::new(fields))
}

/// A directory of single-row Parquet files, one per load run.
pub struct RunHistory {
    history_dir: PathBuf,
}

impl RunHistory {
    /// Construct a new history at `history_dir`, creating the directory if needed.
    pub fn new(history_dir: impl Into<PathBuf>) -> Result<Self> {
        let history_dir = history_dir.into();
        fs::create_dir_all(&history_dir)
            .with_context(|| format!("creating history directory {:?}", &history_dir))?;
        Ok(Self { history_dir })
    }

    /// Write `record` as `agencies---<ts_micros>.parquet`.
    pub fn record_run(&self, record: &RunRecord) -> Result<PathBuf> {
        let ts = record.run_time.timestamp_micros();
        let final_path = self.history_dir.join(format!("agencies---{}.parquet", ts));
        let tmp_path = self
            .history_dir
            .join(format!("agencies---{}.parquet.tmp", ts));

        let schema = run_schema();
        let columns: Vec<ArrayRef> = vec![
            Arc::new(TimestampMicrosecondArray::from(vec![ts]).with_timezone("UTC")),
            Arc::new(Int64Array::from(vec![record.input_rows])),
            Arc::new(Int64Array::from(vec![record.cgac_agencies])),
            Arc::new(Int64Array::from(vec![record.frec_agencies])),
            Arc::new(Int64Array::from(vec![record.excluded_rows])),
            Arc::new(Int64Array::from(vec![record.conflicts])),
        ];
        let batch = RecordBatch::try_new(schema, columns)
            .context("building run history record batch")?;

        write_atomic(&tmp_path, &final_path, |p| write_batch(p, &batch))?;
        info!(path = %final_path.display(), "recorded run");
        Ok(final_path)
    }

    /// Load every recorded run, oldest first.
    pub fn load_runs(&self) -> Result<Vec<RunRecord>> {
        let pattern = format!("{}/agencies---*.parquet", self.history_dir.display());
        let mut runs = Vec::new();
        for entry in glob(&pattern).context("invalid glob pattern for run history")? {
            let path = match entry {
                Ok(p) => p,
                Err(e) => {
                    warn!("cannot read glob entry: {:?}", e);
                    continue;
                }
            };
            let file =
                File::open(&path).with_context(|| format!("failed to open `{}`", path.display()))?;
            let reader = ParquetRecordBatchReaderBuilder::try_new(file)
                .with_context(|| format!("failed to read `{}`", path.display()))?
                .build()?;
            for batch in reader {
                let batch = batch?;
                runs.extend(
                    decode_runs(&batch).with_context(|| format!("decoding `{}`", path.display()))?,
                );
            }
        }
        runs.sort_by_key(|r| r.run_time);
        Ok(runs)
    }
}

fn decode_runs(batch: &RecordBatch) -> Result<Vec<RunRecord>> {
    let times = batch
        .column_by_name("run_time")
        .and_then(|c| c.as_any().downcast_ref::<TimestampMicrosecondArray>())
        .ok_or_else(|| anyhow!("missing or mistyped `run_time`"))?;
    let counts = COUNT_COLUMNS
        .iter()
        .map(|name| {
            batch
                .column_by_name(name)
                .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
                .ok_or_else(|| anyhow!("missing or mistyped `{}`", name))
        })
        .collect::<Result<Vec<_>>>()?;

    (0..batch.num_rows())
        .map(|i| {
            let run_time = DateTime::from_timestamp_micros(times.value(i))
                .ok_or_else(|| anyhow!("run_time out of range"))?;
            Ok(RunRecord {
                run_time,
                input_rows: counts[0].value(i),
                cgac_agencies: counts[1].value(i),
                frec_agencies: counts[2].value(i),
                excluded_rows: counts[3].value(i),
                conflicts: counts[4].value(i),
            })
        })
        .collect()
}
