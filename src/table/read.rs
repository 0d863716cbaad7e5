use super::arrow::from_record_batch;
use crate::toptier::ToptierAgency;
use anyhow::{Context, Result};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{fs::File, path::Path};

/// Read a materialized toptier table back into memory.
pub fn read_toptier<P: AsRef<Path>>(path: P) -> Result<Vec<ToptierAgency>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| {
            format!(
                "failed to create RecordBatchReaderBuilder for `{}`",
                path.display()
            )
        })?
        .with_batch_size(1024)
        .build()
        .with_context(|| format!("failed to build RecordBatchReader for `{}`", path.display()))?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch =
            batch.with_context(|| format!("error reading RecordBatch from `{}`", path.display()))?;
        rows.extend(
            from_record_batch(&batch)
                .with_context(|| format!("decoding toptier rows from `{}`", path.display()))?,
        );
    }
    Ok(rows)
}
