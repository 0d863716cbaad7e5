use super::arrow::to_record_batch;
use super::TOPTIER_TABLE;
use crate::toptier::ToptierAgency;
use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use parquet::{
    arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

/// Drop `<out_dir>/temp_load_agencies_toptier_agency.parquet` if present and
/// write `rows` as a fresh table in its place. Returns the table path.
///
/// Rows go to a `.tmp` sibling first and are renamed over the final path, so a
/// failed write never leaves a partial table behind.
#[tracing::instrument(level = "info", skip(rows, out_dir), fields(rows = rows.len()))]
pub fn materialize<P: AsRef<Path>>(rows: &[ToptierAgency], out_dir: P) -> Result<PathBuf> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {:?}", out_dir))?;

    let final_path = out_dir.join(format!("{}.parquet", TOPTIER_TABLE));
    let tmp_path = out_dir.join(format!("{}.parquet.tmp", TOPTIER_TABLE));

    if final_path.exists() {
        fs::remove_file(&final_path)
            .with_context(|| format!("dropping existing table `{}`", final_path.display()))?;
        info!(path = %final_path.display(), "dropped existing table");
    }

    let batch = to_record_batch(rows)?;
    write_atomic(&tmp_path, &final_path, |p| write_batch(p, &batch))?;

    info!(path = %final_path.display(), "materialized toptier table");
    Ok(final_path)
}

/// Run `write` against `tmp_path`, then rename it over `final_path`.
/// `tmp_path` is removed if `write` fails.
pub(crate) fn write_atomic<F>(tmp_path: &Path, final_path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    if let Err(e) = write(tmp_path) {
        if tmp_path.exists() {
            if let Err(rm) = fs::remove_file(tmp_path) {
                warn!(path = %tmp_path.display(), error = %rm, "could not remove tmp file");
            }
        }
        return Err(e);
    }
    fs::rename(tmp_path, final_path).with_context(|| {
        format!(
            "failed to rename `{}` to `{}`",
            tmp_path.display(),
            final_path.display()
        )
    })
}

/// Write `batch` to `path` as a SNAPPY-compressed Parquet file.
pub(crate) fn write_batch(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("could not create temporary file `{}`", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), batch.schema(), Some(props))
        .with_context(|| format!("creating ArrowWriter for `{}`", path.display()))?;
    writer
        .write(batch)
        .with_context(|| format!("writing batch to `{}`", path.display()))?;
    writer
        .close()
        .with_context(|| format!("closing writer for `{}`", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use tempfile::tempdir;

    #[test]
    fn failed_write_removes_tmp_file() -> Result<()> {
        let dir = tempdir()?;
        let tmp_path = dir.path().join("t.parquet.tmp");
        let final_path = dir.path().join("t.parquet");

        let result = write_atomic(&tmp_path, &final_path, |p| {
            fs::write(p, b"partial")?;
            bail!("disk full")
        });

        assert!(result.is_err());
        assert!(!tmp_path.exists());
        assert!(!final_path.exists());
        Ok(())
    }

    #[test]
    fn successful_write_renames_into_place() -> Result<()> {
        let dir = tempdir()?;
        let tmp_path = dir.path().join("t.parquet.tmp");
        let final_path = dir.path().join("t.parquet");

        write_atomic(&tmp_path, &final_path, |p| Ok(fs::write(p, b"done")?))?;

        assert!(!tmp_path.exists());
        assert_eq!(fs::read(&final_path)?, b"done");
        Ok(())
    }
}
