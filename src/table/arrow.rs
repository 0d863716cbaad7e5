use crate::toptier::ToptierAgency;
use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Array, ArrayRef, StringArray, TimestampMicrosecondArray},
    datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit},
    record_batch::RecordBatch,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

const TEXT_COLUMNS: [(&str, bool); 7] = [
    ("cgac_code", false),
    ("abbreviation", true),
    ("name", false),
    ("mission", true),
    ("website", true),
    ("justification", true),
    ("icon_filename", true),
];

fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
}

/// Arrow schema of `temp_load_agencies_toptier_agency`.
pub fn toptier_schema() -> SchemaRef {
    let mut fields = vec![
        Field::new("create_date", timestamp_type(), false),
        Field::new("update_date", timestamp_type(), false),
    ];
    fields.extend(
        TEXT_COLUMNS
            .iter()
            .map(|(name, nullable)| Field::new(*name, DataType::Utf8, *nullable)),
    );
    Arc::new(Schema::new(fields))
}

/// Pack agencies into a single `RecordBatch` in `toptier_schema()` order.
pub fn to_record_batch(rows: &[ToptierAgency]) -> Result<RecordBatch> {
    let stamp = |f: fn(&ToptierAgency) -> DateTime<Utc>| -> ArrayRef {
        let arr = TimestampMicrosecondArray::from_iter_values(
            rows.iter().map(|r| f(r).timestamp_micros()),
        )
        .with_timezone("UTC");
        Arc::new(arr)
    };
    let text = |f: fn(&ToptierAgency) -> Option<&str>| -> ArrayRef {
        Arc::new(rows.iter().map(f).collect::<StringArray>())
    };

    let columns: Vec<ArrayRef> = vec![
        stamp(|r| r.create_date),
        stamp(|r| r.update_date),
        text(|r| Some(r.cgac_code.as_str())),
        text(|r| r.abbreviation.as_deref()),
        text(|r| Some(r.name.as_str())),
        text(|r| r.mission.as_deref()),
        text(|r| r.website.as_deref()),
        text(|r| r.justification.as_deref()),
        text(|r| r.icon_filename.as_deref()),
    ];

    RecordBatch::try_new(toptier_schema(), columns).context("building toptier record batch")
}

fn string_column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("missing column `{}`", name))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| anyhow!("column `{}` is not Utf8", name))
}

fn timestamp_column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b TimestampMicrosecondArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("missing column `{}`", name))?
        .as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
        .ok_or_else(|| anyhow!("column `{}` is not a microsecond timestamp", name))
}

fn required_text(arr: &StringArray, name: &str, i: usize) -> Result<String> {
    if arr.is_null(i) {
        return Err(anyhow!("null `{}` in row {}", name, i));
    }
    Ok(arr.value(i).to_string())
}

fn optional_text(arr: &StringArray, i: usize) -> Option<String> {
    (!arr.is_null(i)).then(|| arr.value(i).to_string())
}

fn required_stamp(arr: &TimestampMicrosecondArray, name: &str, i: usize) -> Result<DateTime<Utc>> {
    if arr.is_null(i) {
        return Err(anyhow!("null `{}` in row {}", name, i));
    }
    DateTime::from_timestamp_micros(arr.value(i))
        .ok_or_else(|| anyhow!("`{}` out of range in row {}", name, i))
}

/// Unpack a batch written by `to_record_batch`.
pub fn from_record_batch(batch: &RecordBatch) -> Result<Vec<ToptierAgency>> {
    let create = timestamp_column(batch, "create_date")?;
    let update = timestamp_column(batch, "update_date")?;
    let code = string_column(batch, "cgac_code")?;
    let abbreviation = string_column(batch, "abbreviation")?;
    let name = string_column(batch, "name")?;
    let mission = string_column(batch, "mission")?;
    let website = string_column(batch, "website")?;
    let justification = string_column(batch, "justification")?;
    let icon = string_column(batch, "icon_filename")?;

    (0..batch.num_rows())
        .map(|i| {
            Ok(ToptierAgency {
                create_date: required_stamp(create, "create_date", i)?,
                update_date: required_stamp(update, "update_date", i)?,
                cgac_code: required_text(code, "cgac_code", i)?,
                abbreviation: optional_text(abbreviation, i),
                name: required_text(name, "name", i)?,
                mission: optional_text(mission, i),
                website: optional_text(website, i),
                justification: optional_text(justification, i),
                icon_filename: optional_text(icon, i),
            })
        })
        .collect()
}
