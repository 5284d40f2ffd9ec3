use arrow::{
    array::{new_null_array, Array, AsArray, Float64Builder, StringArray},
    compute::concat_batches,
    csv::{reader::Format, ReaderBuilder},
    datatypes::{DataType, Field, Schema},
    error::ArrowError,
    record_batch::RecordBatch,
};
use std::{io::Cursor, sync::Arc};
use thiserror::Error;
use tracing::debug;

use crate::process::{
    raw_table::{RawTable, DATE_COLUMN, UNIT_COLUMN, VALUE_COLUMN},
    utils::{clean_str, parse_value, NA_VALUES},
};

const BATCH_SIZE: usize = 8192;
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Why a CSV body could not become a [`RawTable`].
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Arrow(#[from] ArrowError),

    #[error("missing `{0}` column")]
    MissingColumn(&'static str),
}

/// Read a CSV body with a header row into a batch where every column is `Utf8`.
/// Empty cells, NA spellings and trailing cells missing from a short row come
/// back as nulls. A row with more cells than the header is an error.
pub fn decode_csv(body: &[u8]) -> Result<RecordBatch, ArrowError> {
    let body = body.strip_prefix(UTF8_BOM).unwrap_or(body);

    // header only; every column stays a string until we pick the ones we need
    let (header, _) = Format::default()
        .with_header(true)
        .infer_schema(Cursor::new(body), Some(0))?;
    let schema = Arc::new(Schema::new(
        header
            .fields()
            .iter()
            .map(|f| Field::new(f.name().trim(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));

    let reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_header(true)
        .with_null_regex(NA_VALUES.clone())
        // short rows pad with nulls; Clean drops them like any missing cell
        .with_truncated_rows(true)
        .with_batch_size(BATCH_SIZE)
        .build(Cursor::new(body))?;

    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    debug!(batches = batches.len(), columns = schema.fields().len(), "decoded csv");
    concat_batches(&schema, &batches)
}

/// Pick `date`, `value` and `unit` out of a decoded batch and type them.
/// Other columns are dropped. `unit` may be absent; the other two may not.
pub fn to_raw_table(batch: &RecordBatch) -> Result<RawTable, ConvertError> {
    let dates = string_column(batch, DATE_COLUMN)?
        .ok_or(ConvertError::MissingColumn(DATE_COLUMN))?;
    let raw_values = string_column(batch, VALUE_COLUMN)?
        .ok_or(ConvertError::MissingColumn(VALUE_COLUMN))?;

    let units = match string_column(batch, UNIT_COLUMN)? {
        Some(units) => units.iter().map(|u| u.map(clean_str)).collect(),
        None => new_null_array(&DataType::Utf8, batch.num_rows())
            .as_string::<i32>()
            .clone(),
    };

    let dates: StringArray = dates.iter().map(|d| d.map(clean_str)).collect();

    let mut values = Float64Builder::with_capacity(raw_values.len());
    for opt in raw_values.iter() {
        values.append_option(opt.and_then(parse_value));
    }

    Ok(RawTable::try_new(dates, values.finish(), units)?)
}

fn string_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<Option<&'a StringArray>, ArrowError> {
    let Some(idx) = batch
        .schema()
        .fields()
        .iter()
        .position(|f| f.name().trim().eq_ignore_ascii_case(name))
    else {
        return Ok(None);
    };
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<StringArray>()
        .map(Some)
        .ok_or_else(|| ArrowError::CastError(format!("column `{}` is not Utf8", name)))
}
