use arrow::{
    array::{
        Array, ArrayRef, AsArray, Date32Array, Date32Builder, Float64Array, Int32Array,
        StringArray,
    },
    compute::{
        filter_record_batch,
        kernels::{
            boolean::is_not_null,
            temporal::{date_part, DatePart},
        },
    },
    datatypes::{DataType, Date32Type, Field, Float64Type, Int32Type, Schema, SchemaRef},
    error::ArrowError,
    record_batch::RecordBatch,
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::process::{
    date_parser::parse_date,
    raw_table::{RawTable, DATE_COLUMN, UNIT_COLUMN, VALUE_COLUMN},
};

pub const YEAR_COLUMN: &str = "year";

static CLEAN_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| {
    Arc::new(Schema::new(vec![
        Field::new(DATE_COLUMN, DataType::Date32, false),
        Field::new(VALUE_COLUMN, DataType::Float64, false),
        Field::new(UNIT_COLUMN, DataType::Utf8, true),
        Field::new(YEAR_COLUMN, DataType::Int32, false),
    ]))
});

/// A row that passed cleaning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanedRecord {
    pub date: NaiveDate,
    pub value: f64,
    pub year: i32,
}

/// Rows with a parsed date and a value: `date: Date32`, `value: Float64`,
/// `unit: Utf8?`, `year: Int32`.
#[derive(Debug, Clone)]
pub struct CleanedTable {
    batch: RecordBatch,
    /// Raw rows dropped for a missing value.
    pub dropped_value: usize,
    /// Raw rows dropped because the date did not parse.
    pub dropped_date: usize,
}

impl CleanedTable {
    pub fn schema() -> SchemaRef {
        Arc::clone(&CLEAN_SCHEMA)
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn dates(&self) -> &Date32Array {
        self.batch.column(0).as_primitive::<Date32Type>()
    }

    pub fn values(&self) -> &Float64Array {
        self.batch.column(1).as_primitive::<Float64Type>()
    }

    pub fn years(&self) -> &Int32Array {
        self.batch.column(3).as_primitive::<Int32Type>()
    }

    pub fn records(&self) -> Vec<CleanedRecord> {
        let dates = self.dates();
        let values = self.values();
        let years = self.years();
        (0..self.num_rows())
            .filter_map(|i| {
                Some(CleanedRecord {
                    date: dates.value_as_date(i)?,
                    value: values.value(i),
                    year: years.value(i),
                })
            })
            .collect()
    }
}

/// Drop rows without a value, parse dates, drop rows whose date did not
/// parse, then attach the calendar year. Never fails on bad rows; an empty
/// result is a valid outcome.
#[instrument(level = "info", skip_all, fields(raw_rows = raw.num_rows()))]
pub fn clean(raw: &RawTable) -> Result<CleanedTable, ArrowError> {
    // 1) rows with a value
    let has_value = is_not_null(raw.values())?;
    let valued = filter_record_batch(raw.batch(), &has_value)?;
    let dropped_value = raw.num_rows() - valued.num_rows();

    // 2) parse dates; failures become nulls
    let dates = parse_dates(valued.column(0).as_string::<i32>());

    // 3) rows with a date
    let has_date = is_not_null(&dates)?;
    let typed = RecordBatch::try_new(
        Arc::new(Schema::new(vec![
            Field::new(DATE_COLUMN, DataType::Date32, true),
            Field::new(VALUE_COLUMN, DataType::Float64, true),
            Field::new(UNIT_COLUMN, DataType::Utf8, true),
        ])),
        vec![
            Arc::new(dates) as ArrayRef,
            Arc::clone(valued.column(1)),
            Arc::clone(valued.column(2)),
        ],
    )?;
    let dated = filter_record_batch(&typed, &has_date)?;
    let dropped_date = valued.num_rows() - dated.num_rows();

    // 4) year
    let years = derive_years(dated.column(0).as_primitive::<Date32Type>())?;

    let mut columns = dated.columns().to_vec();
    columns.push(Arc::new(years) as ArrayRef);
    let batch = RecordBatch::try_new(CleanedTable::schema(), columns)?;

    debug!(kept = batch.num_rows(), dropped_value, dropped_date, "cleaned");
    Ok(CleanedTable {
        batch,
        dropped_value,
        dropped_date,
    })
}

/// Calendar year of each date.
pub fn derive_years(dates: &Date32Array) -> Result<Int32Array, ArrowError> {
    let years = date_part(dates, DatePart::Year)?;
    Ok(years.as_primitive::<Int32Type>().clone())
}

fn parse_dates(raw: &StringArray) -> Date32Array {
    let mut b = Date32Builder::with_capacity(raw.len());
    for opt in raw.iter() {
        b.append_option(opt.and_then(parse_date).map(Date32Type::from_naive_date));
    }
    b.finish()
}
