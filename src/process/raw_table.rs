use arrow::{
    array::{Array, ArrayRef, AsArray, Float64Array, StringArray},
    datatypes::{DataType, Field, Float64Type, Schema, SchemaRef},
    error::ArrowError,
    record_batch::RecordBatch,
};
use once_cell::sync::Lazy;
use std::sync::Arc;

pub const DATE_COLUMN: &str = "date";
pub const VALUE_COLUMN: &str = "value";
pub const UNIT_COLUMN: &str = "unit";

static RAW_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| {
    Arc::new(Schema::new(vec![
        Field::new(DATE_COLUMN, DataType::Utf8, true),
        Field::new(VALUE_COLUMN, DataType::Float64, true),
        Field::new(UNIT_COLUMN, DataType::Utf8, true),
    ]))
});

/// One row of the source dataset, as far as the dashboard cares.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRecord {
    pub date: Option<String>,
    pub value: Option<f64>,
    pub unit: Option<String>,
}

#[cfg(test)]
impl RawRecord {
    /// A row with the given date and value, reported in GWh.
    pub fn new(date: &str, value: Option<f64>) -> Self {
        Self {
            date: Some(date.to_string()),
            value,
            unit: Some("GWh".to_string()),
        }
    }
}

/// The source rows, column-wise: `date: Utf8?`, `value: Float64?`, `unit: Utf8?`.
#[derive(Debug, Clone)]
pub struct RawTable {
    batch: RecordBatch,
}

impl RawTable {
    pub fn schema() -> SchemaRef {
        Arc::clone(&RAW_SCHEMA)
    }

    /// Wrap already-typed columns.
    pub fn try_new(
        dates: StringArray,
        values: Float64Array,
        units: StringArray,
    ) -> Result<Self, ArrowError> {
        let columns: Vec<ArrayRef> = vec![Arc::new(dates), Arc::new(values), Arc::new(units)];
        let batch = RecordBatch::try_new(Self::schema(), columns)?;
        Ok(Self { batch })
    }

    #[cfg(test)]
    pub fn from_records(records: &[RawRecord]) -> Result<Self, ArrowError> {
        let dates: StringArray = records.iter().map(|r| r.date.as_deref()).collect();
        let values: Float64Array = records.iter().map(|r| r.value).collect();
        let units: StringArray = records.iter().map(|r| r.unit.as_deref()).collect();
        Self::try_new(dates, values, units)
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

    pub fn dates(&self) -> &StringArray {
        self.batch.column(0).as_string::<i32>()
    }

    pub fn values(&self) -> &Float64Array {
        self.batch.column(1).as_primitive::<Float64Type>()
    }

    pub fn units(&self) -> &StringArray {
        self.batch.column(2).as_string::<i32>()
    }

    /// Rows with a null `value`.
    pub fn null_values(&self) -> usize {
        self.values().null_count()
    }

    /// Most common non-null unit label, if any.
    pub fn dominant_unit(&self) -> Option<String> {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for unit in self.units().iter().flatten() {
            match counts.iter_mut().find(|(u, _)| *u == unit) {
                Some((_, n)) => *n += 1,
                None => counts.push((unit, 1)),
            }
        }
        // first-seen wins ties
        counts
            .into_iter()
            .rev()
            .max_by_key(|(_, n)| *n)
            .map(|(u, _)| u.to_string())
    }

    #[cfg(test)]
    pub fn records(&self) -> Vec<RawRecord> {
        let dates = self.dates();
        let values = self.values();
        let units = self.units();
        (0..self.num_rows())
            .map(|i| RawRecord {
                date: dates.is_valid(i).then(|| dates.value(i).to_string()),
                value: values.is_valid(i).then(|| values.value(i)),
                unit: units.is_valid(i).then(|| units.value(i).to_string()),
            })
            .collect()
    }
}
