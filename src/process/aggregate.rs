use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::EmptyDatasetError;
use crate::process::clean::CleanedTable;

/// Yearly totals, ascending by year. Only years present in the data appear.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct YearlyAggregate(BTreeMap<i32, f64>);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearTotal {
    pub year: i32,
    pub value: f64,
}

impl YearlyAggregate {
    /// Sum `value` per `year`. Year is the only grouping key.
    pub fn from_cleaned(cleaned: &CleanedTable) -> Self {
        let mut totals = BTreeMap::new();
        let years = cleaned.years().values().iter();
        for (year, value) in years.zip(cleaned.values().values().iter()) {
            *totals.entry(*year).or_insert(0.0) += *value;
        }
        Self(totals)
    }

    pub fn get(&self, year: i32) -> Option<f64> {
        self.0.get(&year).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = YearTotal> + '_ {
        self.0.iter().map(|(&year, &value)| YearTotal { year, value })
    }

    pub fn to_vec(&self) -> Vec<YearTotal> {
        self.iter().collect()
    }
}

#[cfg(test)]
impl FromIterator<(i32, f64)> for YearlyAggregate {
    fn from_iter<I: IntoIterator<Item = (i32, f64)>>(iter: I) -> Self {
        let mut totals = BTreeMap::new();
        for (year, value) in iter {
            *totals.entry(year).or_insert(0.0) += value;
        }
        Self(totals)
    }
}

/// Span and size of the cleaned data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    pub min_year: i32,
    pub max_year: i32,
    pub rows: usize,
}

impl SummaryStats {
    /// Fails with [`EmptyDatasetError`] when no rows survived cleaning.
    pub fn compute(cleaned: &CleanedTable, raw_rows: usize) -> Result<Self, EmptyDatasetError> {
        let years = cleaned.years().values();
        let (Some(&min_year), Some(&max_year)) = (years.iter().min(), years.iter().max()) else {
            return Err(EmptyDatasetError { raw_rows });
        };
        Ok(Self {
            min_year,
            max_year,
            rows: cleaned.num_rows(),
        })
    }
}
