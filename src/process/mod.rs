// src/process/mod.rs
pub mod aggregate;
pub mod clean;
pub mod convert;
pub mod date_parser;
pub mod raw_table;
pub mod utils;

use tracing::{info, instrument};

use crate::chart::Chart;
use crate::error::DashboardError;
use aggregate::{SummaryStats, YearlyAggregate};
use clean::clean;
use raw_table::RawTable;

/// Everything the display layer needs from one run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub yearly: YearlyAggregate,
    pub stats: SummaryStats,
    pub chart: Chart,
    /// Most common unit label in the source, for the summary text.
    pub unit: Option<String>,
}

/// clean → derive year → aggregate → stats → chart.
///
/// An input where nothing survives cleaning yields
/// [`DashboardError::EmptyDataset`]; no stats or chart are built for it.
#[instrument(level = "info", skip_all, fields(raw_rows = raw.num_rows()))]
pub fn run(raw: &RawTable) -> Result<PipelineOutput, DashboardError> {
    let cleaned = clean(raw)?;
    info!(
        kept = cleaned.num_rows(),
        dropped_value = cleaned.dropped_value,
        dropped_date = cleaned.dropped_date,
        "cleaned rows"
    );

    let stats = SummaryStats::compute(&cleaned, raw.num_rows())?;
    let yearly = YearlyAggregate::from_cleaned(&cleaned);
    let chart = Chart::from_yearly(&yearly);
    info!(
        min_year = stats.min_year,
        max_year = stats.max_year,
        years = yearly.len(),
        "aggregated"
    );

    Ok(PipelineOutput {
        yearly,
        stats,
        chart,
        unit: raw.dominant_unit(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmptyDatasetError;
    use raw_table::RawRecord;

    fn raw(rows: &[(&str, Option<f64>)]) -> RawTable {
        let records: Vec<RawRecord> = rows.iter().map(|(d, v)| RawRecord::new(d, *v)).collect();
        RawTable::from_records(&records).unwrap()
    }

    #[test]
    fn test_two_years() {
        let out = run(&raw(&[
            ("2020-01-01", Some(100.0)),
            ("2020-06-01", Some(50.0)),
            ("2021-01-01", Some(200.0)),
        ]))
        .unwrap();

        assert_eq!(out.yearly.get(2020), Some(150.0));
        assert_eq!(out.yearly.get(2021), Some(200.0));
        assert_eq!(
            out.stats,
            SummaryStats {
                min_year: 2020,
                max_year: 2021,
                rows: 3
            }
        );
        assert_eq!(out.chart.points, vec![(2020, 150.0), (2021, 200.0)]);
        assert_eq!(out.unit.as_deref(), Some("GWh"));
    }

    #[test]
    fn test_nothing_survives() {
        let err = run(&raw(&[("bad-date", Some(10.0)), ("2019-05-01", None)])).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::EmptyDataset(EmptyDatasetError { raw_rows: 2 })
        ));
    }

    #[test]
    fn test_all_values_null() {
        let err = run(&raw(&[
            ("2019-01-01", None),
            ("2020-01-01", None),
            ("2021-01-01", None),
        ]))
        .unwrap_err();
        assert!(matches!(err, DashboardError::EmptyDataset(_)));
    }

    #[test]
    fn test_single_row() {
        let out = run(&raw(&[("2022-03-15", Some(75.0))])).unwrap();
        assert_eq!(out.yearly.to_vec().len(), 1);
        assert_eq!(out.yearly.get(2022), Some(75.0));
        assert_eq!(
            out.stats,
            SummaryStats {
                min_year: 2022,
                max_year: 2022,
                rows: 1
            }
        );
        assert_eq!(out.chart.points, vec![(2022, 75.0)]);
    }
}
