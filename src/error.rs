// src/error.rs

use reqwest::StatusCode;
use thiserror::Error;

/// The dataset could not be retrieved or decoded.
#[derive(Error, Debug)]
pub enum DataFetchError {
    #[error("invalid source URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("GET {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("malformed CSV from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: arrow::error::ArrowError,
    },

    #[error("CSV from {url} has no `{column}` column")]
    MissingColumn { url: String, column: &'static str },
}

impl DataFetchError {
    /// Classify a reqwest failure, splitting out timeouts.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataFetchError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            DataFetchError::Status {
                url: url.to_string(),
                status,
            }
        } else {
            DataFetchError::Request {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// No rows survived cleaning, so there is nothing to summarize or plot.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no rows left after cleaning ({raw_rows} raw rows read)")]
pub struct EmptyDatasetError {
    pub raw_rows: usize,
}

/// The chart backend failed to draw.
#[derive(Error, Debug)]
#[error("chart rendering failed: {0}")]
pub struct ChartError(pub String);

/// The page could not be turned into HTML or written out.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("failed to render page: {0}")]
    Render(#[from] askama::Error),

    #[error("failed to write page: {0}")]
    Write(#[from] std::io::Error),
}

/// Anything that keeps a render from producing stats and a chart.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    DataFetch(#[from] DataFetchError),

    #[error(transparent)]
    EmptyDataset(#[from] EmptyDatasetError),

    #[error("failed to process dataset: {0}")]
    Processing(#[from] arrow::error::ArrowError),
}
