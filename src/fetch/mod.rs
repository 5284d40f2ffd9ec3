// src/fetch/mod.rs

use reqwest::Client;
use std::time::Instant;
use tracing::{info, instrument};
use url::Url;

use crate::config::Config;
use crate::error::DataFetchError;
use crate::process::{
    convert::{decode_csv, to_raw_table, ConvertError},
    raw_table::RawTable,
};

/// Client with the configured connect and total timeouts.
pub fn build_client(cfg: &Config) -> Result<Client, DataFetchError> {
    Client::builder()
        .connect_timeout(cfg.connect_timeout)
        .timeout(cfg.fetch_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DataFetchError::from_reqwest(&cfg.source_url, e))
}

/// Download the CSV at `url` and keep the `date`, `value` and `unit` columns.
/// One attempt; any failure surfaces as a [`DataFetchError`].
#[instrument(level = "info", skip(client))]
pub async fn fetch_dataset(client: &Client, url: &str) -> Result<RawTable, DataFetchError> {
    let parsed = Url::parse(url).map_err(|source| DataFetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    let start = Instant::now();
    let body = client
        .get(parsed)
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(|e| DataFetchError::from_reqwest(url, e))?
        .bytes()
        .await
        .map_err(|e| DataFetchError::from_reqwest(url, e))?;
    info!(bytes = body.len(), elapsed = ?start.elapsed(), "downloaded");

    let batch = decode_csv(&body).map_err(|source| DataFetchError::Malformed {
        url: url.to_string(),
        source,
    })?;
    let raw = to_raw_table(&batch).map_err(|e| match e {
        ConvertError::MissingColumn(column) => DataFetchError::MissingColumn {
            url: url.to_string(),
            column,
        },
        ConvertError::Arrow(source) => DataFetchError::Malformed {
            url: url.to_string(),
            source,
        },
    })?;
    info!(rows = raw.num_rows(), "parsed csv");
    Ok(raw)
}
