// src/dashboard.rs

use reqwest::Client;
use std::{fs, path::Path};
use tracing::{error, info, warn};

use crate::error::{DashboardError, PageError};
use crate::fetch::fetch_dataset;
use crate::page::Page;
use crate::process::{self, PipelineOutput};

/// Fetch the dataset once and run it through the pipeline.
pub async fn load(client: &Client, url: &str) -> Result<PipelineOutput, DashboardError> {
    let raw = fetch_dataset(client, url).await?;
    process::run(&raw)
}

/// One full render: load, log the outcome, lay out the page.
pub async fn render(client: &Client, url: &str) -> (Page, Result<PipelineOutput, DashboardError>) {
    let outcome = load(client, url).await;
    match &outcome {
        Ok(out) => info!(
            min_year = out.stats.min_year,
            max_year = out.stats.max_year,
            rows = out.stats.rows,
            "render ready"
        ),
        Err(DashboardError::EmptyDataset(e)) => warn!("empty dataset: {}", e),
        Err(e) => error!("render failed: {}", e),
    }
    (Page::build(&outcome), outcome)
}

/// Write the page as HTML, creating parent directories as needed.
pub fn write_page(path: &Path, page: &Page) -> Result<(), PageError> {
    let html = page.to_html()?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, html)?;
    Ok(())
}
