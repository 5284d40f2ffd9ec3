use anyhow::{anyhow, Context, Result};
use powertrend::{
    config::{init_logging, Config},
    dashboard,
    error::DashboardError,
    fetch::build_client,
};
use tokio::time::Instant;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    init_logging();

    let cfg = Config::from_env();
    info!(source = %cfg.source_url, out = %cfg.out_path.display(), "startup");

    // ─── 2) fetch → clean → aggregate → chart ────────────────────────
    let start = Instant::now();
    let client = build_client(&cfg).context("building HTTP client")?;
    let (page, outcome) = dashboard::render(&client, &cfg.source_url).await;

    // ─── 3) write the page, failure pages included ───────────────────
    dashboard::write_page(&cfg.out_path, &page)
        .with_context(|| format!("writing {}", cfg.out_path.display()))?;
    info!(path = %cfg.out_path.display(), elapsed = ?start.elapsed(), "wrote dashboard");

    match outcome {
        Ok(_) | Err(DashboardError::EmptyDataset(_)) => Ok(()),
        Err(e) => Err(anyhow!(e).context("dashboard rendered without data")),
    }
}
