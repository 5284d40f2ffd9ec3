use anyhow::{Context, Result};
use powertrend::{
    config::{init_logging, Config},
    dashboard,
    error::DashboardError,
    fetch::build_client,
    process::{aggregate::YearTotal, PipelineOutput},
};
use reqwest::Client;
use serde::Serialize;
use std::{convert::Infallible, sync::Arc, time::Instant};
use tracing::{error, info};
use warp::{http::StatusCode, reply::Reply, Filter};

/// Per-process handles. Holds no dataset; every request fetches afresh.
struct AppState {
    client: Client,
    source_url: String,
}

#[derive(Serialize)]
struct SummaryResponse {
    min_year: i32,
    max_year: i32,
    rows: usize,
    unit: Option<String>,
    yearly: Vec<YearTotal>,
}

impl From<&PipelineOutput> for SummaryResponse {
    fn from(out: &PipelineOutput) -> Self {
        Self {
            min_year: out.stats.min_year,
            max_year: out.stats.max_year,
            rows: out.stats.rows,
            unit: out.unit.clone(),
            yearly: out.yearly.to_vec(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn status_for(err: &DashboardError) -> StatusCode {
    match err {
        DashboardError::DataFetch(_) => StatusCode::BAD_GATEWAY,
        DashboardError::EmptyDataset(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DashboardError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn health_check() -> Result<impl Reply, Infallible> {
    Ok(warp::reply::json(&serde_json::json!({
        "status": "healthy",
        "service": "powertrend"
    })))
}

/// The dashboard page. Empty data still renders (with a notice); fetch
/// failures render the error page with 502.
async fn index(state: Arc<AppState>) -> Result<impl Reply, Infallible> {
    let start = Instant::now();
    let (page, outcome) = dashboard::render(&state.client, &state.source_url).await;
    let status = match &outcome {
        Ok(_) | Err(DashboardError::EmptyDataset(_)) => StatusCode::OK,
        Err(e) => status_for(e),
    };
    let reply = match page.to_html() {
        Ok(html) => warp::reply::with_status(warp::reply::html(html), status),
        Err(e) => {
            error!(error = %e, "page template failed");
            warp::reply::with_status(
                warp::reply::html(String::from("page could not be rendered")),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    };
    info!(status = status.as_u16(), elapsed = ?start.elapsed(), "GET /");
    Ok(reply)
}

async fn summary(state: Arc<AppState>) -> Result<impl Reply, Infallible> {
    let outcome = dashboard::load(&state.client, &state.source_url).await;
    let reply = match &outcome {
        Ok(out) => warp::reply::with_status(
            warp::reply::json(&SummaryResponse::from(out)),
            StatusCode::OK,
        ),
        Err(e) => warp::reply::with_status(
            warp::reply::json(&ErrorResponse {
                error: e.to_string(),
            }),
            status_for(e),
        ),
    };
    Ok(reply)
}

fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    let with_state = warp::any().map(move || Arc::clone(&state));

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health_check);

    let page = warp::path::end()
        .and(warp::get())
        .and(with_state.clone())
        .and_then(index);

    let api = warp::path!("api" / "summary")
        .and(warp::get())
        .and(with_state)
        .and_then(summary);

    health.or(page).or(api)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cfg = Config::from_env();

    info!("Starting powertrend dashboard server");

    let state = Arc::new(AppState {
        client: build_client(&cfg).context("building HTTP client")?,
        source_url: cfg.source_url.clone(),
    });

    info!("Server starting on port {}", cfg.port);
    info!("Dashboard: http://localhost:{}/", cfg.port);
    info!("Health check: http://localhost:{}/health", cfg.port);

    warp::serve(routes(state)).run(([0, 0, 0, 0], cfg.port)).await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn spawn_source(body: &'static str) -> SocketAddr {
        let route = warp::path("data.csv").map(move || body);
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }

    fn state(source_url: String) -> Arc<AppState> {
        Arc::new(AppState {
            client: build_client(&Config::default()).unwrap(),
            source_url,
        })
    }

    #[tokio::test]
    async fn test_health_check() {
        let api = routes(state("http://127.0.0.1:9/unused.csv".into()));
        let resp = warp::test::request().path("/health").reply(&api).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_index_and_summary() {
        let addr = spawn_source("date,value,unit\n2022-03-15,75,GWh\n");
        let api = routes(state(format!("http://{}/data.csv", addr)));

        let resp = warp::test::request().path("/").reply(&api).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = String::from_utf8_lossy(resp.body());
        assert!(html.contains("<svg"));
        assert!(html.contains("2022–2022"));

        let resp = warp::test::request().path("/api/summary").reply(&api).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["min_year"], 2022);
        assert_eq!(body["rows"], 1);
        assert_eq!(body["yearly"][0]["value"], 75.0);
    }

    #[tokio::test]
    async fn test_empty_and_failed_sources() {
        let addr = spawn_source("date,value,unit\nbad-date,10,GWh\n2019-05-01,,GWh\n");
        let api = routes(state(format!("http://{}/data.csv", addr)));

        let resp = warp::test::request().path("/").reply(&api).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!String::from_utf8_lossy(resp.body()).contains("<svg"));

        let resp = warp::test::request().path("/api/summary").reply(&api).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let api = routes(state(format!("http://{}/nope.csv", addr)));
        let resp = warp::test::request().path("/").reply(&api).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert!(String::from_utf8_lossy(resp.body()).contains("Could not load"));
    }
}
