// src/config.rs

use std::{env, path::PathBuf, time::Duration};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

/// Where the dataset lives. Not overridable from the environment.
pub const SOURCE_URL: &str = "https://raw.githubusercontent.com/tanjucos/electricity-analysis/main/data/raw/global_electricity_production_data.csv";

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_OUT: &str = "dashboard.html";

/// Runtime settings shared by both binaries.
#[derive(Debug, Clone)]
pub struct Config {
    pub source_url: String,
    /// Upper bound on the whole request, body included.
    pub fetch_timeout: Duration,
    pub connect_timeout: Duration,
    pub port: u16,
    pub out_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: SOURCE_URL.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            port: DEFAULT_PORT,
            out_path: PathBuf::from(DEFAULT_OUT),
        }
    }
}

impl Config {
    /// Defaults overlaid with `PORT`, `POWERTREND_OUT`,
    /// `FETCH_TIMEOUT_SECS` and `CONNECT_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but reads variables through `lookup`.
    /// Unparseable numbers fall back to the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Config::default();

        if let Some(port) = lookup("PORT") {
            match port.trim().parse() {
                Ok(p) => cfg.port = p,
                Err(_) => warn!(value = %port, "ignoring invalid PORT"),
            }
        }
        if let Some(out) = lookup("POWERTREND_OUT").filter(|s| !s.trim().is_empty()) {
            cfg.out_path = PathBuf::from(out);
        }
        if let Some(t) = secs(&lookup, "FETCH_TIMEOUT_SECS") {
            cfg.fetch_timeout = t;
        }
        if let Some(t) = secs(&lookup, "CONNECT_TIMEOUT_SECS") {
            cfg.connect_timeout = t;
        }

        cfg
    }
}

/// Log filter directive: `RUST_LOG`, else `LOG_LEVEL`, else `info`.
pub fn log_directive(lookup: impl Fn(&str) -> Option<String>) -> String {
    lookup("RUST_LOG")
        .or_else(|| lookup("LOG_LEVEL"))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "info".to_string())
}

/// Install the fmt subscriber both binaries log through. Call before
/// [`Config::from_env`] so its warnings are kept.
pub fn init_logging() {
    let filter = EnvFilter::new(log_directive(|key| env::var(key).ok()));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
}

fn secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => {
            warn!(key, value = %raw, "ignoring invalid timeout");
            None
        }
        Ok(n) => Some(Duration::from_secs(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::from_lookup(lookup(&[]));
        assert_eq!(cfg.source_url, SOURCE_URL);
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(30));
        assert_eq!(cfg.connect_timeout, Duration::from_secs(10));
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.out_path, PathBuf::from("dashboard.html"));
    }

    #[test]
    fn test_env_overrides() {
        let cfg = Config::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("POWERTREND_OUT", "/tmp/out.html"),
            ("FETCH_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.out_path, PathBuf::from("/tmp/out.html"));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(5));
        // source URL stays pinned
        assert_eq!(cfg.source_url, SOURCE_URL);
    }

    #[test]
    fn test_log_directive_prefers_rust_log() {
        assert_eq!(log_directive(lookup(&[])), "info");
        assert_eq!(log_directive(lookup(&[("LOG_LEVEL", "debug")])), "debug");
        assert_eq!(
            log_directive(lookup(&[("RUST_LOG", "powertrend=trace"), ("LOG_LEVEL", "debug")])),
            "powertrend=trace"
        );
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let cfg = Config::from_lookup(lookup(&[
            ("PORT", "eighty"),
            ("FETCH_TIMEOUT_SECS", "0"),
            ("CONNECT_TIMEOUT_SECS", "-1"),
        ]));
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(30));
        assert_eq!(cfg.connect_timeout, Duration::from_secs(10));
    }
}
