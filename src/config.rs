//! Minimal runtime configuration helpers.
//! Everything comes from the environment; an optional `.env` file is loaded
//! by `main` before this runs.

use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the shared store's JSON-over-HTTP surface.
    pub store_url: String,
    /// Optional store auth token, appended as a query parameter.
    pub store_auth: Option<String>,
    /// Optional local session discovery endpoint, fetched once at startup.
    pub session_url: Option<String>,
    /// Store polling cadence for change detection.
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let store_url = match std::env::var("FEEDER_STORE_URL") {
            Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => return Err("Missing store URL: set FEEDER_STORE_URL to the shared store base URL".to_string()),
        };

        let store_auth = std::env::var("FEEDER_STORE_AUTH")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let session_url = std::env::var("SESSION_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let poll_ms = std::env::var("POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        Ok(Config {
            store_url,
            store_auth,
            session_url,
            poll_interval: Duration::from_millis(poll_ms),
        })
    }
}
