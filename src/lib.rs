//! Device-state synchronization core for a remote-controlled pet feeder.
//!
//! The shared store is the single source of truth between this client and
//! the physical device. The core keeps typed view-models reconciled against
//! it, issues best-effort commands, drives scheduled feeding, aggregates
//! device feed events into a notification feed, and supervises the live
//! video stream. UI layers are external collaborators that call into these
//! services and render the published view state.

pub mod models {
    pub mod feeder;
}

pub mod config;
pub mod store;
pub mod utils;
pub mod watch;
pub mod services {
    pub mod commands;
    pub mod notifications;
    pub mod projector;
    pub mod runtime;
    pub mod scheduler;
    pub mod session;
    pub mod stream;
}

use crate::config::Config;
use crate::models::feeder::paths;
use crate::services::{runtime::Runtime, session};
use crate::store::{RestStore, StoreBackend};
use log::{info, warn};
use serde_json::Value;

pub fn run() -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (store_url={}, poll_interval={}ms, session_url={}, auth={})",
        cfg.store_url,
        cfg.poll_interval.as_millis(),
        cfg.session_url.as_deref().unwrap_or("-"),
        if cfg.store_auth.is_some() { "set" } else { "-" }
    );

    // 2) Store client
    let store = RestStore::new(&cfg.store_url, cfg.store_auth.clone());

    // 3) Session discovery: one plain fetch; failure is logged, never fatal
    if let Some(url) = &cfg.session_url {
        match session::fetch_sessions(url) {
            Ok(sessions) => info!("Discovered {} local session(s)", sessions.len()),
            Err(e) => warn!("Session discovery failed: {}", e),
        }
    }

    // 4) Initial settings probe; a missing subtree just means first run
    match store.read(paths::USER_SETTINGS) {
        Ok(Value::Null) => info!("No settings found, using defaults"),
        Ok(_) => info!("Settings present in store"),
        Err(e) => warn!("Initial settings read failed: {}", e),
    }

    // 5) Sync loop
    let mut runtime = Runtime::new();
    info!("Starting sync loop (cadence={}ms)", cfg.poll_interval.as_millis());
    runtime.run_loop(&store, cfg.poll_interval);
    Ok(())
}
