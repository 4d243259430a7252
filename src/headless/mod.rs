//! Headless mode - NDJSON event output for scripted runs
//!
//! Replays a scenario against the in-process vendor simulator and writes
//! every event the host would observe to stdout as NDJSON (newline-delimited
//! JSON), one event per line.
//!
//! # Example Output
//!
//! ```json
//! {"event":"signed_in","payload":null,"step":0,"timestamp":1704700001000}
//! {"event":"profile_updated","payload":{"name":"Ada","title":"","player_id":"p-1","display_name":"ada","icon_uri":null},"step":0,"timestamp":1704700001002}
//! ```

pub mod runner;
pub mod scenario;

use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use playbridge_app::{config::SETTINGS_FILENAME, load_settings};
use playbridge_core::prelude::*;
use playbridge_core::{BridgeEvent, PayloadShape};

use scenario::Scenario;

/// Run a scenario file in headless mode, writing events to stdout
///
/// Settings come from `settings_path` when given, otherwise from
/// `playbridge.toml` next to the scenario. A missing settings file means
/// defaults.
pub async fn run_headless(scenario_path: &Path, settings_path: Option<&Path>) -> Result<()> {
    let scenario = Scenario::load(scenario_path)
        .with_context(|| format!("Failed to load scenario {}", scenario_path.display()))?;

    let settings_path = match settings_path {
        Some(path) => path.to_path_buf(),
        None => scenario_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_FILENAME),
    };
    let settings = load_settings(&settings_path);

    info!("Scenario: {}", scenario_path.display());
    runner::run_scenario_with(&scenario, settings, |event| event.emit()).await;

    info!("Play Bridge headless mode exiting");
    Ok(())
}

/// One outbound event as written to stdout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlessEvent {
    pub event: String,
    pub payload: Option<Value>,
    /// Index of the scenario step that produced the event
    pub step: usize,
    pub timestamp: i64,
}

impl HeadlessEvent {
    pub fn from_bridge(event: &BridgeEvent, step: usize) -> Self {
        Self {
            event: event.name().to_string(),
            payload: event.payload(),
            step,
            timestamp: now(),
        }
    }

    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        emit_line(self);
    }
}

/// One entry of the event catalogue
#[derive(Debug, Clone, Serialize)]
pub struct CatalogueEntry {
    pub event: &'static str,
    pub payload: PayloadShape,
}

/// Every event the bridge can emit, with its payload shape
pub fn catalogue() -> Vec<CatalogueEntry> {
    BridgeEvent::catalogue()
        .iter()
        .map(|(event, payload)| CatalogueEntry {
            event,
            payload: *payload,
        })
        .collect()
}

/// Write one value to stdout as an NDJSON line
pub fn emit_line<T: Serialize>(value: &T) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize headless event: {}", e);
            return;
        }
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{}", json) {
        error!("Failed to write headless event to stdout: {}", e);
        return;
    }

    // Flush to ensure immediate output
    if let Err(e) = stdout.flush() {
        error!("Failed to flush headless stdout: {}", e);
    }
}

/// Current timestamp in milliseconds
fn now() -> i64 {
    Utc::now().timestamp_millis()
}
