//! Hazard overlay polling.
//!
//! A single endpoint reports the galaxy-wide set of systems under threat,
//! keyed by system id. The overlay is display state only: it is replaced
//! wholesale on every successful poll and deliberately left stale on any
//! failure, so a flaky feed never blanks the display.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::route::SystemId;
use crate::state::RouteState;

const OVERWATCH_URL: &str = "https://dcoh.watch/api/v1/overwatch/systems";

/// Threat level reported for one system.
///
/// The feed is string-typed; unknown labels are preserved in `Other` so a
/// new level added upstream still renders instead of vanishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HazardLevel {
    Alert,
    Invasion,
    Controlled,
    Titan,
    Recovery,
    Other(String),
}

impl From<&str> for HazardLevel {
    fn from(label: &str) -> Self {
        match label {
            "Alert" => HazardLevel::Alert,
            "Invasion" => HazardLevel::Invasion,
            "Controlled" => HazardLevel::Controlled,
            "Titan" => HazardLevel::Titan,
            "Recovery" => HazardLevel::Recovery,
            other => HazardLevel::Other(other.to_string()),
        }
    }
}

impl fmt::Display for HazardLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HazardLevel::Alert => "Alert",
            HazardLevel::Invasion => "Invasion",
            HazardLevel::Controlled => "Controlled",
            HazardLevel::Titan => "Titan",
            HazardLevel::Recovery => "Recovery",
            HazardLevel::Other(other) => other.as_str(),
        };
        f.write_str(label)
    }
}

/// Snapshot map from system id to its current threat level.
pub type HazardMap = HashMap<SystemId, HazardLevel>;

/// Seam for the hazard feed so polling can be driven by a stub in tests.
pub trait HazardSource: Send + Sync {
    fn fetch(&self) -> Result<HazardMap>;
}

#[derive(Debug, Deserialize)]
struct OverwatchResponse {
    #[serde(default)]
    systems: Vec<OverwatchSystem>,
}

#[derive(Debug, Deserialize)]
struct OverwatchSystem {
    #[serde(rename = "systemAddress")]
    system_address: SystemId,
    #[serde(rename = "thargoidLevel")]
    thargoid_level: ThargoidLevel,
}

#[derive(Debug, Deserialize)]
struct ThargoidLevel {
    #[serde(default)]
    name: String,
}

/// Blocking client for the overwatch hazard feed.
pub struct DcohClient {
    client: Client,
    base_url: String,
}

impl DcohClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .user_agent(format!("nextstop-lib/{}", env!("CARGO_PKG_VERSION")))
                .build()?,
            base_url: OVERWATCH_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint, for local testing.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl HazardSource for DcohClient {
    fn fetch(&self) -> Result<HazardMap> {
        debug!(url = %self.base_url, "polling hazard feed");
        let response = self.client.get(&self.base_url).send()?;
        if !response.status().is_success() {
            return Err(Error::UnexpectedStatus {
                service: "dcoh",
                status: response.status(),
            });
        }
        let payload = response.json::<OverwatchResponse>()?;
        Ok(payload
            .systems
            .into_iter()
            .map(|row| {
                (
                    row.system_address,
                    HazardLevel::from(row.thargoid_level.name.as_str()),
                )
            })
            .collect())
    }
}

/// Run one poll, replacing the owner's hazard map on success.
///
/// Any transport or status failure is logged and leaves the previous map
/// unchanged. Returns whether the map was replaced.
pub fn poll_once(state: &RouteState, source: &dyn HazardSource) -> bool {
    match source.fetch() {
        Ok(map) => {
            debug!(systems = map.len(), "hazard overlay updated");
            state.set_hazard_map(map);
            true
        }
        Err(err) => {
            warn!(error = %err, "hazard poll failed, keeping previous overlay");
            false
        }
    }
}

/// Spawn the hazard poller on a background thread.
///
/// Polls once immediately; with an `interval` it keeps re-polling forever,
/// each successful poll superseding the last. A single poll is short-lived
/// and idempotent, so no cancellation handle is needed.
pub fn spawn(
    state: Arc<RouteState>,
    source: Arc<dyn HazardSource>,
    interval: Option<Duration>,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("hazard-poller".to_string())
        .spawn(move || loop {
            poll_once(&state, source.as_ref());
            match interval {
                Some(delay) => thread::sleep(delay),
                None => break,
            }
        })
        .expect("failed to spawn hazard poller thread")
}
