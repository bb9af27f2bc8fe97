//! Remote classification lookup against the EDSM systems API.
//!
//! One batch POST resolves every pending system name to its id and primary
//! star type. The service rate-limits aggressively, so a 429 is surfaced as
//! a distinct reply variant carrying the raw reset header for the worker's
//! retry logic rather than as an error.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::route::SystemId;

const SYSTEMS_API_URL: &str = "https://www.edsm.net/api-v1/systems";
const SYSTEM_PAGE_URL: &str = "https://www.edsm.net/en/system?systemID64=";
const RESET_HEADER: &str = "x-rate-limit-reset";

/// Reset hints larger than this are taken as absolute epoch seconds rather
/// than a relative offset. One day comfortably exceeds any realistic
/// rate-limit window while sitting decades below current epoch values.
const MAX_RELATIVE_RESET_SECS: u64 = 86_400;

/// One row of the batch lookup response.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemRow {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id64: SystemId,
    #[serde(default, rename = "primaryStar")]
    pub primary_star: Option<PrimaryStar>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrimaryStar {
    #[serde(default, rename = "type")]
    pub type_name: String,
}

/// Outcome of one batch lookup attempt.
#[derive(Debug)]
pub enum LookupReply {
    Rows(Vec<SystemRow>),
    /// The service asked us to back off; carries the raw reset header
    /// value, if any.
    RateLimited { reset_hint: Option<String> },
}

/// Seam for the remote classification service so the enrichment worker can
/// be driven by a stub in tests.
pub trait ClassificationSource: Send + Sync {
    fn batch_lookup(&self, names: &[String]) -> Result<LookupReply>;
}

#[derive(Serialize)]
struct SystemsRequest<'a> {
    #[serde(rename = "systemName")]
    system_names: &'a [String],
    #[serde(rename = "showId")]
    show_id: u8,
    #[serde(rename = "showPrimaryStar")]
    show_primary_star: u8,
}

/// Blocking EDSM client.
pub struct EdsmClient {
    client: Client,
    base_url: String,
}

impl EdsmClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .user_agent(user_agent())
                .build()?,
            base_url: SYSTEMS_API_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint, for local testing.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl ClassificationSource for EdsmClient {
    fn batch_lookup(&self, names: &[String]) -> Result<LookupReply> {
        let body = SystemsRequest {
            system_names: names,
            show_id: 1,
            show_primary_star: 1,
        };
        debug!(url = %self.base_url, systems = names.len(), "querying classification service");
        let response = self.client.post(&self.base_url).json(&body).send()?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let reset_hint = response
                .headers()
                .get(RESET_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.to_string());
            return Ok(LookupReply::RateLimited { reset_hint });
        }
        if !response.status().is_success() {
            return Err(Error::UnexpectedStatus {
                service: "edsm",
                status: response.status(),
            });
        }

        Ok(LookupReply::Rows(response.json::<Vec<SystemRow>>()?))
    }
}

fn user_agent() -> String {
    format!(
        "nextstop-lib/{version} ({repo})",
        version = env!("CARGO_PKG_VERSION"),
        repo = "https://github.com/nextstop/nextstop-rs"
    )
}

/// Deep-link to the service's page for a system.
pub fn lookup_url(id: SystemId) -> String {
    format!("{}{}", SYSTEM_PAGE_URL, id)
}

/// Interpret a rate-limit reset hint, relative to `now` in epoch seconds.
///
/// The service does not document whether the header carries absolute epoch
/// seconds or a relative offset, so both forms are validated defensively:
/// small values are relative seconds, values in the future relative to `now`
/// are absolute. Anything absent, non-numeric, or in the past yields `None`
/// and the caller must not retry.
pub fn reset_delay(hint: Option<&str>, now_epoch_secs: u64) -> Option<Duration> {
    let value: u64 = hint?.trim().parse().ok()?;
    if value <= MAX_RELATIVE_RESET_SECS {
        return Some(Duration::from_secs(value));
    }
    if value > now_epoch_secs {
        return Some(Duration::from_secs(value - now_epoch_secs));
    }
    None
}

/// Current wall-clock time in epoch seconds.
pub(crate) fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
