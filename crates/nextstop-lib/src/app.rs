//! Trigger boundary: the facade the host application's event layer calls.
//!
//! Each callback returns promptly, delegating anything slow to a background
//! thread. Results come back only through the shared [`RouteState`], never
//! synchronously.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use tracing::{info, warn};

use crate::cache::SystemCache;
use crate::edsm::{ClassificationSource, EdsmClient};
use crate::error::{Error, Result};
use crate::geometry::Position;
use crate::hazard::{self, DcohClient, HazardMap, HazardSource};
use crate::route::Route;
use crate::state::RouteState;
use crate::worker;

const CACHE_FILENAME: &str = "starTypeCache.json";
const CACHE_DIR_ENV: &str = "NEXTSTOP_CACHE_DIR";

/// Resolve the default cache file location using platform-specific project
/// directories. The `NEXTSTOP_CACHE_DIR` environment variable overrides the
/// directory, for tests and local tooling.
pub fn default_cache_path() -> Result<PathBuf> {
    if let Some(override_dir) = env::var_os(CACHE_DIR_ENV) {
        return Ok(PathBuf::from(override_dir).join(CACHE_FILENAME));
    }
    let dirs =
        ProjectDirs::from("net", "nextstop", "nextstop").ok_or(Error::ProjectDirsUnavailable)?;
    Ok(dirs.data_dir().join(CACHE_FILENAME))
}

/// Construction options for [`NextStop`].
pub struct NextStopConfig {
    /// Where the system cache is persisted; `None` disables persistence.
    pub cache_path: Option<PathBuf>,
    /// Re-poll interval for the hazard overlay; `None` polls once at startup.
    pub hazard_poll_interval: Option<Duration>,
}

impl Default for NextStopConfig {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path()
                .map_err(|err| warn!(error = %err, "no cache directory available"))
                .ok(),
            hazard_poll_interval: None,
        }
    }
}

/// The plugin core: owns the shared state and wires the background tasks.
pub struct NextStop {
    state: Arc<RouteState>,
    cache: Arc<SystemCache>,
    lookup: Arc<dyn ClassificationSource>,
    cache_path: Option<PathBuf>,
}

impl NextStop {
    /// Build the core with the real remote clients and start the hazard
    /// poller. The cache restore is best-effort: a missing or corrupt file
    /// just means starting empty.
    pub fn new(config: NextStopConfig) -> Result<Self> {
        let lookup: Arc<dyn ClassificationSource> = Arc::new(EdsmClient::new()?);
        let hazards: Arc<dyn HazardSource> = Arc::new(DcohClient::new()?);
        Ok(Self::with_sources(config, lookup, hazards))
    }

    /// Build the core around caller-supplied remote sources.
    pub fn with_sources(
        config: NextStopConfig,
        lookup: Arc<dyn ClassificationSource>,
        hazards: Arc<dyn HazardSource>,
    ) -> Self {
        let state = Arc::new(RouteState::new());
        let cache = Arc::new(SystemCache::new());

        if let Some(path) = &config.cache_path {
            match cache.load(path) {
                Ok(loaded) => info!(loaded, path = %path.display(), "system cache restored"),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "cache restore failed, starting empty")
                }
            }
        }

        hazard::spawn(
            Arc::clone(&state),
            hazards,
            config.hazard_poll_interval,
        );

        Self {
            state,
            cache,
            lookup,
            cache_path: config.cache_path,
        }
    }

    /// A new route was announced by the navigation source.
    ///
    /// Replaces the owned route, supersedes any in-flight enrichment run,
    /// and kicks off a new one in the background.
    pub fn on_route_announced(&self, route: Route, position: Position) {
        info!(waypoints = route.len(), "route announced");
        let snapshot = self.state.replace_route(route);
        self.state.set_position(position);
        worker::spawn(
            Arc::clone(&self.state),
            Arc::clone(&self.cache),
            Arc::clone(&self.lookup),
            snapshot,
            self.cache_path.clone(),
        );
    }

    /// The route was cleared; any in-flight enrichment is superseded.
    pub fn on_route_cleared(&self) {
        info!("route cleared");
        self.state.replace_route(Route::new());
    }

    /// The ship arrived somewhere new.
    pub fn on_position_changed(&self, position: Position) {
        self.state.set_position(position);
    }

    pub fn route(&self) -> Route {
        self.state.route()
    }

    pub fn position(&self) -> Position {
        self.state.position()
    }

    pub fn hazard_map(&self) -> HazardMap {
        self.state.hazard_map()
    }

    pub fn state(&self) -> &Arc<RouteState> {
        &self.state
    }

    pub fn cache(&self) -> &Arc<SystemCache> {
        &self.cache
    }
}
