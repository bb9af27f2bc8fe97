//! Thread-safe owner of the merged route state.
//!
//! `RouteState` is the only shared mutable holder of the current route,
//! position, and hazard overlay. Background tasks communicate results back
//! exclusively through it, and every getter returns an independent copy so
//! consumers never race the owner. Route replacement is last-write-wins; a
//! generation counter lets a slow enrichment run detect that its input route
//! has been superseded and drop its result silently.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tracing::{debug, info};

use crate::geometry::Position;
use crate::hazard::HazardMap;
use crate::route::Route;

/// Cooperative cancellation signal shared between the state owner and at
/// most one in-flight enrichment run.
///
/// Cancellation is checked at well-defined points by the worker, never
/// preemptive. The token also backs the rate-limit wait so a superseded run
/// wakes up immediately instead of sleeping out its full hint.
pub struct CancelToken {
    cancelled: Mutex<bool>,
    signal: Condvar,
}

impl CancelToken {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            cancelled: Mutex::new(false),
            signal: Condvar::new(),
        })
    }

    /// Request that the holder of this token abandon its run.
    pub fn cancel(&self) {
        let mut cancelled = self.cancelled.lock().expect("cancel token poisoned");
        *cancelled = true;
        self.signal.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.lock().expect("cancel token poisoned")
    }

    /// Sleep for up to `duration`, waking early on cancellation.
    ///
    /// Returns `true` if cancellation was requested before or during the
    /// wait.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = std::time::Instant::now() + duration;
        let mut cancelled = self.cancelled.lock().expect("cancel token poisoned");
        loop {
            if *cancelled {
                return true;
            }
            let now = std::time::Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _timeout) = self
                .signal
                .wait_timeout(cancelled, deadline - now)
                .expect("cancel token poisoned");
            cancelled = guard;
        }
    }
}

/// Immutable view of the route handed to one enrichment run.
#[derive(Clone)]
pub struct RouteSnapshot {
    pub generation: u64,
    pub token: Arc<CancelToken>,
    pub waypoints: Route,
}

struct StateInner {
    route: Route,
    position: Position,
    hazards: HazardMap,
    generation: u64,
    token: Arc<CancelToken>,
}

type RedrawHook = Box<dyn Fn() + Send + Sync>;

/// Owner of the current route, position, and hazard overlay.
pub struct RouteState {
    inner: Mutex<StateInner>,
    redraw: Mutex<Option<RedrawHook>>,
}

impl RouteState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StateInner {
                route: Route::new(),
                position: Position::default(),
                hazards: HazardMap::new(),
                generation: 0,
                token: CancelToken::new(),
            }),
            redraw: Mutex::new(None),
        }
    }

    /// Register the consumer's redraw callback, fired after every
    /// successful merge (route replacement, position change, hazard
    /// update, enrichment publish).
    pub fn set_redraw_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.redraw.lock().expect("redraw hook poisoned") = Some(Box::new(hook));
    }

    fn request_redraw(&self) {
        if let Some(hook) = self.redraw.lock().expect("redraw hook poisoned").as_ref() {
            hook();
        }
    }

    /// Replace the route wholesale, superseding any in-flight enrichment.
    ///
    /// Cancels the previous token, installs a fresh one, and returns the
    /// snapshot a new enrichment run should work from.
    pub fn replace_route(&self, route: Route) -> RouteSnapshot {
        let snapshot = {
            let mut inner = self.inner.lock().expect("route state poisoned");
            inner.token.cancel();
            inner.token = CancelToken::new();
            inner.generation += 1;
            inner.route = route;
            debug!(
                generation = inner.generation,
                waypoints = inner.route.len(),
                "route replaced"
            );
            RouteSnapshot {
                generation: inner.generation,
                token: Arc::clone(&inner.token),
                waypoints: inner.route.clone(),
            }
        };
        self.request_redraw();
        snapshot
    }

    /// Merge back an enriched route produced from `generation`.
    ///
    /// The publish is honored only while that generation is still current;
    /// a stale run's result is dropped silently so an old, slow run can
    /// never overwrite a newer route. Returns whether the merge happened.
    pub fn publish_enriched(&self, generation: u64, route: Route) -> bool {
        let accepted = {
            let mut inner = self.inner.lock().expect("route state poisoned");
            if inner.generation != generation {
                info!(
                    stale = generation,
                    current = inner.generation,
                    "dropping enrichment result for superseded route"
                );
                false
            } else {
                inner.route = route;
                true
            }
        };
        if accepted {
            self.request_redraw();
        }
        accepted
    }

    pub fn route(&self) -> Route {
        self.inner.lock().expect("route state poisoned").route.clone()
    }

    pub fn set_position(&self, position: Position) {
        self.inner.lock().expect("route state poisoned").position = position;
        self.request_redraw();
    }

    pub fn position(&self) -> Position {
        self.inner.lock().expect("route state poisoned").position
    }

    /// Replace the hazard overlay wholesale.
    pub fn set_hazard_map(&self, hazards: HazardMap) {
        self.inner.lock().expect("route state poisoned").hazards = hazards;
        self.request_redraw();
    }

    pub fn hazard_map(&self) -> HazardMap {
        self.inner.lock().expect("route state poisoned").hazards.clone()
    }

    /// The token guarding the currently-current enrichment run.
    pub fn active_token(&self) -> Arc<CancelToken> {
        Arc::clone(&self.inner.lock().expect("route state poisoned").token)
    }

    pub fn generation(&self) -> u64 {
        self.inner.lock().expect("route state poisoned").generation
    }
}

impl Default for RouteState {
    fn default() -> Self {
        Self::new()
    }
}
