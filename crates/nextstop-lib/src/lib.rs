//! NextStop library entry points.
//!
//! This crate holds the background enrichment subsystem for a travel route
//! display: a bounded persisted cache of star classifications, a cancellable
//! enrichment worker that resolves waypoints against a remote lookup service,
//! an independently-polled hazard overlay, and the thread-safe owner of the
//! merged route state. Consumers (CLI, host-application shims) should only
//! depend on the types exported here instead of reimplementing behavior.

#![deny(warnings)]

pub mod app;
pub mod cache;
pub mod edsm;
pub mod error;
pub mod geometry;
pub mod hazard;
pub mod route;
pub mod star;
pub mod state;
pub mod worker;

pub use app::{default_cache_path, NextStop, NextStopConfig};
pub use cache::SystemCache;
pub use edsm::{ClassificationSource, EdsmClient, LookupReply, PrimaryStar, SystemRow};
pub use error::{Error, Result};
pub use geometry::Position;
pub use hazard::{DcohClient, HazardLevel, HazardMap, HazardSource};
pub use route::{Route, SystemId, Waypoint};
pub use state::{CancelToken, RouteSnapshot, RouteState};
pub use worker::enrich_route;
