//! Background route enrichment.
//!
//! One run takes a route snapshot, resolves every waypoint's classification
//! from the cache or a single remote batch lookup, and publishes the merged
//! route back through the owner's generation guard. The run is cooperative:
//! cancellation is checked before every network step and interrupts the
//! rate-limit wait. All failure is absorbed and logged here; nothing
//! propagates to the spawner, and the worst outcome is waypoints left with
//! their fallback classification for this round.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use crate::cache::SystemCache;
use crate::edsm::{self, ClassificationSource, LookupReply};
use crate::state::{RouteSnapshot, RouteState};

/// Run one enrichment pass over `snapshot`, publishing through `state`.
///
/// `cache_path` is persisted to after a completed (even partially
/// successful) run; pass `None` to skip persistence. Returns whether a
/// merge was published.
pub fn enrich_route(
    state: &RouteState,
    cache: &SystemCache,
    source: &dyn ClassificationSource,
    snapshot: RouteSnapshot,
    cache_path: Option<&PathBuf>,
) -> bool {
    if snapshot.waypoints.is_empty() {
        debug!("no route to enrich");
        return false;
    }

    let RouteSnapshot {
        generation,
        token,
        mut waypoints,
    } = snapshot;

    // Cache pass: fill hits, batch misses by name for one remote request.
    let mut pending: HashMap<String, usize> = HashMap::new();
    for (index, waypoint) in waypoints.iter_mut().enumerate() {
        if let Some(type_name) = cache.get(waypoint.system_id) {
            waypoint.star_type_name = type_name;
            waypoint.lookup_url = edsm::lookup_url(waypoint.system_id);
        } else {
            pending.insert(waypoint.system_name.clone(), index);
        }
    }

    if !pending.is_empty() {
        let names: Vec<String> = pending.keys().cloned().collect();
        loop {
            if token.is_cancelled() {
                debug!(generation, "enrichment cancelled before lookup");
                return false;
            }
            match source.batch_lookup(&names) {
                Ok(LookupReply::Rows(rows)) => {
                    let mut matched = 0usize;
                    for row in rows {
                        let Some(&index) = pending.get(&row.name) else {
                            continue;
                        };
                        let waypoint = &mut waypoints[index];
                        // Names are not globally unique; a row whose id
                        // disagrees with the expected waypoint is skipped.
                        if row.id64 != waypoint.system_id {
                            debug!(
                                system = %row.name,
                                expected = waypoint.system_id,
                                returned = row.id64,
                                "identifier mismatch, skipping row"
                            );
                            continue;
                        }
                        let type_name = row
                            .primary_star
                            .map(|star| star.type_name)
                            .unwrap_or_default();
                        waypoint.star_type_name = type_name.clone();
                        waypoint.lookup_url = edsm::lookup_url(waypoint.system_id);
                        cache.put(waypoint.system_id, type_name);
                        matched += 1;
                    }
                    debug!(generation, requested = names.len(), matched, "batch lookup done");
                    break;
                }
                Ok(LookupReply::RateLimited { reset_hint }) => {
                    match edsm::reset_delay(reset_hint.as_deref(), edsm::epoch_now()) {
                        Some(delay) => {
                            info!(generation, wait_secs = delay.as_secs(), "rate limited, waiting for reset");
                            if token.sleep(delay) {
                                debug!(generation, "enrichment cancelled during rate-limit wait");
                                return false;
                            }
                        }
                        None => {
                            warn!(generation, hint = ?reset_hint, "rate limited with unusable reset hint, abandoning lookup");
                            break;
                        }
                    }
                }
                Err(err) => {
                    // Cache hits gathered above still get merged below.
                    warn!(generation, error = %err, "batch lookup failed, abandoning lookup");
                    break;
                }
            }
        }
    }

    if token.is_cancelled() {
        debug!(generation, "enrichment cancelled before publish");
        return false;
    }

    let published = state.publish_enriched(generation, waypoints);
    if published {
        if let Some(path) = cache_path {
            if let Err(err) = cache.save(path) {
                warn!(path = %path.display(), error = %err, "failed to persist system cache");
            }
        }
    }
    published
}

/// Spawn one enrichment run on a named background thread.
pub fn spawn(
    state: Arc<RouteState>,
    cache: Arc<SystemCache>,
    source: Arc<dyn ClassificationSource>,
    snapshot: RouteSnapshot,
    cache_path: Option<PathBuf>,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("enrichment-worker".to_string())
        .spawn(move || {
            enrich_route(
                &state,
                &cache,
                source.as_ref(),
                snapshot,
                cache_path.as_ref(),
            );
        })
        .expect("failed to spawn enrichment thread")
}
