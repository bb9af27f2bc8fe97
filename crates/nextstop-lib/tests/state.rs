use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use nextstop_lib::{CancelToken, HazardLevel, Position, RouteState, Waypoint};

fn waypoint(name: &str, id: u64) -> Waypoint {
    Waypoint::new(name, id, Position::new(1.0, 2.0, 3.0), "K")
}

#[test]
fn getters_return_independent_copies() {
    let state = RouteState::new();
    state.replace_route(vec![waypoint("Alpha", 1)]);

    let mut copy = state.route();
    copy[0].system_name = "Mutated".to_string();
    copy.clear();

    assert_eq!(state.route()[0].system_name, "Alpha");
}

#[test]
fn replace_route_supersedes_previous_token() {
    let state = RouteState::new();
    let first = state.replace_route(vec![waypoint("Alpha", 1)]);
    assert!(!first.token.is_cancelled());

    let second = state.replace_route(vec![waypoint("Beta", 2)]);
    assert!(first.token.is_cancelled());
    assert!(!second.token.is_cancelled());
    assert!(second.generation > first.generation);
}

#[test]
fn publish_is_rejected_for_superseded_generations() {
    let state = RouteState::new();
    let stale = state.replace_route(vec![waypoint("Alpha", 1)]);
    state.replace_route(vec![waypoint("Beta", 2)]);

    let mut enriched = stale.waypoints.clone();
    enriched[0].star_type_name = "Neutron Star".to_string();
    assert!(!state.publish_enriched(stale.generation, enriched));

    let route = state.route();
    assert_eq!(route[0].system_name, "Beta");
    assert!(route[0].star_type_name.is_empty());
}

#[test]
fn cleared_route_stays_empty_after_late_publish() {
    let state = RouteState::new();
    let stale = state.replace_route(vec![waypoint("Alpha", 1)]);
    state.replace_route(Vec::new());

    assert!(state.route().is_empty());
    assert!(!state.publish_enriched(stale.generation, stale.waypoints));
    assert!(state.route().is_empty());
}

#[test]
fn redraw_hook_fires_on_every_merge() {
    let state = RouteState::new();
    let redraws = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&redraws);
    state.set_redraw_hook(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let snapshot = state.replace_route(vec![waypoint("Alpha", 1)]);
    state.set_position(Position::new(4.0, 5.0, 6.0));
    state.set_hazard_map(HashMap::from([(1, HazardLevel::Alert)]));
    assert!(state.publish_enriched(snapshot.generation, snapshot.waypoints.clone()));
    assert_eq!(redraws.load(Ordering::SeqCst), 4);

    // A rejected publish must not trigger a redraw.
    state.replace_route(Vec::new());
    let before = redraws.load(Ordering::SeqCst);
    assert!(!state.publish_enriched(snapshot.generation, snapshot.waypoints));
    assert_eq!(redraws.load(Ordering::SeqCst), before);
}

#[test]
fn hazard_map_is_replaced_wholesale() {
    let state = RouteState::new();
    state.set_hazard_map(HashMap::from([
        (1, HazardLevel::Invasion),
        (2, HazardLevel::Recovery),
    ]));
    state.set_hazard_map(HashMap::from([(3, HazardLevel::Titan)]));

    let map = state.hazard_map();
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&3), Some(&HazardLevel::Titan));
}

#[test]
fn cancel_token_interrupts_a_sleep() {
    let token = CancelToken::new();
    let sleeper = Arc::clone(&token);
    let handle = thread::spawn(move || {
        let started = Instant::now();
        let cancelled = sleeper.sleep(Duration::from_secs(30));
        (cancelled, started.elapsed())
    });

    thread::sleep(Duration::from_millis(50));
    token.cancel();

    let (cancelled, waited) = handle.join().unwrap();
    assert!(cancelled);
    assert!(waited < Duration::from_secs(5), "sleep should end on cancel");
}

#[test]
fn cancel_token_sleep_times_out_normally() {
    let token = CancelToken::new();
    assert!(!token.sleep(Duration::from_millis(20)));
    assert!(!token.is_cancelled());
}
