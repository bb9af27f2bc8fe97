use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use nextstop_lib::{
    default_cache_path, enrich_route, hazard, star, ClassificationSource, DcohClient, EdsmClient,
    HazardMap, LookupReply, Position, RouteState, SystemCache, Waypoint,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "NextStop route viewer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enrich a navigation route file and render it.
    Show {
        /// Path to a journal NavRoute file (`{"Route": [...]}`).
        route_file: PathBuf,
        /// Current position as `x,y,z` light-years.
        #[arg(long, value_parser = parse_position, default_value = "0,0,0")]
        position: Position,
        /// Skip remote lookups and render from cache and fallback labels only.
        #[arg(long)]
        offline: bool,
    },
}

/// One entry of the journal `NavRoute.json` file.
#[derive(Debug, Deserialize)]
struct NavRouteEntry {
    #[serde(rename = "StarSystem")]
    star_system: String,
    #[serde(rename = "SystemAddress")]
    system_address: u64,
    #[serde(rename = "StarPos")]
    star_pos: [f64; 3],
    #[serde(rename = "StarClass")]
    star_class: String,
}

#[derive(Debug, Deserialize)]
struct NavRouteFile {
    #[serde(rename = "Route", default)]
    route: Vec<NavRouteEntry>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Show {
            route_file,
            position,
            offline,
        } => handle_show(&route_file, position, offline),
    }
}

fn handle_show(route_file: &Path, position: Position, offline: bool) -> Result<()> {
    let raw = fs::read_to_string(route_file)
        .with_context(|| format!("failed to read route file {}", route_file.display()))?;
    let parsed: NavRouteFile = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse route file {}", route_file.display()))?;
    let route: Vec<Waypoint> = parsed
        .route
        .into_iter()
        .map(|entry| {
            Waypoint::new(
                entry.star_system,
                entry.system_address,
                Position::from(entry.star_pos),
                entry.star_class,
            )
        })
        .collect();

    let state = RouteState::new();
    let cache = SystemCache::new();
    let cache_path = default_cache_path().ok();
    if let Some(path) = &cache_path {
        if let Err(err) = cache.load(path) {
            tracing::warn!(error = %err, "cache restore failed, starting empty");
        }
    }

    let snapshot = state.replace_route(route);
    state.set_position(position);

    // Offline still merges cache hits; it just never reaches the network.
    let lookup: Box<dyn ClassificationSource> = if offline {
        Box::new(OfflineSource)
    } else {
        Box::new(EdsmClient::new().context("failed to build lookup client")?)
    };
    enrich_route(&state, &cache, lookup.as_ref(), snapshot, cache_path.as_ref());

    if !offline {
        let hazards: Arc<DcohClient> =
            Arc::new(DcohClient::new().context("failed to build hazard client")?);
        hazard::poll_once(&state, hazards.as_ref());
    }

    render(&state.route(), &state.position(), &state.hazard_map());
    Ok(())
}

/// Lookup source that answers every batch with zero rows, leaving cache
/// misses on their fallback classification.
struct OfflineSource;

impl ClassificationSource for OfflineSource {
    fn batch_lookup(&self, _names: &[String]) -> nextstop_lib::Result<LookupReply> {
        Ok(LookupReply::Rows(Vec::new()))
    }
}

fn render(route: &[Waypoint], position: &Position, hazards: &HazardMap) {
    if route.is_empty() {
        println!("-------No Route-------");
        return;
    }
    for (index, waypoint) in route.iter().enumerate() {
        let distance = position.distance_to(&waypoint.position);
        let distance_text = if distance <= 0.0 {
            "CURRENT".to_string()
        } else {
            format!("{:.2} Ly", distance)
        };
        let mut markers = Vec::new();
        if star::is_scoopable(&waypoint.star_class) {
            markers.push("fuel".to_string());
        }
        if star::is_hazardous(&waypoint.star_class) {
            markers.push("danger".to_string());
        }
        if let Some(level) = hazards.get(&waypoint.system_id) {
            markers.push(format!("thargoid:{}", level));
        }
        println!(
            "{:>3}. {:<28} {:<32} {:>10}  {}",
            index + 1,
            waypoint.system_name,
            waypoint.display_star_type(),
            distance_text,
            markers.join(" ")
        );
    }
}

fn parse_position(raw: &str) -> std::result::Result<Position, String> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z but got '{}'", raw));
    }
    let mut coords = [0.0f64; 3];
    for (slot, part) in coords.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse()
            .map_err(|_| format!("invalid coordinate '{}'", part))?;
    }
    Ok(Position::from(coords))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
