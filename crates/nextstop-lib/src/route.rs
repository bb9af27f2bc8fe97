use serde::{Deserialize, Serialize};

use crate::geometry::Position;
use crate::star;

/// Stable numeric identifier for a star system.
pub type SystemId = u64;

/// One stop in a travel route.
///
/// `star_class` always comes from the navigation source. `star_type_name`
/// and `lookup_url` start empty and are filled in asynchronously by the
/// enrichment worker; consumers must tolerate both states at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub system_name: String,
    pub system_id: SystemId,
    pub position: Position,
    pub star_class: String,
    #[serde(default)]
    pub star_type_name: String,
    #[serde(default)]
    pub lookup_url: String,
}

impl Waypoint {
    /// Create an un-enriched waypoint from navigation-source fields.
    pub fn new(
        system_name: impl Into<String>,
        system_id: SystemId,
        position: Position,
        star_class: impl Into<String>,
    ) -> Self {
        Self {
            system_name: system_name.into(),
            system_id,
            position,
            star_class: star_class.into(),
            star_type_name: String::new(),
            lookup_url: String::new(),
        }
    }

    /// The display classification: the enriched name when present, the
    /// best-effort fallback derived from the class code otherwise.
    pub fn display_star_type(&self) -> String {
        if self.star_type_name.is_empty() {
            star::classify(&self.star_class)
        } else {
            self.star_type_name.clone()
        }
    }
}

/// Ordered sequence of waypoints; insertion order is navigation order.
///
/// Routes are replaced wholesale, never mutated in place. Everything outside
/// the state owner works on snapshots.
pub type Route = Vec<Waypoint>;
