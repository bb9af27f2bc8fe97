//! Fallback star classification from navigation-source class codes.
//!
//! The navigation data only carries a short class code and cannot
//! disambiguate every sub-class the remote lookup service can (for example
//! the exact white-dwarf sub-type), so labels derived here are best-effort
//! placeholders until enrichment supplies the authoritative name. Codes
//! marked with `*` in the label are uncertain for that reason.

/// Main-sequence classes that support fuel scooping.
pub const SCOOPABLE_STARS: [&str; 7] = ["O", "B", "A", "F", "G", "K", "M"];

const BROWN_DWARFS: [&str; 3] = ["L", "T", "Y"];

const WOLF_RAYET: [&str; 4] = ["WN", "WNC", "WC", "WO"];

const WHITE_DWARFS: [&str; 15] = [
    "D", "DA", "DAB", "DAO", "DAZ", "DAV", "DB", "DBV", "DBZ", "DC", "DCV", "DO", "DOV", "DQ",
    "DX",
];

/// Map a stellar class code to a human-readable display label.
pub fn classify(star_class: &str) -> String {
    match star_class {
        // Scoopable main sequence
        "O" => "O (Blue-White) Star".to_string(),
        "B" | "A" => format!("{} (Blue-White*) Star", star_class),
        "F" => "F (White*) Star".to_string(),
        "G" => "G (White-Yellow*) Star".to_string(),
        "K" => "K (Yellow-Orange*) Star".to_string(),
        "M" => "M (Red*) Star".to_string(),

        // Brown dwarfs
        c if BROWN_DWARFS.contains(&c) => format!("{} (Brown dwarf) Star", c),

        // Proto-stars
        "TTS" => "T Tauri Star".to_string(),
        "AeBe" => "Herbig Ae/Be Star".to_string(),

        // Wolf-Rayet family
        "W" => "Wolf-Rayet Star".to_string(),
        c if WOLF_RAYET.contains(&c) => {
            format!("Wolf-Rayet {} Star", c.trim_start_matches('W'))
        }

        // Rare
        "MS" | "S" => format!("{}-type Star", star_class),

        // White dwarfs
        c if WHITE_DWARFS.contains(&c) => format!("White Dwarf ({}) Star", c),

        // Stellar remnants
        "N" => "Neutron Star".to_string(),
        "H" => "Black Hole".to_string(),
        "SupermassiveBlackHole" => "Supermassive Black Hole".to_string(),

        other => format!("{} Star", other),
    }
}

/// Whether the class code denotes a star a ship can refuel from.
pub fn is_scoopable(star_class: &str) -> bool {
    SCOOPABLE_STARS.contains(&star_class)
}

/// Whether the class code denotes a hazard on arrival (white dwarfs,
/// neutron stars, black holes).
pub fn is_hazardous(star_class: &str) -> bool {
    WHITE_DWARFS.contains(&star_class)
        || matches!(star_class, "N" | "H" | "SupermassiveBlackHole")
}
