//! The fixed stem-mixing recipes.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recipe {
    AoverB,
    BoverA,
    HybridDrums,
}

impl std::str::FromStr for Recipe {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AoverB" => Ok(Self::AoverB),
            "BoverA" => Ok(Self::BoverA),
            "HybridDrums" => Ok(Self::HybridDrums),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Recipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AoverB => "AoverB",
            Self::BoverA => "BoverA",
            Self::HybridDrums => "HybridDrums",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StemKind {
    Vocals,
    Drums,
    Bass,
    Other,
}

impl StemKind {
    pub const ALL: [Self; 4] = [Self::Vocals, Self::Drums, Self::Bass, Self::Other];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vocals => "vocals",
            Self::Drums => "drums",
            Self::Bass => "bass",
            Self::Other => "other",
        }
    }
}

/// Which source track(s) feed a stem, and its default linear gain, for a
/// given recipe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StemSource {
    TrackA,
    TrackB,
    /// Equal-gain sum of both tracks' stem (`HybridDrums`'s bass/other).
    Mixed,
}

#[must_use]
pub const fn recipe_table(recipe: Recipe, stem: StemKind) -> (StemSource, f64) {
    use StemSource::{Mixed, TrackA, TrackB};
    match (recipe, stem) {
        (Recipe::AoverB, StemKind::Vocals) => (TrackA, 1.0),
        (Recipe::AoverB, StemKind::Drums) => (TrackB, 0.8),
        (Recipe::AoverB, StemKind::Bass) => (TrackB, 0.7),
        (Recipe::AoverB, StemKind::Other) => (TrackB, 0.6),

        (Recipe::BoverA, StemKind::Vocals) => (TrackB, 1.0),
        (Recipe::BoverA, StemKind::Drums) => (TrackA, 0.8),
        (Recipe::BoverA, StemKind::Bass) => (TrackA, 0.7),
        (Recipe::BoverA, StemKind::Other) => (TrackA, 0.6),

        (Recipe::HybridDrums, StemKind::Vocals) => (TrackA, 1.0),
        (Recipe::HybridDrums, StemKind::Drums) => (TrackB, 0.9),
        (Recipe::HybridDrums, StemKind::Bass) => (Mixed, 0.8),
        (Recipe::HybridDrums, StemKind::Other) => (Mixed, 0.7),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_round_trips_through_display_and_from_str() {
        for recipe in [Recipe::AoverB, Recipe::BoverA, Recipe::HybridDrums] {
            let s = recipe.to_string();
            assert_eq!(s.parse::<Recipe>().unwrap(), recipe);
        }
    }

    #[test]
    fn unknown_recipe_string_fails_to_parse() {
        assert!("Unknown".parse::<Recipe>().is_err());
    }
}
