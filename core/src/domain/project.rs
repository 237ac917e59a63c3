//! The reproducible project descriptor (external interfaces §6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{mix::MixParams, plan::Plan};

pub const PROJECT_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(rename = "sampleRate")]
    pub sample_rate: u32,
    #[serde(rename = "targetLUFS")]
    pub target_lufs: f64,
    #[serde(rename = "headroomDB")]
    pub headroom_db: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub version: String,
    pub plan: Plan,
    #[serde(rename = "mixParams")]
    pub mix_params: MixParams,
    pub settings: ProjectSettings,
    pub timestamp: DateTime<Utc>,
}

impl ProjectDescriptor {
    #[must_use]
    pub fn new(
        plan: Plan,
        mix_params: MixParams,
        settings: ProjectSettings,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            version: PROJECT_SCHEMA_VERSION.to_string(),
            plan,
            mix_params,
            settings,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::camelot::{Camelot, Key, Mode};
    use crate::domain::plan::{Compatibility, StretchMap, StretchQuality};
    use crate::domain::recipe::Recipe;
    use pretty_assertions::assert_eq;

    fn sample_plan() -> Plan {
        Plan {
            recipe: Recipe::AoverB,
            target_key: Key::new(0, Mode::Major).camelot(),
            shift_a: 0,
            shift_b: 2,
            stretch: StretchMap {
                target_bpm: 120.0,
                stretch_a: 1.0,
                stretch_b: 0.97,
                quality: StretchQuality::High,
            },
            section_pairs: vec![],
            quality_hints: vec![],
            compatibility: Compatibility {
                key_score: 0,
                tempo_score: 0,
                structure_score: 0,
                overall: 0.0,
            },
        }
    }

    #[test]
    fn serializes_with_the_stable_field_names() {
        let descriptor = ProjectDescriptor::new(
            sample_plan(),
            MixParams::default(),
            ProjectSettings {
                sample_rate: 44100,
                target_lufs: -14.0,
                headroom_db: 1.0,
            },
            Utc::now(),
        );
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["settings"]["sampleRate"], 44100);
        assert_eq!(json["settings"]["targetLUFS"], -14.0);
        assert_eq!(json["settings"]["headroomDB"], 1.0);
        assert_eq!(json["plan"]["targetKey"], "8B");
        assert_eq!(json["plan"]["keyShiftB"], 2);

        let round_tripped: ProjectDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(round_tripped, descriptor);
    }
}
