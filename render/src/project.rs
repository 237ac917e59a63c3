//! Builds the reproducible project descriptor that ships alongside the
//! rendered WAV (external interfaces: `create_project_json`'s Rust analog).

use chrono::Utc;
use mashup_core::domain::{MixParams, Plan, ProjectDescriptor, ProjectSettings};

#[must_use]
pub fn build_project_descriptor(plan: Plan, mix_params: MixParams, settings: ProjectSettings) -> ProjectDescriptor {
    ProjectDescriptor::new(plan, mix_params, settings, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mashup_core::domain::{Compatibility, Key, Mode, Recipe, StretchMap, StretchQuality};
    use pretty_assertions::assert_eq;

    fn plan() -> Plan {
        Plan {
            recipe: Recipe::AoverB,
            target_key: Key::new(0, Mode::Major).camelot(),
            shift_a: 0,
            shift_b: 0,
            stretch: StretchMap { target_bpm: 120.0, stretch_a: 1.0, stretch_b: 1.0, quality: StretchQuality::High },
            section_pairs: vec![],
            quality_hints: vec![],
            compatibility: Compatibility { key_score: 0, tempo_score: 0, structure_score: 0, overall: 0.0 },
        }
    }

    #[test]
    fn descriptor_carries_the_schema_version() {
        let settings = ProjectSettings { sample_rate: 44_100, target_lufs: -14.0, headroom_db: 1.0 };
        let descriptor = build_project_descriptor(plan(), MixParams::default(), settings);
        assert_eq!(descriptor.version, mashup_core::domain::project::PROJECT_SCHEMA_VERSION);
    }
}
