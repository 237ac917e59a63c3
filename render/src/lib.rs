//! Renders a mashup: pitch/time-corrects each stem, mixes per recipe,
//! applies the masking EQ / sidechain ducking / de-esser chain, masters to
//! a target loudness, and emits 24-bit PCM WAV plus a project descriptor.
//!
//! Stage failures that the original falls back from rather than aborting on
//! (a failed pitch/time transform, an unavailable gated loudness meter) are
//! recovered locally here too: the stage substitutes an identity/estimate
//! and the renderer records a quality hint instead of failing the job.

#![deny(clippy::missing_inline_in_public_items)]

pub mod deesser;
pub mod errors;
pub mod eq;
pub mod filtfilt;
pub mod mastering;
pub mod mixing;
pub mod pitch_time;
pub mod project;
pub mod sidechain;
pub mod wav;

use log::{info, warn};
use mashup_core::domain::{MixParams, Plan, ProjectDescriptor, ProjectSettings, Recipe, StemKind};

use crate::errors::RenderResult;
use crate::mixing::{MixOutput, StemSet, mix_stems};
use crate::pitch_time::PitchTimeTransform;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub sample_rate: u32,
    pub target_lufs: f64,
    pub headroom_db: f64,
}

impl Default for RenderSettings {
    #[inline]
    fn default() -> Self {
        Self { sample_rate: 44_100, target_lufs: mastering::DEFAULT_TARGET_LUFS, headroom_db: mastering::DEFAULT_HEADROOM_DB }
    }
}

pub struct RenderInputs {
    pub stems_a: StemSet,
    pub stems_b: StemSet,
}

pub struct RenderOutput {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub quality_hints: Vec<String>,
    pub project: ProjectDescriptor,
}

fn transform_track(stems: &StemSet, stretch: f64, semitone_shift: i32, transform: &dyn PitchTimeTransform, quality_hints: &mut Vec<String>, track: &str) -> StemSet {
    let mut transformed = StemSet::default();
    for stem in StemKind::ALL {
        let samples = stems.get(stem);
        let result = transform.transform(samples, stretch, semitone_shift).unwrap_or_else(|error| {
            warn!("pitch/time transform failed for {track} {}: {error}", stem.as_str());
            quality_hints.push(format!("pitch/time transform failed for {track} {}, used identity fallback", stem.as_str()));
            samples.to_vec()
        });
        match stem {
            StemKind::Vocals => transformed.vocals = result,
            StemKind::Drums => transformed.drums = result,
            StemKind::Bass => transformed.bass = result,
            StemKind::Other => transformed.other = result,
        }
    }
    transformed
}

fn sum_zero_padded(a: &[f64], b: &[f64]) -> Vec<f64> {
    let len = a.len().max(b.len());
    (0..len).map(|i| a.get(i).copied().unwrap_or(0.0) + b.get(i).copied().unwrap_or(0.0)).collect()
}

/// Run the full render pipeline.
///
/// # Errors
///
/// Returns a [`crate::errors::RenderError`] if a required stem is missing
/// or empty, or if WAV emission fails. Pitch/time transform failures and an
/// unavailable gated loudness meter are recovered locally (see module docs).
#[allow(clippy::missing_inline_in_public_items)]
pub fn render(plan: &Plan, mix_params: &MixParams, inputs: RenderInputs, settings: &RenderSettings, transform: &dyn PitchTimeTransform) -> RenderResult<RenderOutput> {
    inputs.stems_a.validate("track A")?;
    inputs.stems_b.validate("track B")?;

    let mut quality_hints = Vec::new();

    info!("rendering {} at {} Hz, target {} LUFS", plan.recipe, settings.sample_rate, settings.target_lufs);
    let stems_a = transform_track(&inputs.stems_a, plan.stretch.stretch_a, plan.shift_a, transform, &mut quality_hints, "track A");
    let stems_b = transform_track(&inputs.stems_b, plan.stretch.stretch_b, plan.shift_b, transform, &mut quality_hints, "track B");

    let MixOutput { vocals, mut backing } = mix_stems(plan.recipe, mix_params, &stems_a, &stems_b);

    if mix_params.auto_eq {
        backing = eq::apply_masking_eq(&backing, f64::from(settings.sample_rate));
    }

    let combined = if mix_params.sidechain_ducking {
        sidechain::apply_sidechain_ducking(&vocals, &backing, f64::from(settings.sample_rate))
    } else {
        sum_zero_padded(&vocals, &backing)
    };

    let combined = if mix_params.de_esser { deesser::apply_deesser(&combined, f64::from(settings.sample_rate)) } else { combined };

    let mastered = mastering::master(&combined, settings.sample_rate, settings.target_lufs, settings.headroom_db);
    if mastered.lufs_is_estimated {
        quality_hints.push("loudness meter unavailable, used RMS fallback for mastering".to_string());
    }

    let project_settings = ProjectSettings { sample_rate: settings.sample_rate, target_lufs: settings.target_lufs, headroom_db: settings.headroom_db };
    let project = project::build_project_descriptor(plan.clone(), *mix_params, project_settings);

    Ok(RenderOutput { samples: mastered.samples.iter().map(|s| *s as f32).collect(), sample_rate: settings.sample_rate, quality_hints, project })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mashup_core::domain::{Compatibility, Key, Mode, StretchMap, StretchQuality};
    use pretty_assertions::assert_eq;

    struct IdentityTransform;
    impl PitchTimeTransform for IdentityTransform {
        fn transform(&self, samples: &[f32], _stretch: f64, _semitone_shift: i32) -> RenderResult<Vec<f32>> {
            Ok(samples.to_vec())
        }
    }

    struct AlwaysFailsTransform;
    impl PitchTimeTransform for AlwaysFailsTransform {
        fn transform(&self, _samples: &[f32], _stretch: f64, _semitone_shift: i32) -> RenderResult<Vec<f32>> {
            Err(crate::errors::RenderError::TransformFailure("simulated".to_string()))
        }
    }

    fn stems() -> StemSet {
        StemSet { vocals: vec![0.2; 8192], drums: vec![0.1; 8192], bass: vec![0.1; 8192], other: vec![0.1; 8192] }
    }

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
    fn render_rejects_missing_stems() {
        let mut stems_a = stems();
        stems_a.bass.clear();
        let inputs = RenderInputs { stems_a, stems_b: stems() };
        let result = render(&plan(), &MixParams::default(), inputs, &RenderSettings::default(), &IdentityTransform);
        assert!(result.is_err());
    }

    #[test]
    fn render_produces_non_empty_finite_samples() {
        let inputs = RenderInputs { stems_a: stems(), stems_b: stems() };
        let output = render(&plan(), &MixParams::default(), inputs, &RenderSettings::default(), &IdentityTransform).unwrap();
        assert!(!output.samples.is_empty());
        assert!(output.samples.iter().all(|s| s.is_finite()));
        assert_eq!(output.sample_rate, 44_100);
    }

    #[test]
    fn a_failed_transform_falls_back_and_records_a_hint() {
        let inputs = RenderInputs { stems_a: stems(), stems_b: stems() };
        let output = render(&plan(), &MixParams::default(), inputs, &RenderSettings::default(), &AlwaysFailsTransform).unwrap();
        assert!(output.quality_hints.iter().any(|hint| hint.contains("identity fallback")));
    }

    #[test]
    fn disabling_every_effect_still_produces_output() {
        let mix_params = MixParams { auto_eq: false, sidechain_ducking: false, de_esser: false, ..MixParams::default() };
        let inputs = RenderInputs { stems_a: stems(), stems_b: stems() };
        let output = render(&plan(), &mix_params, inputs, &RenderSettings::default(), &IdentityTransform).unwrap();
        assert!(!output.samples.is_empty());
    }
}
