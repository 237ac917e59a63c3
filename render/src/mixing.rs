//! Recipe-driven stem mixing: picks each stem's source track per the recipe
//! table and applies its gain, splitting the result into a vocals bus and a
//! backing bus (everything else summed together) for the later effect
//! stages, which treat vocals and backing differently.

use mashup_core::domain::{MixParams, Recipe, StemKind, StemSource, recipe_table};

use crate::errors::{RenderError, RenderResult};

/// The four pitch/time-corrected stems for one track.
#[derive(Debug, Clone, Default)]
pub struct StemSet {
    pub vocals: Vec<f32>,
    pub drums: Vec<f32>,
    pub bass: Vec<f32>,
    pub other: Vec<f32>,
}

impl StemSet {
    #[must_use]
    #[inline]
    pub fn get(&self, stem: StemKind) -> &[f32] {
        match stem {
            StemKind::Vocals => &self.vocals,
            StemKind::Drums => &self.drums,
            StemKind::Bass => &self.bass,
            StemKind::Other => &self.other,
        }
    }

    /// Every stem has at least one sample.
    #[must_use]
    pub fn validate(&self, track: &str) -> RenderResult<()> {
        for stem in StemKind::ALL {
            if self.get(stem).is_empty() {
                return Err(RenderError::MissingStem(format!("{track} {}", stem.as_str())));
            }
        }
        Ok(())
    }
}

pub struct MixOutput {
    pub vocals: Vec<f64>,
    pub backing: Vec<f64>,
}

fn add_into(dest: &mut Vec<f64>, source: &[f32], gain: f64) {
    if dest.len() < source.len() {
        dest.resize(source.len(), 0.0);
    }
    for (d, s) in dest.iter_mut().zip(source) {
        *d += f64::from(*s) * gain;
    }
}

/// Select the samples for `source` (`TrackA`, `TrackB`, or the equal-gain
/// sum of both) for one stem.
fn select_source(stem: StemKind, source: StemSource, a: &StemSet, b: &StemSet) -> Vec<f64> {
    match source {
        StemSource::TrackA => a.get(stem).iter().map(|s| f64::from(*s)).collect(),
        StemSource::TrackB => b.get(stem).iter().map(|s| f64::from(*s)).collect(),
        StemSource::Mixed => {
            let mut mixed = Vec::new();
            add_into(&mut mixed, a.get(stem), 1.0);
            add_into(&mut mixed, b.get(stem), 1.0);
            mixed
        }
    }
}

/// `mix_params`'s gain fields are authoritative over the recipe table's own
/// default gains: `MixParams` always carries a value (no way to distinguish
/// "use the recipe default" from "the caller set it to the default"), so the
/// caller's value wins unconditionally.
fn gain_for(stem: StemKind, mix_params: &MixParams) -> f64 {
    match stem {
        StemKind::Vocals => mix_params.vocals_gain,
        StemKind::Drums => mix_params.drums_gain,
        StemKind::Bass => mix_params.bass_gain,
        StemKind::Other => mix_params.other_gain,
    }
}

#[must_use]
pub fn mix_stems(recipe: Recipe, mix_params: &MixParams, stems_a: &StemSet, stems_b: &StemSet) -> MixOutput {
    let mut vocals = Vec::new();
    let mut backing = Vec::new();

    for stem in StemKind::ALL {
        let (source, _default_gain) = recipe_table(recipe, stem);
        let gain = gain_for(stem, mix_params);
        let samples = select_source(stem, source, stems_a, stems_b);

        let bus = if stem == StemKind::Vocals { &mut vocals } else { &mut backing };
        if bus.len() < samples.len() {
            bus.resize(samples.len(), 0.0);
        }
        for (d, s) in bus.iter_mut().zip(&samples) {
            *d += s * gain;
        }
    }

    MixOutput { vocals, backing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stems(value: f32) -> StemSet {
        StemSet { vocals: vec![value; 4], drums: vec![value; 4], bass: vec![value; 4], other: vec![value; 4] }
    }

    #[test]
    fn validate_rejects_an_empty_stem() {
        let mut set = stems(1.0);
        set.bass.clear();
        assert!(set.validate("a").is_err());
    }

    #[test]
    fn a_over_b_takes_vocals_from_a_and_backing_from_b() {
        let a = stems(1.0);
        let b = stems(2.0);
        let mix_params = MixParams::default();
        let out = mix_stems(Recipe::AoverB, &mix_params, &a, &b);
        assert_eq!(out.vocals[0], mix_params.vocals_gain * 1.0);
        assert_eq!(out.backing[0], (mix_params.drums_gain + mix_params.bass_gain + mix_params.other_gain) * 2.0);
    }

    #[test]
    fn hybrid_drums_mixed_stems_sum_rather_than_average() {
        let a = stems(1.0);
        let b = stems(1.0);
        let mix_params = MixParams::default();
        let (source, _) = recipe_table(Recipe::HybridDrums, StemKind::Bass);
        assert_eq!(source, StemSource::Mixed);
        let out = mix_stems(Recipe::HybridDrums, &mix_params, &a, &b);
        assert_eq!(out.backing[0], mix_params.drums_gain * 1.0 + mix_params.bass_gain * 2.0 + mix_params.other_gain * 2.0);
    }
}
