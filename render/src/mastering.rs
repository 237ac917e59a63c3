//! Mastering: peak guard, loudness normalization to a target LUFS (with an
//! RMS fallback when a gated measurement isn't possible), then headroom.

use mashup_analysis::loudness;

const PEAK_CEILING: f64 = 0.99;
pub const DEFAULT_TARGET_LUFS: f64 = -14.0;
pub const DEFAULT_HEADROOM_DB: f64 = 1.0;

pub struct MasteringResult {
    pub samples: Vec<f64>,
    pub measured_lufs: f64,
    pub lufs_is_estimated: bool,
}

fn peak_guard(samples: &mut [f64]) {
    let peak = samples.iter().cloned().fold(0.0_f64, |a, b| a.max(b.abs()));
    if peak > PEAK_CEILING {
        let scale = PEAK_CEILING / peak;
        for sample in samples.iter_mut() {
            *sample *= scale;
        }
    }
}

#[must_use]
pub fn master(mix: &[f64], sample_rate: u32, target_lufs: f64, headroom_db: f64) -> MasteringResult {
    let mut samples = mix.to_vec();
    peak_guard(&mut samples);

    let as_f32: Vec<f32> = samples.iter().map(|s| *s as f32).collect();
    let measurement = loudness::measure(&as_f32, sample_rate);

    let gain_db = target_lufs - measurement.lufs;
    let gain = 10f64.powf(gain_db / 20.0);
    if gain.is_finite() {
        for sample in samples.iter_mut() {
            *sample *= gain;
        }
    }
    peak_guard(&mut samples);

    let headroom_factor = 10f64.powf(-headroom_db / 20.0);
    for sample in samples.iter_mut() {
        *sample *= headroom_factor;
    }

    MasteringResult { samples, measured_lufs: measurement.lufs, lufs_is_estimated: measurement.is_estimated }
}
