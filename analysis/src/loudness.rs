//! Integrated loudness measurement.
//!
//! Implements the ITU-R BS.1770 K-weighting + gated-block algorithm for
//! mono signals, with a plain RMS estimate as a fallback when the signal
//! is too short to form even one gating block.

use crate::biquad::{Biquad, FilterType};

const BLOCK_SECONDS: f64 = 0.400;
const HOP_SECONDS: f64 = 0.100;
const ABSOLUTE_GATE_LUFS: f64 = -70.0;
const RELATIVE_GATE_OFFSET_LU: f64 = 10.0;

/// Stage 1 of K-weighting: a high shelf centered near 1.68kHz, +4dB.
/// Stage 2: a high-pass ("RLB" weighting) around 38Hz. Parameters are the
/// analog-prototype values from BS.1770-4 Annex 1, re-designed at whatever
/// sample rate the signal actually uses.
fn k_weight(samples: &[f32], sample_rate: u32) -> Vec<f64> {
    let fs = f64::from(sample_rate);
    let mut stage1 = Biquad::design(FilterType::HighShelf, fs, 1681.974_450_955_533, 0.707_175_236_955_419_6, 3.999_843_853_973_347);
    let mut stage2 = Biquad::design(FilterType::Highpass, fs, 38.135_470_876_139_82, 0.500_327_037_323_877_3, 0.0);

    let mut weighted: Vec<f64> = samples.iter().map(|&s| f64::from(s)).collect();
    stage1.process_buffer(&mut weighted);
    stage2.process_buffer(&mut weighted);
    weighted
}

/// `true` if the signal result in [`Analysis::lufs`](mashup_core::domain::Analysis::lufs)
/// is an RMS estimate rather than a true gated measurement.
#[must_use]
pub struct LoudnessMeasurement {
    pub lufs: f64,
    pub is_estimated: bool,
}

/// Measure integrated loudness of a mono signal. Falls back to a simple
/// RMS-based estimate if the signal is shorter than one gating block.
#[must_use]
pub fn measure(samples: &[f32], sample_rate: u32) -> LoudnessMeasurement {
    let block_len = (BLOCK_SECONDS * f64::from(sample_rate)) as usize;
    if samples.len() < block_len || block_len == 0 {
        return LoudnessMeasurement {
            lufs: rms_fallback(samples),
            is_estimated: true,
        };
    }

    let hop_len = ((HOP_SECONDS * f64::from(sample_rate)) as usize).max(1);
    let weighted = k_weight(samples, sample_rate);

    let block_mean_squares: Vec<f64> = weighted
        .windows(block_len)
        .step_by(hop_len)
        .map(|block| block.iter().map(|&x| x * x).sum::<f64>() / block_len as f64)
        .collect();

    if block_mean_squares.is_empty() {
        return LoudnessMeasurement {
            lufs: rms_fallback(samples),
            is_estimated: true,
        };
    }

    let block_loudness = |mean_square: f64| -> f64 {
        if mean_square <= 0.0 {
            f64::NEG_INFINITY
        } else {
            -0.691 + 10.0 * mean_square.log10()
        }
    };

    let gated_absolute: Vec<f64> = block_mean_squares
        .iter()
        .copied()
        .filter(|&ms| block_loudness(ms) >= ABSOLUTE_GATE_LUFS)
        .collect();

    if gated_absolute.is_empty() {
        return LoudnessMeasurement { lufs: ABSOLUTE_GATE_LUFS, is_estimated: false };
    }

    let ungated_mean = gated_absolute.iter().sum::<f64>() / gated_absolute.len() as f64;
    let relative_threshold = block_loudness(ungated_mean) - RELATIVE_GATE_OFFSET_LU;

    let gated_relative: Vec<f64> = gated_absolute
        .iter()
        .copied()
        .filter(|&ms| block_loudness(ms) >= relative_threshold)
        .collect();

    let final_set = if gated_relative.is_empty() { &gated_absolute } else { &gated_relative };
    let final_mean = final_set.iter().sum::<f64>() / final_set.len() as f64;

    LoudnessMeasurement {
        lufs: block_loudness(final_mean),
        is_estimated: false,
    }
}

/// Crude RMS-based loudness estimate, used when a true gated measurement
/// isn't possible. The -3dB offset roughly compensates for K-weighting's
/// typical effect on program material.
#[must_use]
pub fn rms_fallback(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return f64::NEG_INFINITY;
    }
    let mean_square = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum::<f64>() / samples.len() as f64;
    if mean_square <= 0.0 {
        return f64::NEG_INFINITY;
    }
    20.0 * mean_square.sqrt().log10() - 3.0
}
