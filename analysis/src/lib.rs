//! Tempo, key, structure, and loudness analysis for the mashup engine.
//!
//! Decoding is rodio + rubato based: any container rodio understands is
//! collapsed to mono and resampled to [`SAMPLE_RATE`]. From there,
//! [`analyze`] runs beat tracking, key detection, structural segmentation,
//! and loudness measurement in parallel and assembles the result into a
//! [`mashup_core::domain::Analysis`].

#![deny(clippy::missing_inline_in_public_items)]

pub mod biquad;
pub mod chroma;
pub mod decoder;
pub mod errors;
pub mod loudness;
pub mod structure;
pub mod temporal;
pub mod utils;

use std::path::PathBuf;

use errors::{AnalysisError, AnalysisResult};
use mashup_core::domain::Analysis;

/// The sample rate every analysis module assumes its input is at.
pub const SAMPLE_RATE: u32 = 44_100;

/// Shortest input [`analyze`] will run on: one second.
pub const MINIMUM_ANALYSIS_SAMPLES: usize = SAMPLE_RATE as usize;

/// Decoded, resampled, mono PCM ready for analysis.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub path: PathBuf,
    pub samples: Vec<f32>,
}

/// Run the full analysis pipeline against decoded mono PCM.
///
/// Beat tracking, key detection, structural segmentation, and loudness
/// measurement are independent of each other and run in parallel across
/// a rayon thread pool.
///
/// # Errors
///
/// Returns [`AnalysisError::TooShort`] if `samples` is shorter than
/// [`MINIMUM_ANALYSIS_SAMPLES`].
#[allow(clippy::missing_inline_in_public_items)]
pub fn analyze(samples: &[f32], sample_rate: u32) -> AnalysisResult<Analysis> {
    if samples.len() < MINIMUM_ANALYSIS_SAMPLES {
        return Err(AnalysisError::TooShort);
    }

    let duration_s = f64::from(samples.len() as u32) / f64::from(sample_rate);

    let ((beats, key_estimate), (sections, loudness)) = rayon::join(
        || {
            rayon::join(
                || temporal::track_beats(samples, sample_rate),
                || -> AnalysisResult<_> {
                    let mean_chroma = chroma::mean_chroma_cqt(samples, sample_rate)?;
                    Ok(chroma::estimate_key(&mean_chroma))
                },
            )
        },
        || {
            rayon::join(
                || structure::segment(samples, sample_rate, duration_s),
                || loudness::measure(samples, sample_rate),
            )
        },
    );

    let (key, _correlation) = key_estimate?;

    Ok(Analysis {
        duration_s,
        bpm: beats.bpm,
        beats: beats.beats_s,
        downbeats: beats.downbeats_s,
        key: key.name(),
        camelot: key.camelot(),
        sections,
        lufs: loudness.lufs,
        lufs_is_estimated: loudness.is_estimated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_signal(sample_rate: u32, seconds: f32) -> Vec<f32> {
        let n = (seconds * sample_rate as f32) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn analyze_rejects_input_shorter_than_the_minimum_window() {
        let samples = vec![0.0_f32; 100];
        let result = analyze(&samples, SAMPLE_RATE);
        assert!(matches!(result, Err(AnalysisError::TooShort)));
    }

    #[test]
    fn analyze_produces_a_well_formed_result_for_a_plain_tone() {
        let samples = test_signal(SAMPLE_RATE, 8.0);
        let analysis = analyze(&samples, SAMPLE_RATE).unwrap();
        assert!(analysis.beats_are_well_formed());
        assert!(analysis.sections_partition_duration());
        assert!(analysis.bpm > 0.0);
        assert!((analysis.duration_s - 8.0).abs() < 1e-6);
    }
}
