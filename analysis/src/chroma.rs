//! Chroma-CQT feature extraction and Krumhansl-Schmuckler key estimation.
//!
//! Chroma is built from a constant-Q filterbank rather than a linear-
//! frequency STFT folded into pitch classes: each of [`CQT_OCTAVES`]
//! octaves of [`CQT_BINS_PER_OCTAVE`] note-frequency bins is measured with
//! its own window length (longer at low pitch, per the constant-Q quality
//! factor), so low notes get the frequency resolution an STFT bin grid
//! can't give them at a single fixed window size. `pip_track`/
//! `pitch_tuning`/`estimate_tuning` below are Rust ports of librosa's tuning
//! estimator, used once per track to correct the CQT's bin centers for
//! any deviation from A440.

use super::errors::{AnalysisError, AnalysisResult};
use super::utils::{hz_to_octs_inplace, stft};
use ndarray::{s, Array, Array1, Array2, Axis, Zip};
use ndarray_stats::interpolate::Midpoint;
use ndarray_stats::QuantileExt;
use noisy_float::prelude::*;

use mashup_core::domain::{Key, Mode};

/// STFT window/hop used only to estimate the track's tuning offset.
const TUNING_WINDOW: usize = 8192;
const TUNING_HOP: usize = 2205;

/// Lowest CQT center frequency: C1, ~32.70 Hz.
const CQT_FMIN: f64 = 32.703_2;
const CQT_OCTAVES: u32 = 6;
const CQT_BINS_PER_OCTAVE: u32 = 12;
/// Hop, in samples, between CQT chroma analysis frames.
const CQT_HOP: usize = 2205;

/// Constant-Q quality factor for a 12-tone-per-octave filterbank:
/// `1 / (2^(1/12) - 1)`, the same factor librosa's CQT uses to size each
/// bin's analysis window from its center frequency.
fn cqt_quality() -> f64 {
    1.0 / (2f64.powf(1.0 / f64::from(CQT_BINS_PER_OCTAVE)) - 1.0)
}

/// Hann-windowed Goertzel magnitude of `signal` at `freq_hz`.
fn goertzel_magnitude(signal: &[f32], freq_hz: f64, sample_rate: u32) -> f64 {
    let n = signal.len();
    if n < 2 {
        return 0.0;
    }
    let omega = 2.0 * std::f64::consts::PI * freq_hz / f64::from(sample_rate);
    let (mut re, mut im) = (0.0_f64, 0.0_f64);
    for (i, &sample) in signal.iter().enumerate() {
        let taper = 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / (n - 1) as f64).cos();
        let windowed = f64::from(sample) * taper;
        let phase = omega * i as f64;
        re += windowed * phase.cos();
        im -= windowed * phase.sin();
    }
    re.hypot(im) / n as f64
}

/// One frame of constant-Q chroma centered at sample index `center`:
/// same-pitch-class bins across [`CQT_OCTAVES`] octaves are summed into
/// 12 output bins, each octave's contribution windowed to its own
/// constant-Q width.
fn cqt_chroma_frame(samples: &[f32], center: usize, sample_rate: u32, tuning: f64) -> [f64; 12] {
    let quality = cqt_quality();
    let fmin = CQT_FMIN * 2f64.powf(tuning / f64::from(CQT_BINS_PER_OCTAVE));
    let mut bins = [0.0_f64; 12];

    for octave in 0..CQT_OCTAVES {
        for pitch_class in 0..CQT_BINS_PER_OCTAVE as usize {
            let freq = fmin * 2f64.powf(f64::from(octave) + pitch_class as f64 / f64::from(CQT_BINS_PER_OCTAVE));
            let window_len = ((quality * f64::from(sample_rate) / freq).round() as usize).max(2);
            let half = window_len / 2;
            let start = center.saturating_sub(half);
            let end = (center + half).min(samples.len());
            if start >= end {
                continue;
            }
            bins[pitch_class] += goertzel_magnitude(&samples[start..end], freq, sample_rate);
        }
    }
    bins
}

/// Mean chroma-CQT profile for the whole signal, used for key estimation.
///
/// # Errors
///
/// Propagates a failure estimating the track's tuning offset.
#[must_use = "the mean chroma profile is only useful if you do something with it"]
pub fn mean_chroma_cqt(samples: &[f32], sample_rate: u32) -> AnalysisResult<[f64; 12]> {
    let mut out = [0.0_f64; 12];
    if samples.len() < CQT_HOP {
        return Ok(out);
    }

    let spectrum = stft(samples, TUNING_WINDOW.min(samples.len() - 1), TUNING_HOP);
    let tuning = estimate_tuning(sample_rate, &spectrum, TUNING_WINDOW.min(samples.len() - 1), 0.01, 12)?;

    let mut n_frames = 0usize;
    let mut center = CQT_HOP / 2;
    while center < samples.len() {
        let frame = cqt_chroma_frame(samples, center, sample_rate, tuning);
        for (bin, value) in out.iter_mut().zip(frame) {
            *bin += value;
        }
        n_frames += 1;
        center += CQT_HOP;
    }
    if n_frames == 0 {
        return Ok(out);
    }
    for bin in &mut out {
        *bin /= n_frames as f64;
    }

    let total: f64 = out.iter().sum();
    if total > f64::MIN_POSITIVE {
        for bin in &mut out {
            *bin /= total;
        }
    }
    Ok(out)
}

/// Krumhansl-Kessler major key profile, rooted at C.
const MAJOR_PROFILE: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor key profile, rooted at C.
const MINOR_PROFILE: [f64; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

fn pearson(a: &[f64; 12], b: &[f64; 12]) -> f64 {
    let mean_a = a.iter().sum::<f64>() / 12.0;
    let mean_b = b.iter().sum::<f64>() / 12.0;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..12 {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a <= 0.0 || var_b <= 0.0 {
        return 0.0;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

fn rotate(profile: &[f64; 12], pitch_class: usize) -> [f64; 12] {
    let mut rotated = [0.0_f64; 12];
    for (i, slot) in rotated.iter_mut().enumerate() {
        *slot = profile[(i + 12 - pitch_class) % 12];
    }
    rotated
}

/// Correlate `chroma` against all 24 rotations of the Krumhansl-Kessler
/// profiles and return the best-matching key and its Pearson correlation.
#[must_use]
pub fn estimate_key(chroma: &[f64; 12]) -> (Key, f64) {
    let mut best_key = Key::new(0, Mode::Major);
    let mut best_score = f64::MIN;

    for pitch_class in 0..12u8 {
        let major_score = pearson(chroma, &rotate(&MAJOR_PROFILE, pitch_class as usize));
        if major_score > best_score {
            best_score = major_score;
            best_key = Key::new(pitch_class, Mode::Major);
        }
        let minor_score = pearson(chroma, &rotate(&MINOR_PROFILE, pitch_class as usize));
        if minor_score > best_score {
            best_score = minor_score;
            best_key = Key::new(pitch_class, Mode::Minor);
        }
    }

    (best_key, best_score)
}

#[allow(clippy::missing_errors_doc, clippy::missing_panics_doc, clippy::missing_inline_in_public_items)]
pub fn pip_track(sample_rate: u32, spectrum: &Array2<f64>, n_fft: usize) -> AnalysisResult<(Vec<f64>, Vec<f64>)> {
    let sample_rate_float = f64::from(sample_rate);
    let fmin = 150.0_f64;
    let fmax = 4000.0_f64.min(sample_rate_float / 2.0);
    let threshold = 0.1;

    let fft_freqs = Array::linspace(0., sample_rate_float / 2., 1 + n_fft / 2);
    let length = spectrum.len_of(Axis(0));

    let freq_mask = fft_freqs.iter().map(|&f| (fmin <= f) && (f < fmax)).collect::<Vec<bool>>();

    let ref_value = spectrum.map_axis(Axis(0), |x| {
        let first: f64 = *x.first().expect("empty spectrum axis");
        let max = x.fold(first, |acc, &elem| if acc > elem { acc } else { elem });
        threshold * max
    });

    let taken_columns = freq_mask.iter().fold(0, |acc, &x| if x { acc + 1 } else { acc });
    let mut pitches = Vec::with_capacity(taken_columns * length);
    let mut mags = Vec::with_capacity(taken_columns * length);

    let Some(beginning) = freq_mask.iter().position(|&b| b) else {
        return Ok((pitches, mags));
    };
    let Some(end) = freq_mask.iter().rposition(|&b| b) else {
        return Ok((pitches, mags));
    };
    if end < beginning + 3 {
        return Ok((pitches, mags));
    }

    let zipped = Zip::indexed(spectrum.slice(s![beginning..end - 3, ..]))
        .and(spectrum.slice(s![beginning + 1..end - 2, ..]))
        .and(spectrum.slice(s![beginning + 2..end - 1, ..]));

    zipped.for_each(|(i, j), &before_elem, &elem, &after_elem| {
        if elem > ref_value[j] && after_elem <= elem && before_elem < elem {
            let avg = 0.5 * (after_elem - before_elem);
            let mut shift = 2f64.mul_add(elem, -after_elem) - before_elem;
            if shift.abs() < f64::MIN_POSITIVE {
                shift += 1.;
            }
            shift = avg / shift;
            #[allow(clippy::cast_precision_loss)]
            pitches.push(((i + beginning + 1) as f64 + shift) * sample_rate_float / n_fft as f64);
            mags.push((0.5 * avg).mul_add(shift, elem));
        }
    });

    Ok((pitches, mags))
}

#[allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#[inline]
pub fn pitch_tuning(frequencies: &mut Array1<f64>, resolution: f64, bins_per_octave: u32) -> AnalysisResult<f64> {
    if frequencies.is_empty() {
        return Ok(0.0);
    }
    hz_to_octs_inplace(frequencies, 0.0, 12);
    frequencies.mapv_inplace(|x| f64::from(bins_per_octave) * x % 1.0);
    frequencies.mapv_inplace(|x| if x >= 0.5 { x - 1. } else { x });

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let indexes = ((frequencies.to_owned() - -0.5) / resolution).mapv(|x| x as usize);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut counts: Array1<usize> = Array::zeros(((0.5 - -0.5) / resolution) as usize);
    for &idx in &indexes {
        if idx < counts.len() {
            counts[idx] += 1;
        }
    }
    let max_index = counts.argmax().map_err(|e| AnalysisError::Internal(format!("in chroma: {e}")))?;

    #[allow(clippy::cast_precision_loss)]
    Ok((100. * resolution).mul_add(max_index as f64, -50.) / 100.)
}

#[allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#[inline]
pub fn estimate_tuning(
    sample_rate: u32,
    spectrum: &Array2<f64>,
    n_fft: usize,
    resolution: f64,
    bins_per_octave: u32,
) -> AnalysisResult<f64> {
    let (pitch, mag) = pip_track(sample_rate, spectrum, n_fft)?;

    let (filtered_pitch, filtered_mag): (Vec<N64>, Vec<N64>) = pitch
        .iter()
        .zip(&mag)
        .filter(|(&p, _)| p > 0.)
        .map(|(x, y)| (n64(*x), n64(*y)))
        .unzip();

    if pitch.is_empty() {
        return Ok(0.);
    }

    let threshold: N64 = Array::from(filtered_mag.clone())
        .quantile_axis_mut(Axis(0), n64(0.5), &Midpoint)
        .map_err(|e| AnalysisError::Internal(format!("in chroma: {e}")))?
        .into_scalar();
    let mut pitch = filtered_pitch
        .iter()
        .zip(&filtered_mag)
        .filter_map(|(&p, &m)| if m >= threshold { Some(p.into()) } else { None })
        .collect::<Array1<f64>>();
    pitch_tuning(&mut pitch, resolution, bins_per_octave)
}
