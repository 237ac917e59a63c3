//! Structural segmentation: MFCCs, a self-similarity matrix, a novelty
//! curve derived from its first superdiagonal, and peak-picking to find
//! section boundaries.

use ndarray::{Array1, Array2};

use crate::utils::stft;
use mashup_core::domain::{Section, SectionLabel};

pub const HOP_LENGTH: usize = 1024;
pub const WINDOW_LENGTH: usize = 2048;
pub const N_MFCC: usize = 13;
const N_MELS: usize = 40;
const MIN_PEAK_SEPARATION_FRAMES: usize = 10;

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank, `n_mels` rows by `n_fft / 2 + 1` columns.
fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Array2<f64> {
    let n_bins = n_fft / 2 + 1;
    let mel_min = hz_to_mel(0.0);
    let mel_max = hz_to_mel(f64::from(sample_rate) / 2.0);
    let mel_points: Vec<f64> = (0..=n_mels + 1)
        .map(|i| mel_min + (mel_max - mel_min) * i as f64 / (n_mels + 1) as f64)
        .collect();
    let hz_points: Vec<f64> = mel_points.iter().map(|&m| mel_to_hz(m)).collect();
    let bin_points: Vec<usize> = hz_points
        .iter()
        .map(|&hz| ((hz * f64::from(n_fft) / f64::from(sample_rate)).round() as usize).min(n_bins - 1))
        .collect();

    let mut filterbank = Array2::zeros((n_mels, n_bins));
    for m in 0..n_mels {
        let (left, center, right) = (bin_points[m], bin_points[m + 1], bin_points[m + 2]);
        for bin in left..center.max(left + 1) {
            if center > left {
                filterbank[[m, bin.min(n_bins - 1)]] = (bin - left) as f64 / (center - left) as f64;
            }
        }
        for bin in center..right.max(center + 1) {
            if right > center {
                filterbank[[m, bin.min(n_bins - 1)]] = (right - bin) as f64 / (right - center) as f64;
            }
        }
    }
    filterbank
}

/// Type-II DCT of `n_mfcc` coefficients (orthonormalized) over `log_mel`.
fn dct(log_mel: &Array1<f64>, n_mfcc: usize) -> Vec<f64> {
    let n = log_mel.len();
    (0..n_mfcc)
        .map(|k| {
            let mut sum = 0.0;
            for (i, &value) in log_mel.iter().enumerate() {
                sum += value * (std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n as f64)).cos();
            }
            let scale = if k == 0 { (1.0 / n as f64).sqrt() } else { (2.0 / n as f64).sqrt() };
            scale * sum
        })
        .collect()
}

/// `N_MFCC` rows by frame-count columns.
#[must_use]
pub fn mfcc(samples: &[f32], sample_rate: u32) -> Array2<f64> {
    let spectrogram = stft(samples, WINDOW_LENGTH, HOP_LENGTH);
    let filterbank = mel_filterbank(sample_rate, WINDOW_LENGTH, N_MELS);

    let n_frames = spectrogram.ncols();
    let mut coefficients = Array2::zeros((N_MFCC, n_frames));
    for frame in 0..n_frames {
        let power = spectrogram.column(frame).mapv(|x| x * x);
        let mel_energy = filterbank.dot(&power);
        let log_mel = mel_energy.mapv(|x| (x + 1e-10).ln());
        let frame_mfcc = dct(&log_mel, N_MFCC);
        for (i, value) in frame_mfcc.into_iter().enumerate() {
            coefficients[[i, frame]] = value;
        }
    }
    coefficients
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..a.len() {
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

/// Self-similarity matrix of the MFCC frames (Pearson correlation).
#[must_use]
pub fn self_similarity_matrix(coefficients: &Array2<f64>) -> Array2<f64> {
    let n_frames = coefficients.ncols();
    let columns: Vec<Vec<f64>> = (0..n_frames).map(|f| coefficients.column(f).to_vec()).collect();

    let mut ssm = Array2::zeros((n_frames, n_frames));
    for i in 0..n_frames {
        ssm[[i, i]] = 1.0;
        for j in (i + 1)..n_frames {
            let similarity = pearson(&columns[i], &columns[j]);
            ssm[[i, j]] = similarity;
            ssm[[j, i]] = similarity;
        }
    }
    ssm
}

/// Novelty curve from the first superdiagonal: a drop in similarity
/// between consecutive frames signals a likely section boundary.
#[must_use]
pub fn novelty_curve(ssm: &Array2<f64>) -> Vec<f64> {
    let n_frames = ssm.nrows();
    if n_frames < 2 {
        return Vec::new();
    }
    (0..n_frames - 1).map(|i| 1.0 - ssm[[i, i + 1]]).collect()
}

fn pick_peaks(novelty: &[f64]) -> Vec<usize> {
    if novelty.is_empty() {
        return Vec::new();
    }
    let mean = novelty.iter().sum::<f64>() / novelty.len() as f64;

    let mut peaks = Vec::new();
    let mut last_peak: Option<usize> = None;
    for i in 1..novelty.len() - 1 {
        if novelty[i] >= mean && novelty[i] >= novelty[i - 1] && novelty[i] >= novelty[i + 1] {
            if last_peak.is_none_or(|last| i - last >= MIN_PEAK_SEPARATION_FRAMES) {
                peaks.push(i);
                last_peak = Some(i);
            }
        }
    }
    peaks
}

fn label_for_index(index: usize) -> SectionLabel {
    match index % 4 {
        0 => SectionLabel::Chorus,
        1 => SectionLabel::Verse,
        2 => SectionLabel::Bridge,
        _ => SectionLabel::Verse,
    }
}

/// Segment a mono PCM buffer into labeled sections spanning `[0, duration_s]`.
#[must_use]
pub fn segment(samples: &[f32], sample_rate: u32, duration_s: f64) -> Vec<Section> {
    if samples.len() < WINDOW_LENGTH * 4 {
        return vec![Section { start: 0.0, end: duration_s, label: SectionLabel::Verse }];
    }

    let coefficients = mfcc(samples, sample_rate);
    let ssm = self_similarity_matrix(&coefficients);
    let novelty = novelty_curve(&ssm);
    let peak_frames = pick_peaks(&novelty);

    let frame_rate = f64::from(sample_rate) / HOP_LENGTH as f64;
    let mut boundaries: Vec<f64> = vec![0.0];
    boundaries.extend(peak_frames.iter().map(|&f| f as f64 / frame_rate));
    boundaries.push(duration_s);
    boundaries.retain(|&b| b >= 0.0 && b <= duration_s);
    boundaries.dedup_by(|a, b| (*a - *b).abs() < 1e-9);

    boundaries
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0])
        .map(|(index, w)| Section { start: w[0], end: w[1], label: label_for_index(index) })
        .collect()
}
