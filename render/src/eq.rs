//! Masking-aware EQ: a 2-5 kHz bandstop carved out of the backing track so
//! the vocal presence range has room, applied to the backing bus only.
//!
//! A true 4th-order Butterworth bandstop needs two biquad stages with
//! distinct per-stage pole Qs (0.5411961 and 1.3065629), which in turn needs
//! a filter-design crate to derive from the cutoff pair. Absent that, two
//! identical RBJ bandstop biquads sharing one bandwidth-derived Q are
//! cascaded instead — a documented approximation, not the genuine article.

use mashup_analysis::biquad::{Biquad, FilterType};

use crate::filtfilt::filtfilt;

const LOW_CUTOFF_HZ: f64 = 2000.0;
const HIGH_CUTOFF_HZ: f64 = 5000.0;

fn masking_cascade(sample_rate: f64) -> [Biquad; 2] {
    let center = (LOW_CUTOFF_HZ * HIGH_CUTOFF_HZ).sqrt();
    let q = center / (HIGH_CUTOFF_HZ - LOW_CUTOFF_HZ);
    let stage = Biquad::design(FilterType::Bandstop, sample_rate, center, q, 0.0);
    [stage.clone(), stage]
}

#[must_use]
pub fn apply_masking_eq(backing: &[f64], sample_rate: f64) -> Vec<f64> {
    let cascade = masking_cascade(sample_rate);
    filtfilt(&cascade, backing)
}
