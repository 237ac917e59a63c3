//! Target-key selection and semitone-shift computation.
//!
//! Shift semantics are derived from pitch-class distance, not Camelot ring
//! index: the ring only encodes harmonic adjacency (steps of a fifth), so a
//! modulo-12 difference of ring positions is not a semitone count. See
//! [`mashup_core::domain::camelot::semitone_shift`].

use mashup_core::domain::{camelot::semitone_shift, Camelot};

const SHIFT_CLAMP: i32 = 3;
const CLAMP_OVERRIDE_RING_DISTANCE: u8 = 4;

pub const MANUAL_ADJUSTMENT_HINT: &str = "consider manual key adjustment";

/// The Camelot position minimizing the combined ring distance to both
/// source keys. Ties broken by lowest lexicographic label.
#[must_use]
pub fn choose_target_key(a: &Camelot, b: &Camelot) -> Camelot {
    Camelot::all()
        .into_iter()
        .min_by(|x, y| {
            let cost_x = u32::from(a.ring_distance(x)) + u32::from(b.ring_distance(x));
            let cost_y = u32::from(a.ring_distance(y)) + u32::from(b.ring_distance(y));
            cost_x.cmp(&cost_y).then_with(|| x.label().cmp(&y.label()))
        })
        .expect("Camelot::all() is never empty")
}

/// A key shift, always clamped to `[-3, 3]`, plus whether clamping cost
/// enough harmonic distance that a quality hint is warranted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shift {
    pub semitones: i32,
    pub needs_manual_adjustment_hint: bool,
}

#[must_use]
pub fn shift_for(source: &Camelot, target: &Camelot) -> Shift {
    let raw = semitone_shift(source, target);
    let clamped = raw.clamp(-SHIFT_CLAMP, SHIFT_CLAMP);
    let clamping_occurred = raw != clamped;
    let needs_manual_adjustment_hint = clamping_occurred && source.ring_distance(target) > CLAMP_OVERRIDE_RING_DISTANCE;
    Shift { semitones: clamped, needs_manual_adjustment_hint }
}
