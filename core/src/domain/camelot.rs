//! Musical key <-> Camelot wheel notation, and the ring arithmetic the
//! planner uses for compatibility scoring and target-key selection.
//!
//! The mapping table below is load-bearing: it is the one place that
//! translates a pitch class + mode into the label the rest of the system
//! speaks in.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Major-key Camelot number for each pitch class, `C = 0 .. B = 11`.
const MAJOR_NUMBER_FOR_PC: [u8; 12] = [8, 3, 10, 5, 12, 7, 2, 9, 4, 11, 6, 1];

/// Inverse of [`MAJOR_NUMBER_FOR_PC`], indexed `[number - 1]`.
const PC_FOR_MAJOR_NUMBER: [u8; 12] = {
    let mut table = [0u8; 12];
    let mut pc = 0;
    while pc < 12 {
        table[(MAJOR_NUMBER_FOR_PC[pc] - 1) as usize] = pc as u8;
        pc += 1;
    }
    table
};

pub const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Major,
    Minor,
}

/// A musical key: a pitch class in `0..12` plus a mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Key {
    pub pitch_class: u8,
    pub mode: Mode,
}

impl Key {
    #[must_use]
    pub const fn new(pitch_class: u8, mode: Mode) -> Self {
        Self {
            pitch_class: pitch_class % 12,
            mode,
        }
    }

    #[must_use]
    pub fn name(&self) -> String {
        let root = PITCH_CLASS_NAMES[self.pitch_class as usize];
        match self.mode {
            Mode::Major => root.to_string(),
            Mode::Minor => format!("{root}m"),
        }
    }

    #[must_use]
    pub fn camelot(&self) -> Camelot {
        Camelot::from_key(*self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ring {
    /// Minor keys.
    A,
    /// Major keys.
    B,
}

/// A Camelot wheel position: a number in `1..=12` plus a ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Camelot {
    pub number: u8,
    pub ring: Ring,
}

impl Camelot {
    #[must_use]
    pub fn from_key(key: Key) -> Self {
        match key.mode {
            Mode::Major => Self {
                number: MAJOR_NUMBER_FOR_PC[key.pitch_class as usize],
                ring: Ring::B,
            },
            Mode::Minor => {
                let relative_major_pc = (key.pitch_class + 3) % 12;
                Self {
                    number: MAJOR_NUMBER_FOR_PC[relative_major_pc as usize],
                    ring: Ring::A,
                }
            }
        }
    }

    /// The key this Camelot position denotes.
    #[must_use]
    pub fn key(&self) -> Key {
        let major_pc = PC_FOR_MAJOR_NUMBER[(self.number - 1) as usize];
        match self.ring {
            Ring::B => Key::new(major_pc, Mode::Major),
            Ring::A => Key::new((major_pc + 9) % 12, Mode::Minor),
        }
    }

    /// Parse a label like `"8B"` or `"12A"`.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        let (digits, ring) = label.split_at(label.len().checked_sub(1)?);
        let number: u8 = digits.parse().ok()?;
        if !(1..=12).contains(&number) {
            return None;
        }
        let ring = match ring {
            "A" | "a" => Ring::A,
            "B" | "b" => Ring::B,
            _ => return None,
        };
        Some(Self { number, ring })
    }

    /// Canonical position on the 24-element Camelot ring used for distance
    /// scoring: numbers interleave `1B, 1A, 2B, 2A, ..., 12B, 12A`, so a
    /// relative major/minor pair sits one step apart, same as a fifths-step
    /// to the neighboring number.
    #[must_use]
    const fn ring_position(&self) -> u8 {
        let ring_offset = match self.ring {
            Ring::B => 0,
            Ring::A => 1,
        };
        (self.number - 1) * 2 + ring_offset
    }

    /// Minimum clockwise/counter-clockwise distance on the 24-element ring.
    #[must_use]
    pub const fn ring_distance(&self, other: &Self) -> u8 {
        let a = self.ring_position() as i32;
        let b = other.ring_position() as i32;
        let diff = (a - b).rem_euclid(24);
        if diff > 12 { 24 - diff as u8 } else { diff as u8 }
    }

    /// All 24 Camelot positions, in a stable canonical order.
    #[must_use]
    pub fn all() -> Vec<Self> {
        (1..=12)
            .flat_map(|number| [Ring::B, Ring::A].map(|ring| Self { number, ring }))
            .collect()
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Camelot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ring = match self.ring {
            Ring::A => 'A',
            Ring::B => 'B',
        };
        write!(f, "{}{}", self.number, ring)
    }
}

impl Serialize for Camelot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for Camelot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid camelot label: {s}")))
    }
}

/// The true semitone shift from `source` to `target`, folded into `(-6, 6]`.
///
/// This resolves the planner's key-shift arithmetic against pitch classes
/// rather than Camelot ring position: the ring only encodes harmonic
/// adjacency (steps of a fifth between same-letter neighbors), so taking a
/// modulo-12 difference of ring positions does not yield a semitone count.
#[must_use]
pub fn semitone_shift(source: &Camelot, target: &Camelot) -> i32 {
    let source_pc = i32::from(source.key().pitch_class);
    let target_pc = i32::from(target.key().pitch_class);
    let diff = (target_pc - source_pc).rem_euclid(12);
    if diff > 6 { diff - 12 } else { diff }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, Mode::Major, "8B")]
    #[case(1, Mode::Major, "3B")]
    #[case(2, Mode::Major, "10B")]
    #[case(3, Mode::Major, "5B")]
    #[case(4, Mode::Major, "12B")]
    #[case(5, Mode::Major, "7B")]
    #[case(6, Mode::Major, "2B")]
    #[case(7, Mode::Major, "9B")]
    #[case(8, Mode::Major, "4B")]
    #[case(9, Mode::Major, "11B")]
    #[case(10, Mode::Major, "6B")]
    #[case(11, Mode::Major, "1B")]
    fn major_keys_map_to_the_spec_table(#[case] pc: u8, #[case] mode: Mode, #[case] expected: &str) {
        let camelot = Key::new(pc, mode).camelot();
        assert_eq!(camelot.label(), expected);
    }

    #[test]
    fn a_minor_is_the_relative_minor_of_c_major() {
        let a_minor = Key::new(9, Mode::Minor).camelot();
        let c_major = Key::new(0, Mode::Major).camelot();
        assert_eq!(a_minor.label(), "8A");
        assert_eq!(c_major.label(), "8B");
    }

    #[test]
    fn camelot_key_round_trips() {
        for camelot in Camelot::all() {
            let key = camelot.key();
            assert_eq!(key.camelot(), camelot, "{camelot} -> {key:?} -> {:?}", key.camelot());
        }
    }

    #[test]
    fn parse_round_trips_label() {
        for camelot in Camelot::all() {
            let label = camelot.label();
            assert_eq!(Camelot::parse(&label), Some(camelot));
        }
    }

    #[test]
    fn ring_distance_is_symmetric_and_zero_for_self() {
        for a in Camelot::all() {
            for b in Camelot::all() {
                assert_eq!(a.ring_distance(&b), b.ring_distance(&a));
            }
            assert_eq!(a.ring_distance(&a), 0);
        }
    }

    #[test]
    fn semitone_shift_is_zero_for_identical_key() {
        let c = Key::new(0, Mode::Major).camelot();
        assert_eq!(semitone_shift(&c, &c), 0);
    }

    #[test]
    fn semitone_shift_matches_pitch_class_distance() {
        // C major (8B) -> D major (10B) is two semitones up.
        let c = Key::new(0, Mode::Major).camelot();
        let d = Key::new(2, Mode::Major).camelot();
        assert_eq!(semitone_shift(&c, &d), 2);
        assert_eq!(semitone_shift(&d, &c), -2);
    }

    #[test]
    fn semitone_shift_is_bounded() {
        for a in Camelot::all() {
            for b in Camelot::all() {
                let shift = semitone_shift(&a, &b);
                assert!((-6..=6).contains(&shift));
            }
        }
    }
}
