//! The analysis result value object (data model §3).

use serde::{Deserialize, Serialize};

use super::camelot::Camelot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionLabel {
    Verse,
    Chorus,
    Bridge,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub start: f64,
    pub end: f64,
    pub label: SectionLabel,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub duration_s: f64,
    pub bpm: f64,
    pub beats: Vec<f64>,
    pub downbeats: Vec<f64>,
    pub key: String,
    pub camelot: Camelot,
    pub sections: Vec<Section>,
    pub lufs: f64,
    /// Set when the true BS.1770 meter was unavailable and `lufs` is an RMS
    /// estimate instead (see the `LoudnessMeterUnavailable` recovery path).
    pub lufs_is_estimated: bool,
}

impl Analysis {
    /// The invariants from the testable-properties section, checked at
    /// construction time by whoever assembles the result.
    #[must_use]
    pub fn beats_are_well_formed(&self) -> bool {
        self.beats.windows(2).all(|w| w[0] < w[1])
            && self.downbeats.windows(2).all(|w| w[0] < w[1])
            && self.downbeats.iter().all(|db| self.beats.iter().any(|b| (b - db).abs() < 1e-9))
            && self.beats.first().is_none_or(|&b| b >= 0.0)
            && self.beats.last().is_none_or(|&b| b <= self.duration_s + 1e-6)
    }

    #[must_use]
    pub fn sections_partition_duration(&self) -> bool {
        if self.sections.is_empty() {
            return true;
        }
        let mut expected_start = 0.0_f64;
        for section in &self.sections {
            if section.start < section.end - 1e-9 && (section.start - expected_start).abs() < 1e-6 {
                expected_start = section.end;
            } else {
                return false;
            }
        }
        (expected_start - self.duration_s).abs() < 1e-3
    }

    /// The dominant inter-downbeat interval, in beats, and whether it reads
    /// as a consistent 4/4 grid (design notes, open question 3).
    #[must_use]
    pub fn downbeat_period_in_beats(&self) -> Option<f64> {
        if self.downbeats.len() < 2 || self.beats.len() < 2 {
            return None;
        }
        let avg_beat_period = {
            let mut diffs: Vec<f64> = self.beats.windows(2).map(|w| w[1] - w[0]).collect();
            diffs.sort_by(|a, b| a.total_cmp(b));
            diffs[diffs.len() / 2]
        };
        if avg_beat_period <= 0.0 {
            return None;
        }
        let mut periods: Vec<f64> = self
            .downbeats
            .windows(2)
            .map(|w| (w[1] - w[0]) / avg_beat_period)
            .collect();
        periods.sort_by(|a, b| a.total_cmp(b));
        periods.get(periods.len() / 2).copied()
    }

    #[must_use]
    pub fn is_consistent_with_4_4(&self) -> bool {
        self.downbeat_period_in_beats()
            .is_some_and(|period| (period - 4.0).abs() < 0.5)
    }
}
