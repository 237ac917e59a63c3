//! The plan value object (data model §3).

use serde::{Deserialize, Serialize};

use super::{camelot::Camelot, recipe::Recipe};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionPair {
    #[serde(rename = "sectionIndexA")]
    pub section_index_a: usize,
    #[serde(rename = "sectionIndexB")]
    pub section_index_b: usize,
    pub confidence: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StretchQuality {
    High,
    Medium,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StretchMap {
    #[serde(rename = "targetBpm")]
    pub target_bpm: f64,
    #[serde(rename = "stretchA")]
    pub stretch_a: f64,
    #[serde(rename = "stretchB")]
    pub stretch_b: f64,
    pub quality: StretchQuality,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Compatibility {
    #[serde(rename = "keyScore")]
    pub key_score: u8,
    #[serde(rename = "tempoScore")]
    pub tempo_score: u8,
    #[serde(rename = "structureScore")]
    pub structure_score: u8,
    pub overall: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub recipe: Recipe,
    #[serde(rename = "targetKey")]
    pub target_key: Camelot,
    #[serde(rename = "keyShiftA")]
    pub shift_a: i32,
    #[serde(rename = "keyShiftB")]
    pub shift_b: i32,
    #[serde(rename = "stretchMap")]
    pub stretch: StretchMap,
    #[serde(rename = "sectionPairs")]
    pub section_pairs: Vec<SectionPair>,
    #[serde(rename = "qualityHints")]
    pub quality_hints: Vec<String>,
    pub compatibility: Compatibility,
}
