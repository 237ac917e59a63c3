//! Mix parameters (data model §3).

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MixParams {
    #[serde(default = "default_vocals_gain")]
    pub vocals_gain: f64,
    #[serde(default = "default_drums_gain")]
    pub drums_gain: f64,
    #[serde(default = "default_bass_gain")]
    pub bass_gain: f64,
    #[serde(default = "default_other_gain")]
    pub other_gain: f64,
    #[serde(default = "default_true")]
    pub auto_eq: bool,
    #[serde(default = "default_true")]
    pub sidechain_ducking: bool,
    #[serde(default = "default_true")]
    pub de_esser: bool,
}

const fn default_vocals_gain() -> f64 {
    1.0
}
const fn default_drums_gain() -> f64 {
    0.8
}
const fn default_bass_gain() -> f64 {
    0.7
}
const fn default_other_gain() -> f64 {
    0.6
}
const fn default_true() -> bool {
    true
}

impl Default for MixParams {
    fn default() -> Self {
        Self {
            vocals_gain: default_vocals_gain(),
            drums_gain: default_drums_gain(),
            bass_gain: default_bass_gain(),
            other_gain: default_other_gain(),
            auto_eq: true,
            sidechain_ducking: true,
            de_esser: true,
        }
    }
}
