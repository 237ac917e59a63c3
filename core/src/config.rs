//! Layered configuration: a TOML file overridden by `MASHUP_`-prefixed environment variables,
//! overridden in turn by CLI flags.

use std::{num::NonZeroUsize, path::PathBuf, str::FromStr};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub static DEFAULT_CONFIG: &str = include_str!("../Mashup.toml");

#[derive(Clone, Debug, Deserialize, Default, PartialEq)]
pub struct Settings {
    /// Render/mastering parameters.
    #[serde(default)]
    pub render: RenderSettings,
    /// Orchestrator/worker-pool parameters.
    #[serde(default)]
    pub daemon: DaemonSettings,
    /// Passthrough settings for the external stem-separation model.
    #[serde(default)]
    pub separation: SeparationSettings,
}

impl Settings {
    /// Load settings from a config file and the environment.
    ///
    /// The environment variables are prefixed with `MASHUP_`, with `__` as the
    /// nested-field separator (e.g. `MASHUP_RENDER__TARGET_LUFS`).
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is missing or malformed.
    pub fn init(config: PathBuf, log_level: Option<log::LevelFilter>) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from(config))
            .add_source(Environment::with_prefix("MASHUP").separator("__"))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;

        if let Some(log_level) = log_level {
            settings.daemon.log_level = log_level;
        }

        Ok(settings)
    }

    /// Get the (default) path to the config file, creating it with the default
    /// config if it does not already exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory could not be found, or
    /// if the file was missing and could not be created.
    pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
        let config_dir = crate::get_config_dir().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string())
        })?;
        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)?;
        }
        let config_file = config_dir.join("Mashup.toml");
        if !config_file.exists() {
            std::fs::write(&config_file, DEFAULT_CONFIG)?;
        }
        Ok(config_file)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct RenderSettings {
    /// Canonical internal sample rate, in Hz. Default 44100.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Target integrated loudness, in LUFS. Default -14.0.
    #[serde(default = "default_target_lufs")]
    pub target_lufs: f64,
    /// Headroom below full scale applied after loudness normalization, in dB. Default 1.0.
    #[serde(default = "default_headroom_db")]
    pub headroom_db: f64,
}

const fn default_sample_rate() -> u32 {
    44100
}

const fn default_target_lufs() -> f64 {
    -14.0
}

const fn default_headroom_db() -> f64 {
    1.0
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            target_lufs: default_target_lufs(),
            headroom_db: default_headroom_db(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DaemonSettings {
    /// Number of jobs the orchestrator runs concurrently. Default 4.
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: NonZeroUsize,
    /// Hard timeout, in seconds, for external I/O (stem fetch/artifact upload). Default 60.
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,
    /// Logging verbosity. Default "info".
    #[serde(default = "default_log_level", deserialize_with = "de_log_level")]
    pub log_level: log::LevelFilter,
}

fn default_worker_pool_size() -> NonZeroUsize {
    NonZeroUsize::new(4).unwrap()
}

const fn default_io_timeout_secs() -> u64 {
    60
}

const fn default_log_level() -> log::LevelFilter {
    log::LevelFilter::Info
}

fn de_log_level<'de, D>(deserializer: D) -> Result<log::LevelFilter, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(log::LevelFilter::from_str(&s).unwrap_or_else(|_| default_log_level()))
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            worker_pool_size: default_worker_pool_size(),
            io_timeout_secs: default_io_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Default, PartialEq, Eq)]
pub struct SeparationSettings {
    /// Device hint passed through to the (external) separation model.
    #[serde(default)]
    pub demucs_device: Option<String>,
}
