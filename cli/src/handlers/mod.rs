pub mod config_cmd;
pub mod printing;
pub mod render_cmd;

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render a mashup from two tracks' separated stems
    Render(RenderArgs),
    /// Inspect the resolved configuration
    Config {
        #[clap(subcommand)]
        command: ConfigCommand,
    },
}

impl Command {
    pub async fn handle(&self, settings: &mashup_core::config::Settings) -> i32 {
        match self {
            Self::Render(args) => args.handle(settings).await,
            Self::Config { command } => command.handle(settings),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the path to the config file, creating it with defaults if it doesn't exist
    Path,
    /// Print the resolved settings (file + environment + flags)
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecipeArg {
    #[value(name = "a-over-b")]
    AoverB,
    #[value(name = "b-over-a")]
    BoverA,
    #[value(name = "hybrid-drums")]
    HybridDrums,
}

impl From<RecipeArg> for mashup_core::domain::Recipe {
    fn from(recipe: RecipeArg) -> Self {
        match recipe {
            RecipeArg::AoverB => Self::AoverB,
            RecipeArg::BoverA => Self::BoverA,
            RecipeArg::HybridDrums => Self::HybridDrums,
        }
    }
}

/// Track A's four separated stems, namespaced under `--a-*` so both tracks
/// can share the same stem names without colliding.
#[derive(Debug, Args)]
pub struct TrackStemsA {
    #[clap(long = "a-vocals")]
    pub vocals: PathBuf,
    #[clap(long = "a-drums")]
    pub drums: PathBuf,
    #[clap(long = "a-bass")]
    pub bass: PathBuf,
    #[clap(long = "a-other")]
    pub other: PathBuf,
}

#[derive(Debug, Args)]
pub struct TrackStemsB {
    #[clap(long = "b-vocals")]
    pub vocals: PathBuf,
    #[clap(long = "b-drums")]
    pub drums: PathBuf,
    #[clap(long = "b-bass")]
    pub bass: PathBuf,
    #[clap(long = "b-other")]
    pub other: PathBuf,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    #[clap(flatten)]
    pub a: TrackStemsA,
    #[clap(flatten)]
    pub b: TrackStemsB,

    /// Stem-mixing recipe
    #[clap(long, value_enum, default_value = "a-over-b")]
    pub recipe: RecipeArg,

    /// Directory the rendered mashup.wav and project.json are written to
    #[clap(long, default_value = ".")]
    pub output: PathBuf,

    /// Vocals gain applied during mixing
    #[clap(long, default_value_t = 1.0)]
    pub vocals_gain: f64,
    /// Drums gain applied during mixing
    #[clap(long, default_value_t = 0.8)]
    pub drums_gain: f64,
    /// Bass gain applied during mixing
    #[clap(long, default_value_t = 0.7)]
    pub bass_gain: f64,
    /// Other-stems gain applied during mixing
    #[clap(long, default_value_t = 0.6)]
    pub other_gain: f64,
    /// Disable automatic EQ matching
    #[clap(long)]
    pub no_auto_eq: bool,
    /// Disable sidechain ducking of instrumentals under vocals
    #[clap(long)]
    pub no_sidechain_ducking: bool,
    /// Disable de-essing of the vocals stem
    #[clap(long)]
    pub no_de_esser: bool,
}

impl RenderArgs {
    #[must_use]
    pub fn mix_params(&self) -> mashup_core::domain::MixParams {
        mashup_core::domain::MixParams {
            vocals_gain: self.vocals_gain,
            drums_gain: self.drums_gain,
            bass_gain: self.bass_gain,
            other_gain: self.other_gain,
            auto_eq: !self.no_auto_eq,
            sidechain_ducking: !self.no_sidechain_ducking,
            de_esser: !self.no_de_esser,
        }
    }
}
