use std::path::PathBuf;

use clap::Parser;

mod handlers;

use handlers::Command;

/// Options configurable via the CLI.
#[derive(Debug, Parser)]
#[command(name = "mashup", version = env!("CARGO_PKG_VERSION"), about)]
struct Flags {
    /// Path to the config file (created with defaults on first run if omitted)
    #[clap(long)]
    config: Option<PathBuf>,
    /// Override the configured log level
    #[clap(long)]
    log_level: Option<log::LevelFilter>,
    /// Subcommand to run
    #[clap(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let flags = Flags::parse();

    let config_path = match flags.config {
        Some(path) => path,
        None => mashup_core::config::Settings::get_config_path()?,
    };
    let settings = mashup_core::config::Settings::init(config_path, flags.log_level)?;
    mashup_core::logger::init_logger(settings.daemon.log_level);

    let exit_code = flags.command.handle(&settings).await;
    std::process::exit(exit_code);
}
