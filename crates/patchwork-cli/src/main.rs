//! Patchwork CLI - render and play modular patch scripts.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "patchwork")]
#[command(author, version, about = "Modular audio graph renderer", long_about = None)]
struct Cli {
    /// Log debug diagnostics (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a script to a WAV file
    Render(commands::render::RenderArgs),

    /// Play a script on an audio device until Ctrl+C
    Play(commands::play::PlayArgs),

    /// List registered modules, voices and wave tables
    Modules(commands::modules::ModulesArgs),

    /// List audio output devices
    Devices,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Play(args) => commands::play::run(args),
        Commands::Modules(args) => commands::modules::run(args),
        Commands::Devices => commands::devices::run(),
    }
}
