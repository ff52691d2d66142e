//! Musigen CLI: real-time player and headless renderer.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "musigen")]
#[command(author, version, about = "Real-time sine / FM / wavetable synthesizer with feedback delay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List output devices
    Devices(commands::devices::DevicesArgs),

    /// Play through an output device, switching sources from stdin
    Play(commands::play::PlayArgs),

    /// Render blocks without a sound card and print levels
    Render(commands::render::RenderArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Play(args) => commands::play::run(args),
        Commands::Render(args) => commands::render::run(args),
    }
}
