//! Pulso CLI - offline driver for the hardware sync engine.

mod commands;
mod profile;
mod timeline;
mod wav;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pulso")]
#[command(author, version, about = "Hardware sync pulse renderer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a simulated transport session to a WAV pulse train
    Render(commands::render::RenderArgs),

    /// Show the constants derived from a rate, tempo and meter
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Info(args) => commands::info::run(args),
    }
}
