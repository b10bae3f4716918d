//! Patchwatch CLI - watch Pure Data patches and splice them into live channels.

mod commands;
mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "patchwatch")]
#[command(author, version, about = "Live Pure Data patch router", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List patches in the library
    Patches(commands::patches::PatchesArgs),

    /// Show the objects, connections and GUI elements of a patch file
    Inspect(commands::inspect::InspectArgs),

    /// List known GUI widget schemas
    Widgets(commands::widgets::WidgetsArgs),

    /// Show or create the configuration file
    Config(commands::config::ConfigArgs),

    /// Start the engine and route patches interactively
    Run(commands::run::RunArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Patches(args) => commands::patches::run(args, config),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Widgets(args) => commands::widgets::run(args),
        Commands::Config(args) => commands::config::run(args, config),
        Commands::Run(args) => commands::run::run(args, config),
    }
}
