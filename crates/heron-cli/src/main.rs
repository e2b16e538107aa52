//! Heron CLI - Command-line interface for the Heron accessibility analyzer
//!
//! Static accessibility analysis for web front-end source code.

mod commands;
mod output;

use clap::Parser;
use commands::Commands;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "heron",
    author,
    version,
    about = "Static accessibility analyzer for web front-end source code",
    long_about = "Heron analyzes HTML, CSS, and JavaScript sources together.\n\n\
                  It cross-references markup with observed script behavior and styling,\n\
                  then reports accessibility issues with confidence levels that reflect\n\
                  how complete the reconstructed page model is."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("HERON_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => args.run(),
        Commands::Init(args) => args.run(),
        Commands::Explain(args) => args.run(),
    }
}
