//! flowdoc CLI - action tree to static documentation site.
//!
//! Provides commands for:
//! - `generate` (default): Build, publish and index the site
//! - `index`: Rebuild the sitemap and search index of a published site

mod commands;
mod error;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{GenerateArgs, IndexArgs};
use output::Output;

/// flowdoc - action tree to static documentation site.
#[derive(Parser)]
#[command(name = "flowdoc", version, about)]
struct Cli {
    /// Path to configuration file (default: auto-discover flowdoc.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate, publish and index the site.
    Generate(GenerateArgs),
    /// Rebuild sitemap and search index of the publish directory.
    Index(IndexArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command.unwrap_or_else(|| Commands::Generate(GenerateArgs::default())) {
        Commands::Generate(args) => args.execute(config, &output),
        Commands::Index(args) => args.execute(config, &output),
    };

    if let Err(err) = result {
        if let Some((title, diagnostic)) = err.diagnostic() {
            output.diagnostic(title, diagnostic);
        }
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
