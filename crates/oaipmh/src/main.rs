//! oaipmh CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "oaipmh")]
#[command(version)]
#[command(about = "Template-driven OAI-PMH metadata engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the metadata of one record
    Render {
        /// Service configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Metadata prefix of the format to render
        #[arg(short, long)]
        format: String,

        /// RDF file (Turtle, N-Triples, RDF/XML, ...) with the repository data
        #[arg(short, long)]
        data: PathBuf,

        /// URI of the resource to render
        #[arg(short, long)]
        subject: String,

        /// OAI-PMH identifier of the record (defaults to the subject)
        #[arg(long)]
        oai_id: Option<String>,

        /// Write output to FILE instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the document on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Compile the templates of the configured formats
    Check {
        /// Service configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Only check this format
        #[arg(short, long)]
        format: Option<String>,
    },

    /// List the configured metadata formats
    Formats {
        /// Service configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oaipmh=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            config,
            format,
            data,
            subject,
            oai_id,
            output,
            compact,
        } => commands::render::execute(commands::render::RenderArgs {
            config,
            format,
            data,
            subject,
            oai_id,
            output,
            compact,
        }),
        Commands::Check { config, format } => {
            commands::check::execute(commands::check::CheckArgs { config, format })
        }
        Commands::Formats { config, json } => {
            commands::formats::execute(commands::formats::FormatsArgs { config, json })
        }
    }
}
