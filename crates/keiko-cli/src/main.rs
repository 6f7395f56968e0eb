mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{catalog::CatalogSubcommand, config::ConfigSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "keiko",
    about = "Track practice, experience and achievements of dojo practitioners",
    version,
    propagate_version = true
)]
struct Cli {
    /// Data directory (default: auto-detect from .keiko/)
    #[arg(long, global = true, env = "KEIKO_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a keiko data directory
    Init {
        /// Dojo name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
        /// Also write the built-in catalog to .keiko/catalog.yaml for editing
        #[arg(long)]
        write_catalog: bool,
    },

    /// Record a challenge completion
    Complete {
        practitioner: String,
        challenge: String,
        /// Date the completion counts for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },

    /// Show a practitioner's progress
    Snapshot { practitioner: String },

    /// List a practitioner's completions, oldest first
    History { practitioner: String },

    /// Rank practitioners by total XP
    Leaderboard {
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Inspect and validate the catalog
    Catalog {
        #[command(subcommand)]
        subcommand: CatalogSubcommand,
    },

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Start the HTTP API server
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init {
            name,
            write_catalog,
        } => cmd::init::run(&root, name.as_deref(), write_catalog),
        Commands::Complete {
            practitioner,
            challenge,
            date,
        } => cmd::complete::run(&root, &practitioner, &challenge, date, cli.json),
        Commands::Snapshot { practitioner } => cmd::snapshot::run(&root, &practitioner, cli.json),
        Commands::History { practitioner } => cmd::history::run(&root, &practitioner, cli.json),
        Commands::Leaderboard { limit } => cmd::leaderboard::run(&root, limit, cli.json),
        Commands::Catalog { subcommand } => cmd::catalog::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Serve { port } => cmd::serve::run(&root, port),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
