//! Archivist CLI - command-line interface for the local mirror.

mod commands;
mod config;
mod progress;
mod shutdown;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "archivist")]
#[command(version)]
#[command(about = "A local searchable mirror of your issue tracker and wiki")]
#[command(
    long_about = "Archivist mirrors tracked issues and wiki pages from a remote work \
management service into a local SQLite store, keeps the mirror fresh with \
incremental syncs, and serves search and display from the local copy."
)]
#[command(after_long_help = r#"EXAMPLES
    Sync the issues of two projects:
        $ archivist sync issues OPS NET

    Full resync of a wiki space, deleting pages gone from the remote:
        $ archivist sync pages DOCS --full

    Search everything mirrored so far:
        $ archivist search "pager outage"

    Show one mirrored item:
        $ archivist show issue OPS-41

    Assign a batch of issues:
        $ archivist assign jsmith OPS-1 OPS-2 OPS-3

CONFIGURATION
    Archivist reads configuration from:
      1. ~/.config/archivist/config.toml (or $XDG_CONFIG_HOME/archivist/config.toml)
      2. ./archivist.toml in the current directory
      3. Environment variables (ARCHIVIST_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    ARCHIVIST_DATABASE_URL    Database connection string (default: ~/.local/state/archivist/archivist.db)
    ARCHIVIST_REMOTE_URL      Base URL of the tracker/wiki service
    ARCHIVIST_REMOTE_TOKEN    Bearer token for the service
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Mirror remote scopes into the local store
    Sync {
        #[command(subcommand)]
        target: SyncTarget,
    },
    /// Full-text search over mirrored titles and bodies
    Search {
        /// FTS5 match expression, e.g. `pager NOT test`
        query: String,
        /// Maximum number of hits
        #[arg(short, long, default_value_t = 20)]
        limit: u64,
    },
    /// Show one mirrored item
    Show {
        /// Item kind: `issue` or `page`
        kind: String,
        /// Remote identifier (issue key or page id)
        remote_id: String,
    },
    /// Assign a set of issues to one person
    Assign {
        /// Assignee login
        assignee: String,
        /// Issue keys to assign
        #[arg(required = true)]
        issues: Vec<String>,
        /// Maximum concurrent assignment calls
        #[arg(short, long)]
        concurrency: Option<usize>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[derive(Subcommand)]
enum SyncTarget {
    /// Sync tracked issues, one scope per project key
    Issues {
        /// Project keys to sync
        #[arg(required = true)]
        projects: Vec<String>,
        #[command(flatten)]
        options: CommonSyncOptions,
    },
    /// Sync wiki pages, one scope per space key
    Pages {
        /// Space keys to sync
        #[arg(required = true)]
        spaces: Vec<String>,
        #[command(flatten)]
        options: CommonSyncOptions,
    },
}

/// Sync flags shared by both targets.
#[derive(Debug, Clone, clap::Args)]
struct CommonSyncOptions {
    /// Full resync: also delete mirrored items no longer present remotely
    #[arg(long)]
    full: bool,
    /// Items requested per page
    #[arg(long)]
    page_size: Option<u64>,
    /// Pages fetched ahead of processing
    #[arg(long)]
    prefetch: Option<usize>,
    /// Scopes synced concurrently
    #[arg(long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::Config::load()?;

    match cli.command {
        Commands::Migrate { action } => commands::migrate::run(&config, action).await,
        Commands::Sync { target } => {
            shutdown::setup_shutdown_handler();
            match target {
                SyncTarget::Issues { projects, options } => {
                    commands::sync::run_issues(&config, projects, options).await
                }
                SyncTarget::Pages { spaces, options } => {
                    commands::sync::run_pages(&config, spaces, options).await
                }
            }
        }
        Commands::Search { query, limit } => commands::search::run(&config, &query, limit).await,
        Commands::Show { kind, remote_id } => {
            commands::show::run(&config, &kind, &remote_id).await
        }
        Commands::Assign {
            assignee,
            issues,
            concurrency,
        } => commands::assign::run(&config, &assignee, issues, concurrency).await,
        Commands::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}
