mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use photoshelf_core::settings::Settings;
use photoshelf_core::{Session, Shelf};
use tracing_subscriber::EnvFilter;

/// Photoshelf: browse, search and curate a tagged photo library
#[derive(Parser)]
#[command(name = "photoshelf", version, about)]
struct Cli {
    /// Settings file (TOML, JSON or YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Library directory, overriding the settings file
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    /// User whose collection to show, overriding the settings file
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List photos, most recent first, optionally filtered by a search query
    Ls { query: Option<String> },
    /// Show photos grouped by month
    Timeline { query: Option<String> },
    /// Show the most common locations
    Locations { query: Option<String> },
    /// Show the most used cameras
    Cameras { query: Option<String> },
    /// Show the most common tags
    Tags { query: Option<String> },
    /// Suggest tags whose names contain the given text
    Suggest { partial: String },
    /// Read queries from stdin and list matches as they settle
    Browse,
    /// Add a photo to the library
    Upload {
        /// Path to the image file
        file: PathBuf,
        /// Caption stored as the photo's description
        #[arg(long)]
        caption: Option<String>,
    },
    /// Remove a photo by id (a unique prefix is enough)
    Rm { id: String },
    /// Show a summary of the collection
    Status,
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(library) = cli.library {
        settings.library_dir = library;
    }
    if let Some(user) = cli.user {
        settings.user = user;
    }
    init_tracing(&settings.log_level);

    let shelf = Shelf::open(&settings);
    let session = Session::new(settings.user.clone());
    shelf.store().load(&session).await?;

    match cli.command {
        Commands::Ls { query } => commands::ls::run(&shelf, query_text(&query)),
        Commands::Timeline { query } => commands::timeline::run(&shelf, query_text(&query)),
        Commands::Locations { query } => commands::facets::locations(&shelf, query_text(&query)),
        Commands::Cameras { query } => commands::facets::cameras(&shelf, query_text(&query)),
        Commands::Tags { query } => commands::facets::tags(&shelf, query_text(&query)),
        Commands::Suggest { partial } => commands::facets::suggest(&shelf, &partial),
        Commands::Browse => commands::browse::run(&shelf).await?,
        Commands::Upload { file, caption } => {
            commands::upload::run(&shelf, &session, &file, caption).await?
        }
        Commands::Rm { id } => commands::rm::run(&shelf, &session, &id).await?,
        Commands::Status => commands::status::run(&shelf, &settings),
    }

    Ok(())
}

fn query_text(query: &Option<String>) -> &str {
    query.as_deref().unwrap_or("")
}
