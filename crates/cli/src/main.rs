mod commands;

use std::path::PathBuf;

use albumtree_core::config::Settings;
use albumtree_core::Gallery;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// albumtree: nested album hierarchy for a photo catalog
#[derive(Parser)]
#[command(name = "albumtree", version, about)]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the catalog database (overrides the settings file)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, move, delete or inspect albums
    Album {
        #[command(subcommand)]
        action: AlbumAction,
    },
    /// Print the whole album tree
    Tree {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add, remove or list photos
    Photo {
        #[command(subcommand)]
        action: PhotoAction,
    },
    /// Report structural problems in the album tree
    Check,
    /// Rebuild album bounds from parent links
    Fix,
}

#[derive(Subcommand)]
enum AlbumAction {
    /// Create an album as the last child of --parent, or as a new root
    Add {
        title: String,
        #[arg(long)]
        parent: Option<i64>,
    },
    /// Move an album and its sub-albums. Without --parent it becomes a root.
    Mv {
        id: i64,
        #[arg(long)]
        parent: Option<i64>,
    },
    /// Delete an album, its sub-albums and their photos
    Rm { id: i64 },
    /// Show path, photo count and taken-at range of an album
    Show {
        id: i64,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PhotoAction {
    /// Add a photo to an album
    Add {
        album: i64,
        title: String,
        /// Capture time, RFC 3339 (e.g. 2024-05-01T10:00:00Z)
        #[arg(long, value_parser = parse_taken_at)]
        taken_at: Option<DateTime<Utc>>,
    },
    /// Remove a photo
    Rm { id: i64 },
    /// List photos of an album
    Ls {
        album: i64,
        /// Include photos of every sub-album
        #[arg(long)]
        recursive: bool,
    },
}

fn parse_taken_at(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp: {e}"))
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("reading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(catalog) = &cli.catalog {
        settings.catalog_path = catalog.clone();
    }
    Ok(settings)
}

fn init_logging(settings: &Settings) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&settings.log_filter))
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    init_logging(&settings);
    debug!(
        config = ?cli.config,
        catalog = %settings.catalog_path.display(),
        "loaded settings"
    );

    let mut gallery = Gallery::open(settings)?;

    match cli.command {
        Commands::Album { action } => match action {
            AlbumAction::Add { title, parent } => commands::album::add(&mut gallery, parent, &title)?,
            AlbumAction::Mv { id, parent } => commands::album::mv(&mut gallery, id, parent)?,
            AlbumAction::Rm { id } => commands::album::rm(&mut gallery, id)?,
            AlbumAction::Show { id, json } => commands::album::show(&gallery, id, json)?,
        },
        Commands::Tree { json } => commands::tree::run(&gallery, json)?,
        Commands::Photo { action } => match action {
            PhotoAction::Add {
                album,
                title,
                taken_at,
            } => commands::photo::add(&gallery, album, &title, taken_at)?,
            PhotoAction::Rm { id } => commands::photo::rm(&gallery, id)?,
            PhotoAction::Ls { album, recursive } => commands::photo::ls(&gallery, album, recursive)?,
        },
        Commands::Check => commands::maintenance::check(&gallery)?,
        Commands::Fix => commands::maintenance::fix(&mut gallery)?,
    }

    Ok(())
}
