//! Maintenance commands for the catalog and user databases.

use albumshelf_catalog_server::catalog_store::{
    seed_default_albums, AlbumFilter, CatalogStore, SqliteCatalogStore,
};
use albumshelf_catalog_server::metadata::{
    populate_catalog, LastFmClient, LASTFM_API_BASE, POPULATE_DELAY,
};
use albumshelf_catalog_server::user::{SqliteUserStore, TokenSigner, UserManager, DEFAULT_TOKEN_TTL};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding catalog.db and user.db.
    #[clap(long, default_value = ".")]
    pub db_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inserts the default albums that are missing.
    Seed,
    /// Fetches covers, links and tracks of every album from Last.fm.
    Populate {
        #[clap(long, env = "LASTFM_API_KEY", hide_env_values = true)]
        lastfm_api_key: String,
        #[clap(long, default_value = LASTFM_API_BASE)]
        lastfm_base_url: String,
    },
    /// Creates a user with password credentials.
    AddUser {
        email: String,
        password: String,
        #[clap(long)]
        name: Option<String>,
    },
    /// Prints the catalog.
    ListAlbums {
        #[clap(long)]
        genre: Option<String>,
        #[clap(long)]
        artist: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let catalog_store = Arc::new(SqliteCatalogStore::new(
        cli_args.db_dir.join("catalog.db"),
    )?);

    match cli_args.command {
        Command::Seed => {
            let created = seed_default_albums(catalog_store.as_ref())?;
            println!("Created {} albums", created);
        }
        Command::Populate {
            lastfm_api_key,
            lastfm_base_url,
        } => {
            let client = LastFmClient::with_base_url(&lastfm_api_key, &lastfm_base_url)?;
            let report = populate_catalog(catalog_store, &client, POPULATE_DELAY).await?;
            println!(
                "Updated {}, not found {}, failed {}",
                report.updated, report.not_found, report.failed
            );
        }
        Command::AddUser {
            email,
            password,
            name,
        } => {
            let user_store = Arc::new(SqliteUserStore::new(cli_args.db_dir.join("user.db"))?);
            // Only the stored credentials matter here, the token is discarded.
            let user_manager = UserManager::new(
                catalog_store,
                user_store,
                TokenSigner::with_random_secret(DEFAULT_TOKEN_TTL),
            );
            let payload = user_manager
                .register(&email, &password, name.as_deref())
                .with_context(|| format!("Could not create user {}", email))?;
            info!("Created user {}", payload.user.id);
            println!("Created user {} ({})", payload.user.id, payload.user.email);
        }
        Command::ListAlbums { genre, artist } => {
            let filter = AlbumFilter {
                genre,
                artist,
                ..Default::default()
            };
            for album in catalog_store.list_albums(&filter, None)? {
                println!(
                    "{:>4}  {} - {} ({}, {})",
                    album.id, album.artist, album.title, album.genre, album.release_year
                );
            }
        }
    }
    Ok(())
}
