use albumshelf_catalog_server::catalog_store::{
    seed_default_albums, CatalogStore, SqliteCatalogStore,
};
use albumshelf_catalog_server::config::{AppConfig, CliConfig, FileConfig};
use albumshelf_catalog_server::metadata::{LastFmClient, MetadataProvider};
use albumshelf_catalog_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use albumshelf_catalog_server::user::{SqliteUserStore, TokenSigner};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding catalog.db and user.db.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Optional TOML config file. Its values override command line values.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Secret used to sign bearer tokens. A random one is generated if missing.
    #[clap(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Lifetime of issued tokens, in days.
    #[clap(long)]
    pub token_ttl_days: Option<u64>,

    /// Last.fm API key, enables album metadata lookup.
    #[clap(long, env = "LASTFM_API_KEY", hide_env_values = true)]
    pub lastfm_api_key: Option<String>,

    /// Insert the default albums at startup if missing.
    #[clap(long)]
    pub seed: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            frontend_dir_path: self.frontend_dir_path.clone(),
            jwt_secret: self.jwt_secret.clone(),
            token_ttl_days: self.token_ttl_days,
            lastfm_api_key: self.lastfm_api_key.clone(),
            seed: self.seed,
        }
    }
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

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;
    info!("Resolved config: {:?}", config);

    info!("Opening catalog database at {:?}...", config.catalog_db_path());
    let catalog_store = Arc::new(SqliteCatalogStore::new(config.catalog_db_path())?);
    if config.seed {
        seed_default_albums(catalog_store.as_ref())?;
    }
    info!("Catalog has {} albums", catalog_store.get_albums_count()?);

    info!("Opening user database at {:?}...", config.user_db_path());
    let user_store = Arc::new(SqliteUserStore::new(config.user_db_path())?);

    let token_signer = match &config.auth.jwt_secret {
        Some(secret) => TokenSigner::new(secret.as_bytes(), config.auth.token_ttl),
        None => {
            warn!("No JWT secret configured, issued tokens will not survive a restart");
            TokenSigner::with_random_secret(config.auth.token_ttl)
        }
    };

    let metadata_provider: Option<Arc<dyn MetadataProvider>> = match &config.lastfm {
        Some(lastfm) => Some(Arc::new(LastFmClient::with_base_url(
            &lastfm.api_key,
            &lastfm.base_url,
        )?)),
        None => {
            info!("No Last.fm API key configured, metadata lookup is disabled");
            None
        }
    };

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
        frontend_dir_path: config.frontend_dir_path.clone(),
    };

    info!("Ready to serve at port {}!", config.port);
    run_server(
        server_config,
        catalog_store,
        user_store,
        token_signer,
        metadata_provider,
    )
    .await
}
