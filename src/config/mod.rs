mod file_config;

pub use file_config::{AuthConfig, FileConfig, LastFmConfig};

use crate::metadata::LASTFM_API_BASE;
use crate::server::RequestsLoggingLevel;
use crate::user::DEFAULT_TOKEN_TTL;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub jwt_secret: Option<String>,
    pub token_ttl_days: Option<u64>,
    pub lastfm_api_key: Option<String>,
    pub seed: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    /// Seed the default albums at startup.
    pub seed: bool,
    pub auth: AuthSettings,
    /// None disables the metadata lookup endpoint.
    pub lastfm: Option<LastFmSettings>,
}

#[derive(Clone)]
pub struct AuthSettings {
    /// None means a random secret per process.
    pub jwt_secret: Option<String>,
    pub token_ttl: Duration,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

#[derive(Clone)]
pub struct LastFmSettings {
    pub api_key: String,
    pub base_url: String,
}

impl std::fmt::Debug for LastFmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LastFmSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());
        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());
        let seed = file.seed.unwrap_or(cli.seed);

        let auth_file = file.auth.unwrap_or_default();
        let jwt_secret = auth_file
            .jwt_secret
            .or_else(|| cli.jwt_secret.clone())
            .filter(|s| !s.is_empty());
        let token_ttl = match auth_file.token_ttl_days.or(cli.token_ttl_days) {
            Some(0) => bail!("token_ttl_days must be at least 1"),
            Some(days) => Duration::from_secs(days * SECONDS_PER_DAY),
            None => DEFAULT_TOKEN_TTL,
        };

        let lastfm_file = file.lastfm.unwrap_or_default();
        let lastfm = lastfm_file
            .api_key
            .or_else(|| cli.lastfm_api_key.clone())
            .filter(|s| !s.is_empty())
            .map(|api_key| LastFmSettings {
                api_key,
                base_url: lastfm_file
                    .base_url
                    .unwrap_or_else(|| LASTFM_API_BASE.to_string()),
            });

        Ok(Self {
            db_dir,
            port,
            logging_level,
            frontend_dir_path,
            seed,
            auth: AuthSettings {
                jwt_secret,
                token_ttl,
            },
            lastfm,
        })
    }

    pub fn catalog_db_path(&self) -> PathBuf {
        self.db_dir.join("catalog.db")
    }

    pub fn user_db_path(&self) -> PathBuf {
        self.db_dir.join("user.db")
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
