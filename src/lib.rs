//! Albumshelf catalog server library
//!
//! Album catalog with per-user likes, token authentication and the client-side
//! cache that keeps liked state consistent across views and sessions.

pub mod catalog_store;
pub mod client;
pub mod config;
pub mod library;
pub mod metadata;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

pub use catalog_store::{CatalogStore, SqliteCatalogStore};
pub use server::{make_app, run_server, RequestsLoggingLevel};
pub use user::{SqliteUserStore, UserStore};
