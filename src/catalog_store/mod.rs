mod models;
mod schema;
mod seed;
mod store;
mod trait_def;

pub use models::*;
pub use seed::{seed_default_albums, DEFAULT_ALBUMS};
pub use store::SqliteCatalogStore;
pub use trait_def::CatalogStore;
