//! Initial catalog contents.

use super::models::NewAlbum;
use super::trait_def::CatalogStore;
use anyhow::Result;
use tracing::info;

/// (title, artist, genre, release year)
pub const DEFAULT_ALBUMS: &[(&str, &str, &str, i32)] = &[
    ("Abbey Road", "The Beatles", "Rock", 1969),
    ("Thriller", "Michael Jackson", "Pop", 1982),
    ("Dark Side of the Moon", "Pink Floyd", "Progressive Rock", 1973),
    ("Back to Black", "Amy Winehouse", "Soul", 2006),
    ("Rumours", "Fleetwood Mac", "Rock", 1977),
    ("Ready to Die", "The Notorious B.I.G.", "Hip-Hop", 1994),
    ("Confessions", "Usher", "R&B", 2004),
];

/// Inserts the default albums that are not in the catalog yet.
/// Returns how many were created.
pub fn seed_default_albums(store: &dyn CatalogStore) -> Result<usize> {
    let mut created_count = 0;
    for (title, artist, genre, release_year) in DEFAULT_ALBUMS {
        let (_, created) = store.add_album(NewAlbum {
            title: title.to_string(),
            artist: artist.to_string(),
            genre: genre.to_string(),
            release_year: *release_year,
            album_cover: String::new(),
            large_album_cover: String::new(),
            album_url: String::new(),
            tracks: vec![],
        })?;
        if created {
            created_count += 1;
        }
    }
    info!(
        "Seeded {} of {} default albums",
        created_count,
        DEFAULT_ALBUMS.len()
    );
    Ok(created_count)
}
