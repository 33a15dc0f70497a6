//! SQLite-backed catalog store.

use super::models::*;
use super::schema::{
    ALBUM_TABLE_V_0, CATALOG_VERSIONED_SCHEMAS, LIKED_ALBUM_TABLE_V_0, TRACK_TABLE_V_0,
};
use super::trait_def::CatalogStore;
use crate::sqlite_persistence::open_versioned_db;
use crate::user::UserId;
use anyhow::{anyhow, bail, Context, Result};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Selected album columns. `?1` is always the requesting user id (NULL when
/// anonymous), so `is_liked` comes out false for anonymous requests.
const ALBUM_SELECT: &str = "SELECT a.id, a.title, a.artist, a.genre, a.release_year, \
     a.album_cover, a.large_album_cover, a.album_url, a.created, a.updated, \
     EXISTS (SELECT 1 FROM liked_album l WHERE l.album_id = a.id AND l.user_id = ?1) \
     FROM album a";

#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path, CATALOG_VERSIONED_SCHEMAS, "catalog")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        register_unicode_lower(&conn)?;

        let album_count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", ALBUM_TABLE_V_0.name),
                [],
                |r| r.get(0),
            )
            .unwrap_or(0);
        info!("Opened catalog with {} albums", album_count);

        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Catalog connection mutex poisoned"))
    }

    fn album_from_row(row: &Row) -> rusqlite::Result<Album> {
        Ok(Album {
            id: row.get(0)?,
            title: row.get(1)?,
            artist: row.get(2)?,
            genre: row.get(3)?,
            release_year: row.get(4)?,
            album_cover: row.get(5)?,
            large_album_cover: row.get(6)?,
            album_url: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
            tracks: vec![],
            is_liked: row.get(10)?,
        })
    }

    fn load_tracks(conn: &Connection, albums: &mut [Album]) -> Result<()> {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT id, name, artist, duration, url, album_id FROM {} WHERE album_id = ?1 ORDER BY position",
            TRACK_TABLE_V_0.name
        ))?;
        for album in albums.iter_mut() {
            album.tracks = stmt
                .query_map(params![album.id], |row| {
                    Ok(Track {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        artist: row.get(2)?,
                        duration: row.get(3)?,
                        url: row.get(4)?,
                        album_id: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
        }
        Ok(())
    }

    fn insert_tracks(tx: &Transaction, album_id: AlbumId, tracks: &[NewTrack]) -> Result<()> {
        let mut stmt = tx.prepare_cached(&format!(
            "INSERT INTO {} (album_id, position, name, artist, duration, url) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            TRACK_TABLE_V_0.name
        ))?;
        for (position, track) in tracks.iter().enumerate() {
            stmt.execute(params![
                album_id,
                position as i64,
                track.name,
                track.artist,
                track.duration,
                track.url
            ])?;
        }
        Ok(())
    }

    fn query_albums(
        conn: &Connection,
        filter: &AlbumFilter,
        user_id: Option<UserId>,
    ) -> Result<Vec<Album>> {
        let mut sql = format!("{} WHERE 1 = 1", ALBUM_SELECT);
        let mut values: Vec<Value> = vec![match user_id {
            Some(id) => Value::Integer(id),
            None => Value::Null,
        }];

        if let Some(genre) = &filter.genre {
            values.push(Value::Text(genre.clone()));
            sql.push_str(&format!(" AND a.genre = ?{}", values.len()));
        }
        if let Some(artist) = &filter.artist {
            values.push(Value::Text(artist.clone()));
            sql.push_str(&format!(
                " AND instr(unicode_lower(a.artist), unicode_lower(?{})) > 0",
                values.len()
            ));
        }
        if let Some(release_year) = filter.release_year {
            values.push(Value::Integer(release_year as i64));
            sql.push_str(&format!(" AND a.release_year = ?{}", values.len()));
        }
        if filter.liked_only && user_id.is_some() {
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM {} lo WHERE lo.album_id = a.id AND lo.user_id = ?1)",
                LIKED_ALBUM_TABLE_V_0.name
            ));
        }
        sql.push_str(" ORDER BY a.title ASC, a.id ASC");
        debug!("Album query: {}", sql);

        let mut stmt = conn.prepare(&sql)?;
        let mut albums = stmt
            .query_map(params_from_iter(values), Self::album_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Self::load_tracks(conn, &mut albums)?;
        Ok(albums)
    }
}

/// `unicode_lower(text)`: full Unicode lowercasing. SQLite's own `lower` and
/// `LIKE` only fold ASCII letters.
fn register_unicode_lower(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )?;
    Ok(())
}

impl CatalogStore for SqliteCatalogStore {
    fn list_albums(&self, filter: &AlbumFilter, user_id: Option<UserId>) -> Result<Vec<Album>> {
        let conn = self.conn()?;
        Self::query_albums(&conn, filter, user_id)
    }

    fn get_album(&self, id: AlbumId, user_id: Option<UserId>) -> Result<Option<Album>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&format!("{} WHERE a.id = ?2", ALBUM_SELECT))?;
        let album = match stmt.query_row(params![user_id, id], Self::album_from_row) {
            Ok(album) => album,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut albums = [album];
        Self::load_tracks(&conn, &mut albums)?;
        let [album] = albums;
        Ok(Some(album))
    }

    fn find_album_id(&self, title: &str, artist: &str) -> Result<Option<AlbumId>> {
        let conn = self.conn()?;
        match conn.query_row(
            &format!(
                "SELECT id FROM {} WHERE title = ?1 AND artist = ?2",
                ALBUM_TABLE_V_0.name
            ),
            params![title, artist],
            |r| r.get(0),
        ) {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn add_album(&self, album: NewAlbum) -> Result<(AlbumId, bool)> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            &format!(
                "INSERT INTO {} (title, artist, genre, release_year, album_cover, large_album_cover, album_url) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) ON CONFLICT (title, artist) DO NOTHING",
                ALBUM_TABLE_V_0.name
            ),
            params![
                album.title,
                album.artist,
                album.genre,
                album.release_year,
                album.album_cover,
                album.large_album_cover,
                album.album_url
            ],
        )?;

        if inserted == 0 {
            let existing_id: AlbumId = tx
                .query_row(
                    &format!(
                        "SELECT id FROM {} WHERE title = ?1 AND artist = ?2",
                        ALBUM_TABLE_V_0.name
                    ),
                    params![album.title, album.artist],
                    |r| r.get(0),
                )
                .context("Album insert was ignored but no existing album was found")?;
            tx.commit()?;
            debug!(
                "Album \"{}\" by {} already exists with id {}",
                album.title, album.artist, existing_id
            );
            return Ok((existing_id, false));
        }

        let album_id = tx.last_insert_rowid();
        Self::insert_tracks(&tx, album_id, &album.tracks)?;
        tx.commit()?;
        info!(
            "Added album \"{}\" by {} with id {} ({} tracks)",
            album.title,
            album.artist,
            album_id,
            album.tracks.len()
        );
        Ok((album_id, true))
    }

    fn replace_album_metadata(&self, id: AlbumId, metadata: &AlbumMetadata) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let updated = tx.execute(
            &format!(
                "UPDATE {} SET album_cover = ?1, large_album_cover = ?2, album_url = ?3, \
                 updated = cast(strftime('%s','now') as int) WHERE id = ?4",
                ALBUM_TABLE_V_0.name
            ),
            params![
                metadata.album_cover,
                metadata.large_album_cover,
                metadata.album_url,
                id
            ],
        )?;
        if updated == 0 {
            bail!("Album {} does not exist", id);
        }
        tx.execute(
            &format!("DELETE FROM {} WHERE album_id = ?1", TRACK_TABLE_V_0.name),
            params![id],
        )?;
        Self::insert_tracks(&tx, id, &metadata.tracks)?;
        tx.commit()?;
        Ok(())
    }

    fn like_album(&self, user_id: UserId, album_id: AlbumId) -> Result<bool> {
        let conn = self.conn()?;
        // The (user_id, album_id) unique constraint turns a repeated like into a no-op.
        let inserted = conn
            .execute(
                &format!(
                    "INSERT OR IGNORE INTO {} (user_id, album_id) VALUES (?1, ?2)",
                    LIKED_ALBUM_TABLE_V_0.name
                ),
                params![user_id, album_id],
            )
            .with_context(|| format!("Failed to like album {} for user {}", album_id, user_id))?;
        Ok(inserted > 0)
    }

    fn unlike_album(&self, user_id: UserId, album_id: AlbumId) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE user_id = ?1 AND album_id = ?2",
                LIKED_ALBUM_TABLE_V_0.name
            ),
            params![user_id, album_id],
        )?;
        Ok(removed > 0)
    }

    fn count_likes(&self, user_id: UserId, album_id: AlbumId) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE user_id = ?1 AND album_id = ?2",
                LIKED_ALBUM_TABLE_V_0.name
            ),
            params![user_id, album_id],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }

    fn get_liked_albums(&self, user_id: UserId) -> Result<Vec<Album>> {
        let conn = self.conn()?;
        Self::query_albums(&conn, &AlbumFilter::liked_only(), Some(user_id))
    }

    fn get_albums_count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", ALBUM_TABLE_V_0.name),
            [],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }
}
