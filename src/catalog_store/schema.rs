//! SQLite schema of the catalog database.
//!
//! The liked-album relation lives next to the albums so that liked-only
//! filtering and per-user like state are answered by a single query.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

/// V 0
pub const ALBUM_TABLE_V_0: Table = Table {
    name: "album",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("artist", &SqlType::Text, non_null = true),
        sqlite_column!("genre", &SqlType::Text, non_null = true),
        sqlite_column!("release_year", &SqlType::Integer, non_null = true),
        sqlite_column!("album_cover", &SqlType::Text),
        sqlite_column!("large_album_cover", &SqlType::Text),
        sqlite_column!("album_url", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_album_title", "title"),
        ("idx_album_genre", "genre"),
        ("idx_album_release_year", "release_year"),
    ],
    // Dedup key of the add-album flow.
    unique_constraints: &[&["title", "artist"]],
};

pub const TRACK_TABLE_V_0: Table = Table {
    name: "track",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "album_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "album",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("artist", &SqlType::Text, non_null = true),
        sqlite_column!("duration", &SqlType::Integer),
        sqlite_column!("url", &SqlType::Text),
    ],
    indices: &[("idx_track_album_id", "album_id")],
    unique_constraints: &[],
};

pub const LIKED_ALBUM_TABLE_V_0: Table = Table {
    name: "liked_album",
    columns: &[
        // Users live in the user database, so there is no foreign key here.
        sqlite_column!("user_id", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "album_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "album",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_liked_album_album_id", "album_id")],
    unique_constraints: &[&["user_id", "album_id"]],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[ALBUM_TABLE_V_0, TRACK_TABLE_V_0, LIKED_ALBUM_TABLE_V_0],
    migration: None,
}];
