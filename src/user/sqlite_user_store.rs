use super::auth::{PasswordCredentials, PasswordHasherKind};
use super::user_models::{User, UserId};
use super::user_store::UserStore;
use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned_db, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    DEFAULT_TIMESTAMP,
};
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

const USER_PASSWORD_CREDENTIALS_TABLE_V_0: Table = Table {
    name: "user_password_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            is_primary_key = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

const USER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[USER_TABLE_V_0, USER_PASSWORD_CREDENTIALS_TABLE_V_0],
    migration: None,
}];

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned_db(db_path, USER_VERSIONED_SCHEMAS, "user")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let store = SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        };
        info!("Opened user store with {} users", store.get_users_count()?);
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("User connection mutex poisoned"))
    }

    fn user_from_row(row: &Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, email: &str, name: Option<&str>) -> Result<Option<User>> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            &format!(
                "INSERT INTO {} (email, name) VALUES (?1, ?2) ON CONFLICT (email) DO NOTHING",
                USER_TABLE_V_0.name
            ),
            params![email, name],
        )?;
        if inserted == 0 {
            return Ok(None);
        }
        let user_id = conn.last_insert_rowid();
        let user = conn.query_row(
            &format!(
                "SELECT id, email, name, created FROM {} WHERE id = ?1",
                USER_TABLE_V_0.name
            ),
            params![user_id],
            Self::user_from_row,
        )?;
        Ok(Some(user))
    }

    fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                &format!(
                    "SELECT id, email, name, created FROM {} WHERE id = ?1",
                    USER_TABLE_V_0.name
                ),
                params![user_id],
                Self::user_from_row,
            )
            .optional()?)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                &format!(
                    "SELECT id, email, name, created FROM {} WHERE email = ?1",
                    USER_TABLE_V_0.name
                ),
                params![email],
                Self::user_from_row,
            )
            .optional()?)
    }

    fn update_user_name(&self, user_id: UserId, name: Option<&str>) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            &format!("UPDATE {} SET name = ?1 WHERE id = ?2", USER_TABLE_V_0.name),
            params![name, user_id],
        )?;
        Ok(updated > 0)
    }

    fn get_password_credentials(&self, user_id: UserId) -> Result<Option<PasswordCredentials>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT salt, hash, hasher FROM {} WHERE user_id = ?1",
                    USER_PASSWORD_CREDENTIALS_TABLE_V_0.name
                ),
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((salt, hash, hasher)) => Ok(Some(PasswordCredentials {
                user_id,
                salt,
                hash,
                hasher: PasswordHasherKind::from_str(&hasher)
                    .with_context(|| format!("Invalid hasher for user {}", user_id))?,
            })),
        }
    }

    fn set_password_credentials(&self, credentials: &PasswordCredentials) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO {} (user_id, salt, hash, hasher) VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT (user_id) DO UPDATE SET salt = excluded.salt, hash = excluded.hash, hasher = excluded.hasher",
                USER_PASSWORD_CREDENTIALS_TABLE_V_0.name
            ),
            params![
                credentials.user_id,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string()
            ],
        )?;
        Ok(())
    }

    fn get_users_count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", USER_TABLE_V_0.name),
            [],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }
}
