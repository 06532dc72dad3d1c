//! LibSQL storage backend implementation
//!
//! Persists friends and interactions in a local SQLite file through libSQL.
//! Timestamps are stored as fixed-width RFC 3339 text so that ordering by the
//! column orders by time.

use crate::error::{RapportError, Result};
use crate::storage::StorageBackend;
use crate::types::{Friend, FriendId, FriendUpdate, Interaction, InteractionId, NewFriend};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{params, Builder, Connection, Database};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Migrations compiled into the binary, applied in order
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial_schema.sql",
    include_str!("../../migrations/001_initial_schema.sql"),
)];

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

const FRIEND_COLUMNS: &str = "id, name, email, phone, preference, bio, avatar";
const INTERACTION_COLUMNS: &str = "id, friend_id, type, notes, occurred_at";

/// Format a timestamp for storage
fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RapportError::Database(format!("Invalid timestamp '{}': {}", raw, e)))
}

/// LibSQL storage backend
pub struct LibsqlStorage {
    db: Database,
    path: PathBuf,
}

impl LibsqlStorage {
    /// Validate database file before opening
    ///
    /// Returns `Ok(false)` when the file is missing and `must_exist` is false.
    fn validate_database_file(path: &Path, must_exist: bool) -> Result<bool> {
        if !path.exists() {
            if must_exist {
                return Err(RapportError::Database(format!(
                    "Database file not found at '{}'. Run 'rapport init' first or check RAPPORT_DB_PATH.",
                    path.display()
                )));
            }
            return Ok(false);
        }

        // SQLite files start with "SQLite format 3\0"; a zero-length file is
        // what SQLite itself leaves behind before the first write.
        let mut header = Vec::with_capacity(16);
        std::fs::File::open(path)?.take(16).read_to_end(&mut header)?;
        if !header.is_empty() && header.as_slice() != b"SQLite format 3\0" {
            return Err(RapportError::Database(format!(
                "Database file at '{}' is corrupted or not a SQLite database.",
                path.display()
            )));
        }

        debug!("Database file validation passed: {}", path.display());
        Ok(true)
    }

    /// Open (or create) a local database and run migrations
    pub async fn new_with_validation(path: impl AsRef<Path>, create_if_missing: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        info!(
            "Connecting to LibSQL database: {} (create_if_missing: {})",
            path.display(),
            create_if_missing
        );

        let exists = Self::validate_database_file(&path, !create_if_missing)?;
        if create_if_missing && !exists {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    RapportError::Database(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let db = Builder::new_local(&path)
            .build()
            .await
            .map_err(|e| RapportError::Database(format!("Failed to open local database: {}", e)))?;

        info!("LibSQL database connection established");

        let storage = Self { db, path };

        // WAL lets readers proceed while a request is writing
        storage
            .connect()
            .await?
            .execute_batch("PRAGMA journal_mode = WAL;")
            .await?;

        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database; fails if it has not been initialised
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new_with_validation(path, false).await
    }

    /// Open a database, creating it if needed
    pub async fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
        Self::new_with_validation(path, true).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");
        let conn = self.connect().await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations_applied (
                migration_name TEXT PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )",
            params![],
        )
        .await
        .map_err(|e| RapportError::Migration(format!("Failed to create migrations table: {}", e)))?;

        for (name, sql) in MIGRATIONS {
            let mut rows = conn
                .query(
                    "SELECT COUNT(*) FROM _migrations_applied WHERE migration_name = ?",
                    params![*name],
                )
                .await?;
            let already_applied = match rows.next().await? {
                Some(row) => row.get::<i64>(0).unwrap_or(0),
                None => 0,
            };
            if already_applied > 0 {
                debug!("Skipping already applied migration: {}", name);
                continue;
            }

            conn.execute_batch(sql).await.map_err(|e| {
                RapportError::Migration(format!("Failed to apply {}: {}", name, e))
            })?;

            conn.execute(
                "INSERT INTO _migrations_applied (migration_name, applied_at) VALUES (?, ?)",
                params![*name, Utc::now().timestamp()],
            )
            .await
            .map_err(|e| RapportError::Migration(format!("Failed to record migration: {}", e)))?;

            info!("Executed migration: {}", name);
        }

        info!("Database migrations completed");
        Ok(())
    }

    /// Get a connection with foreign keys enforced
    ///
    /// Every request opens its own connection, so concurrent writers wait on
    /// the lock for up to [`BUSY_TIMEOUT`] instead of failing immediately.
    async fn connect(&self) -> Result<Connection> {
        let conn = self
            .db
            .connect()
            .map_err(|e| RapportError::Database(format!("Failed to get connection: {}", e)))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;").await?;
        Ok(conn)
    }

    fn row_to_friend(row: &libsql::Row) -> Result<Friend> {
        Ok(Friend {
            id: FriendId(row.get::<i64>(0)?),
            name: row.get::<String>(1)?,
            email: row.get::<Option<String>>(2)?,
            phone: row.get::<Option<String>>(3)?,
            preference: row.get::<Option<String>>(4)?,
            bio: row.get::<Option<String>>(5)?,
            avatar: row.get::<Option<String>>(6)?,
        })
    }

    fn row_to_interaction(row: &libsql::Row) -> Result<Interaction> {
        let occurred_at: String = row.get(4)?;
        Ok(Interaction {
            id: InteractionId(row.get::<i64>(0)?),
            friend_id: FriendId(row.get::<i64>(1)?),
            kind: row.get::<String>(2)?,
            notes: row.get::<Option<String>>(3)?,
            occurred_at: decode_timestamp(&occurred_at)?,
        })
    }

    async fn query_interactions(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams + Send,
    ) -> Result<Vec<Interaction>> {
        let conn = self.connect().await?;
        let mut rows = conn.query(sql, params).await?;
        let mut interactions = Vec::new();
        while let Some(row) = rows.next().await? {
            interactions.push(Self::row_to_interaction(&row)?);
        }
        Ok(interactions)
    }
}

#[async_trait]
impl StorageBackend for LibsqlStorage {
    async fn create_friend(&self, friend: &NewFriend) -> Result<Friend> {
        debug!("Storing friend: {}", friend.name);
        let conn = self.connect().await?;

        conn.execute(
            "INSERT INTO friends (name, email, phone, preference, bio, avatar)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                friend.name.clone(),
                friend.email.clone(),
                friend.phone.clone(),
                friend.preference.clone(),
                friend.bio.clone(),
                friend.avatar.clone(),
            ],
        )
        .await?;

        let id = FriendId(conn.last_insert_rowid());
        info!("Created friend {} ({})", id, friend.name);

        Ok(Friend {
            id,
            name: friend.name.clone(),
            email: friend.email.clone(),
            phone: friend.phone.clone(),
            preference: friend.preference.clone(),
            bio: friend.bio.clone(),
            avatar: friend.avatar.clone(),
        })
    }

    async fn get_friend(&self, id: FriendId) -> Result<Friend> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM friends WHERE id = ?", FRIEND_COLUMNS),
                params![id.0],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::row_to_friend(&row),
            None => Err(RapportError::FriendNotFound(id)),
        }
    }

    async fn list_friends(&self) -> Result<Vec<Friend>> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM friends ORDER BY id", FRIEND_COLUMNS),
                params![],
            )
            .await?;

        let mut friends = Vec::new();
        while let Some(row) = rows.next().await? {
            friends.push(Self::row_to_friend(&row)?);
        }
        Ok(friends)
    }

    async fn update_friend(&self, id: FriendId, update: &FriendUpdate) -> Result<Friend> {
        if update.is_empty() {
            return self.get_friend(id).await;
        }

        // Absent fields bind NULL and keep the stored value
        let conn = self.connect().await?;
        let changed = conn
            .execute(
                "UPDATE friends SET
                    name = COALESCE(?, name),
                    email = COALESCE(?, email),
                    phone = COALESCE(?, phone),
                    preference = COALESCE(?, preference),
                    bio = COALESCE(?, bio),
                    avatar = COALESCE(?, avatar)
                 WHERE id = ?",
                params![
                    update.name.clone(),
                    update.email.clone(),
                    update.phone.clone(),
                    update.preference.clone(),
                    update.bio.clone(),
                    update.avatar.clone(),
                    id.0,
                ],
            )
            .await?;

        if changed == 0 {
            return Err(RapportError::FriendNotFound(id));
        }

        debug!("Updated friend {}", id);
        self.get_friend(id).await
    }

    async fn delete_friend(&self, id: FriendId) -> Result<usize> {
        let conn = self.connect().await?;
        let tx = conn.transaction().await?;

        let removed = tx
            .execute(
                "DELETE FROM interactions WHERE friend_id = ?",
                params![id.0],
            )
            .await?;
        let deleted = tx
            .execute("DELETE FROM friends WHERE id = ?", params![id.0])
            .await?;

        if deleted == 0 {
            tx.rollback().await?;
            return Err(RapportError::FriendNotFound(id));
        }

        tx.commit().await?;
        info!("Deleted friend {} and {} interaction(s)", id, removed);
        Ok(removed as usize)
    }

    async fn create_interaction(
        &self,
        friend_id: FriendId,
        kind: &str,
        notes: Option<&str>,
        occurred_at: DateTime<Utc>,
    ) -> Result<Interaction> {
        let conn = self.connect().await?;

        conn.execute(
            "INSERT INTO interactions (friend_id, type, notes, occurred_at) VALUES (?, ?, ?, ?)",
            params![
                friend_id.0,
                kind.to_string(),
                notes.map(str::to_string),
                encode_timestamp(occurred_at),
            ],
        )
        .await
        .map_err(|e| {
            if e.to_string().contains("FOREIGN KEY") {
                RapportError::InvalidInput(format!("friend {} does not exist", friend_id))
            } else {
                e.into()
            }
        })?;

        let id = InteractionId(conn.last_insert_rowid());
        debug!("Logged {} interaction {} for friend {}", kind, id, friend_id);

        // Read back so the returned timestamp has storage precision
        self.get_interaction(id).await
    }

    async fn get_interaction(&self, id: InteractionId) -> Result<Interaction> {
        let found = self
            .query_interactions(
                &format!("SELECT {} FROM interactions WHERE id = ?", INTERACTION_COLUMNS),
                params![id.0],
            )
            .await?;
        found
            .into_iter()
            .next()
            .ok_or(RapportError::InteractionNotFound(id))
    }

    async fn list_interactions_for_friend(&self, id: FriendId) -> Result<Vec<Interaction>> {
        self.query_interactions(
            &format!(
                "SELECT {} FROM interactions WHERE friend_id = ?
                 ORDER BY occurred_at DESC, id DESC",
                INTERACTION_COLUMNS
            ),
            params![id.0],
        )
        .await
    }

    async fn list_all_interactions(&self) -> Result<Vec<Interaction>> {
        self.query_interactions(
            &format!(
                "SELECT {} FROM interactions ORDER BY occurred_at DESC, id DESC",
                INTERACTION_COLUMNS
            ),
            params![],
        )
        .await
    }

    async fn count_interactions_for_friend(&self, id: FriendId) -> Result<usize> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM interactions WHERE friend_id = ?",
                params![id.0],
            )
            .await?;
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(count.max(0) as usize)
    }

    async fn delete_interaction(&self, id: InteractionId) -> Result<()> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute("DELETE FROM interactions WHERE id = ?", params![id.0])
            .await?;
        if deleted == 0 {
            warn!("Attempted to delete missing interaction {}", id);
            return Err(RapportError::InteractionNotFound(id));
        }
        debug!("Deleted interaction {}", id);
        Ok(())
    }
}
