//! The structured-record service boundary and its SQLite implementation.
//!
//! A record service stores JSON items under a composite `(owner_id, id)`
//! key. `owner_id` acts as the partition key: range queries select every
//! item in one partition, optionally projecting just the `id` attribute.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::StoreKey;

/// Which attributes a range query returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    /// Full items.
    All,
    /// Only the `id` attribute; [`RecordItem::body`] is `None`.
    IdOnly,
}

/// One item as returned by a [`RecordService`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordItem {
    pub key: StoreKey,
    pub body: Option<Value>,
}

/// Structured-record service primitives.
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Upsert the item at `key`.
    async fn put_item(&self, key: &StoreKey, body: Value) -> StoreResult<()>;

    /// Point lookup by composite key.
    async fn get_item(&self, key: &StoreKey) -> StoreResult<Option<RecordItem>>;

    /// Every item whose partition key equals `owner`, ordered by id.
    async fn query_items(&self, owner: &str, projection: Projection)
        -> StoreResult<Vec<RecordItem>>;

    /// Point delete by composite key. Missing items are not an error.
    async fn delete_item(&self, key: &StoreKey) -> StoreResult<()>;

    /// Drop every item.
    async fn clear(&self) -> StoreResult<()>;
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS records (
        owner_id TEXT NOT NULL,
        id TEXT NOT NULL,
        body TEXT NOT NULL,
        PRIMARY KEY (owner_id, id)
    );
";

/// [`RecordService`] backed by a SQLite database.
///
/// The connection sits behind a mutex and every statement runs on the
/// blocking thread pool, so callers on the async runtime never block on
/// disk I/O.
#[derive(Clone)]
pub struct SqliteRecordService {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordService {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| StoreError::backend("open", path.display(), e))?;
        Self::with_connection(conn)
    }

    /// A private, non-persistent database. Useful for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::backend("open", ":memory:", e))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::backend("migrate", "records", e))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run<T, F>(&self, op: &'static str, key: String, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let task_key = key.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
            f(&conn).map_err(|e| StoreError::backend(op, &task_key, e))
        })
        .await
        .map_err(|e| StoreError::backend(op, key, e))?
    }
}

#[async_trait]
impl RecordService for SqliteRecordService {
    async fn put_item(&self, key: &StoreKey, body: Value) -> StoreResult<()> {
        debug!(owner = %key.owner, id = %key.id, "records: put_item");
        let owner = key.owner.clone();
        let id = key.id.clone();
        let body = body.to_string();
        self.run("put_item", key.to_string(), move |conn| {
            conn.execute(
                "INSERT INTO records (owner_id, id, body) VALUES (?1, ?2, ?3)
                 ON CONFLICT(owner_id, id) DO UPDATE SET body = ?3",
                params![owner, id, body],
            )
            .map(|_| ())
        })
        .await
    }

    async fn get_item(&self, key: &StoreKey) -> StoreResult<Option<RecordItem>> {
        let owner = key.owner.clone();
        let id = key.id.clone();
        let body: Option<String> = self
            .run("get_item", key.to_string(), move |conn| {
                conn.query_row(
                    "SELECT body FROM records WHERE owner_id = ?1 AND id = ?2",
                    params![owner, id],
                    |row| row.get(0),
                )
                .optional()
            })
            .await?;

        body.map(|raw| {
            let body = decode_body(key, &raw)?;
            Ok::<_, StoreError>(RecordItem {
                key: key.clone(),
                body: Some(body),
            })
        })
        .transpose()
    }

    async fn query_items(
        &self,
        owner: &str,
        projection: Projection,
    ) -> StoreResult<Vec<RecordItem>> {
        let partition = owner.to_string();
        let rows: Vec<(String, Option<String>)> = self
            .run("query_items", owner.to_string(), move |conn| {
                let sql = match projection {
                    Projection::All => {
                        "SELECT id, body FROM records WHERE owner_id = ?1 ORDER BY id"
                    }
                    Projection::IdOnly => {
                        "SELECT id, NULL FROM records WHERE owner_id = ?1 ORDER BY id"
                    }
                };
                let mut stmt = conn.prepare(sql)?;
                let rows = stmt.query_map(params![partition], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;
                rows.collect()
            })
            .await?;

        rows.into_iter()
            .map(|(id, raw)| {
                let key = StoreKey::new(owner, id);
                let body = raw.map(|raw| decode_body(&key, &raw)).transpose()?;
                Ok::<_, StoreError>(RecordItem { key, body })
            })
            .collect()
    }

    async fn delete_item(&self, key: &StoreKey) -> StoreResult<()> {
        debug!(owner = %key.owner, id = %key.id, "records: delete_item");
        let owner = key.owner.clone();
        let id = key.id.clone();
        self.run("delete_item", key.to_string(), move |conn| {
            conn.execute(
                "DELETE FROM records WHERE owner_id = ?1 AND id = ?2",
                params![owner, id],
            )
            .map(|_| ())
        })
        .await
    }

    async fn clear(&self) -> StoreResult<()> {
        self.run("clear", "*".to_string(), |conn| {
            conn.execute("DELETE FROM records", []).map(|_| ())
        })
        .await
    }
}

fn decode_body(key: &StoreKey, raw: &str) -> StoreResult<Value> {
    serde_json::from_str(raw).map_err(|e| StoreError::Serialization {
        key: key.to_string(),
        message: e.to_string(),
    })
}

impl std::fmt::Debug for SqliteRecordService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRecordService").finish_non_exhaustive()
    }
}
