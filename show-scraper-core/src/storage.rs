//! SQLite-backed document store for shows and committed pages.
//!
//! Shows are stored as JSON documents keyed by identity, the way a document
//! database would hold them; committed pages are a single-column table whose
//! maximum is the cursor. One [`SqliteStore`] implements both
//! [`ShowRepository`] and [`PageCursorStore`].

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::contract::{PageCursorStore, ShowRepository};
use crate::error::StoreError;
use crate::model::Show;

pub struct SqliteStore {
    conn: Mutex<Connection>,
    location: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = SqliteStore {
            conn: Mutex::new(conn),
            location: Some(path.to_path_buf()),
        };
        store.init()?;
        info!(path = %path.display(), "Opened show database");
        Ok(store)
    }

    /// A private database that disappears with the store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = SqliteStore {
            conn: Mutex::new(Connection::open_in_memory()?),
            location: None,
        };
        store.init()?;
        Ok(store)
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    fn init(&self) -> Result<(), StoreError> {
        self.connection().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS shows (
                id INTEGER PRIMARY KEY,
                document TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS show_pages (
                page INTEGER PRIMARY KEY
            );
            "#,
        )?;
        debug!("Show database schema initialized");
        Ok(())
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        // Statements are atomic; a poisoned lock holds no partial state.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn show_key(id: u64) -> Result<i64, StoreError> {
    i64::try_from(id).map_err(|_| StoreError::IdOutOfRange(id))
}

#[async_trait]
impl ShowRepository for SqliteStore {
    async fn insert(&self, show: Show) -> Result<(), StoreError> {
        let document = serde_json::to_string(&show)?;
        let conn = self.connection();
        let id = show_key(show.id)?;
        match conn.execute(
            "INSERT INTO shows (id, document) VALUES (?1, ?2)",
            params![id, document],
        ) {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateShow(show.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Show>, StoreError> {
        let key = show_key(id)?;
        let document: Option<String> = self
            .connection()
            .query_row(
                "SELECT document FROM shows WHERE id = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        match document {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn list_shows(&self, offset: u64, limit: u32) -> Result<Vec<Show>, StoreError> {
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let conn = self.connection();
        let mut stmt =
            conn.prepare("SELECT document FROM shows ORDER BY id LIMIT ?1 OFFSET ?2")?;
        let documents = stmt
            .query_map(params![i64::from(limit), offset], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        documents
            .iter()
            .map(|json| serde_json::from_str(json).map_err(StoreError::from))
            .collect()
    }
}

#[async_trait]
impl PageCursorStore for SqliteStore {
    async fn last_completed_page(&self) -> Result<u32, StoreError> {
        let page: i64 = self.connection().query_row(
            "SELECT COALESCE(MAX(page), 0) FROM show_pages",
            [],
            |row| row.get(0),
        )?;
        u32::try_from(page).map_err(|_| StoreError::CorruptCursor(page))
    }

    async fn mark_page_completed(&self, page: u32) -> Result<(), StoreError> {
        self.connection().execute(
            "INSERT OR IGNORE INTO show_pages (page) VALUES (?1)",
            params![i64::from(page)],
        )?;
        Ok(())
    }
}
