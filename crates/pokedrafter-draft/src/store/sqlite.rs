//! SQLite persistence for templates, drafts and rooms.
//!
//! rusqlite is synchronous, so every call runs on Tokio's blocking pool
//! through [`SqliteStore::with_conn`] and never stalls a runtime worker.

use std::sync::{Arc, Mutex, PoisonError};

use pokedrafter_protocol::{DraftId, RoomId, TemplateId};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::DraftStore;
use crate::{Draft, DraftTemplate, StoreError};

/// Stores templates, drafts and rooms as JSON documents in SQLite.
///
/// The indexed columns (`name`, `room_id`, `revision`) duplicate fields of
/// the document so the database can enforce uniqueness and compare-and-swap.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a database at `path` and ensures the schema
    /// exists. `":memory:"` gives an ephemeral database.
    ///
    /// Runs synchronously; call it before serving requests.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS id_sequence (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                issued_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE IF NOT EXISTS templates (
                id       INTEGER PRIMARY KEY,
                name     TEXT NOT NULL UNIQUE,
                document TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS drafts (
                id          INTEGER PRIMARY KEY,
                room_id     INTEGER NOT NULL UNIQUE,
                template_id INTEGER NOT NULL REFERENCES templates(id),
                revision    INTEGER NOT NULL,
                document    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS rooms (
                id       INTEGER PRIMARY KEY,
                name     TEXT NOT NULL UNIQUE,
                document TEXT NOT NULL
            );
            ",
        )?;

        tracing::info!(path, "draft database opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    ///
    /// A poisoned lock still guards a consistent connection; SQLite rolls
    /// back whatever the panicking writer left open.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&conn)
        })
        .await?
    }

    /// Fetches the single `document` column selected by `sql`.
    async fn document(
        &self,
        sql: &'static str,
        key: Key,
    ) -> Result<Option<String>, StoreError> {
        self.with_conn(move |conn| {
            let document = match key {
                Key::Id(id) => conn.query_row(sql, params![id], |row| row.get(0)),
                Key::Name(name) => conn.query_row(sql, params![name], |row| row.get(0)),
            };
            Ok(document.optional()?)
        })
        .await
    }

    async fn documents(&self, sql: &'static str) -> Result<Vec<String>, StoreError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }
}

/// Lookup key for a single-document query.
enum Key {
    Id(i64),
    Name(String),
}

fn decode<T: DeserializeOwned>(document: Option<String>) -> Result<Option<T>, StoreError> {
    document
        .map(|doc| serde_json::from_str(&doc))
        .transpose()
        .map_err(StoreError::from)
}

fn decode_all<T: DeserializeOwned>(documents: Vec<String>) -> Result<Vec<T>, StoreError> {
    documents
        .iter()
        .map(|doc| serde_json::from_str(doc).map_err(StoreError::from))
        .collect()
}

/// Maps a unique-constraint failure to [`StoreError::Duplicate`].
fn constraint(err: rusqlite::Error, what: impl FnOnce() -> String) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::ConstraintViolation => {
            StoreError::Duplicate(what())
        }
        other => StoreError::Sqlite(other),
    }
}

impl DraftStore for SqliteStore {
    async fn next_id(&self) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            conn.execute("INSERT INTO id_sequence DEFAULT VALUES", [])?;
            Ok(conn.last_insert_rowid() as u64)
        })
        .await
    }

    async fn insert_template(&self, template: &DraftTemplate) -> Result<(), StoreError> {
        let document = serde_json::to_string(template)?;
        let id = template.id.0 as i64;
        let name = template.name.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO templates (id, name, document) VALUES (?1, ?2, ?3)",
                params![id, name, document],
            )
            .map_err(|e| constraint(e, || format!("template name {name:?}")))?;
            Ok(())
        })
        .await
    }

    async fn replace_template(&self, template: &DraftTemplate) -> Result<(), StoreError> {
        let document = serde_json::to_string(template)?;
        let id = template.id;
        let name = template.name.clone();
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE templates SET name = ?2, document = ?3 WHERE id = ?1",
                    params![id.0 as i64, name, document],
                )
                .map_err(|e| constraint(e, || format!("template name {name:?}")))?;
            if changed == 0 {
                return Err(StoreError::Missing(format!("template {id}")));
            }
            Ok(())
        })
        .await
    }

    async fn get_template(&self, id: TemplateId) -> Result<Option<DraftTemplate>, StoreError> {
        let document = self
            .document("SELECT document FROM templates WHERE id = ?1", Key::Id(id.0 as i64))
            .await?;
        decode(document)
    }

    async fn find_template_by_name(&self, name: &str) -> Result<Option<DraftTemplate>, StoreError> {
        let document = self
            .document(
                "SELECT document FROM templates WHERE name = ?1",
                Key::Name(name.to_owned()),
            )
            .await?;
        decode(document)
    }

    async fn list_templates(&self) -> Result<Vec<DraftTemplate>, StoreError> {
        decode_all(self.documents("SELECT document FROM templates ORDER BY id").await?)
    }

    async fn insert_draft(&self, draft: &Draft) -> Result<(), StoreError> {
        let document = serde_json::to_string(draft)?;
        let (id, room, template, revision) = (
            draft.id().0 as i64,
            draft.room(),
            draft.template().0 as i64,
            draft.revision() as i64,
        );
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO drafts (id, room_id, template_id, revision, document)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, room.0 as i64, template, revision, document],
            )
            .map_err(|e| constraint(e, || format!("draft for room {room}")))?;
            Ok(())
        })
        .await
    }

    async fn replace_draft(&self, draft: &Draft, expected_revision: u64) -> Result<(), StoreError> {
        let document = serde_json::to_string(draft)?;
        let id = draft.id();
        let revision = draft.revision() as i64;
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE drafts SET revision = ?2, document = ?3 WHERE id = ?1 AND revision = ?4",
                params![id.0 as i64, revision, document, expected_revision as i64],
            )?;
            if changed == 1 {
                return Ok(());
            }

            let found: Option<i64> = conn
                .query_row(
                    "SELECT revision FROM drafts WHERE id = ?1",
                    params![id.0 as i64],
                    |row| row.get(0),
                )
                .optional()?;
            match found {
                Some(found) => Err(StoreError::Conflict {
                    id,
                    expected: expected_revision,
                    found: found as u64,
                }),
                None => Err(StoreError::Missing(format!("draft {id}"))),
            }
        })
        .await
    }

    async fn get_draft(&self, id: DraftId) -> Result<Option<Draft>, StoreError> {
        let document = self
            .document("SELECT document FROM drafts WHERE id = ?1", Key::Id(id.0 as i64))
            .await?;
        decode(document)
    }

    async fn find_draft_by_room(&self, room: RoomId) -> Result<Option<Draft>, StoreError> {
        let document = self
            .document(
                "SELECT document FROM drafts WHERE room_id = ?1",
                Key::Id(room.0 as i64),
            )
            .await?;
        decode(document)
    }

    async fn list_drafts(&self) -> Result<Vec<Draft>, StoreError> {
        decode_all(self.documents("SELECT document FROM drafts ORDER BY id").await?)
    }

    async fn insert_room<R: Serialize + Sync>(
        &self,
        id: RoomId,
        name: &str,
        room: &R,
    ) -> Result<(), StoreError> {
        let document = serde_json::to_string(room)?;
        let name = name.to_owned();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO rooms (id, name, document) VALUES (?1, ?2, ?3)",
                params![id.0 as i64, name, document],
            )
            .map_err(|e| constraint(e, || format!("room name {name:?}")))?;
            Ok(())
        })
        .await
    }

    async fn replace_room<R: Serialize + Sync>(
        &self,
        id: RoomId,
        name: &str,
        room: &R,
    ) -> Result<(), StoreError> {
        let document = serde_json::to_string(room)?;
        let name = name.to_owned();
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE rooms SET name = ?2, document = ?3 WHERE id = ?1",
                    params![id.0 as i64, name, document],
                )
                .map_err(|e| constraint(e, || format!("room name {name:?}")))?;
            if changed == 0 {
                return Err(StoreError::Missing(format!("room {id}")));
            }
            Ok(())
        })
        .await
    }

    async fn get_room<R: DeserializeOwned + Send>(&self, id: RoomId) -> Result<Option<R>, StoreError> {
        let document = self
            .document("SELECT document FROM rooms WHERE id = ?1", Key::Id(id.0 as i64))
            .await?;
        decode(document)
    }

    async fn list_rooms<R: DeserializeOwned + Send>(&self) -> Result<Vec<R>, StoreError> {
        decode_all(self.documents("SELECT document FROM rooms ORDER BY id").await?)
    }

    async fn delete_room(&self, id: RoomId) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let changed = conn.execute("DELETE FROM rooms WHERE id = ?1", params![id.0 as i64])?;
            if changed == 0 {
                return Err(StoreError::Missing(format!("room {id}")));
            }
            Ok(())
        })
        .await
    }
}
