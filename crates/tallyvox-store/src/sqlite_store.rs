use crate::store_trait::CountStore;
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tallyvox_core::{CountRecord, SpeakerId, StoreError};

/// SQLite-backed tally store. Holds the database path and opens a connection
/// per operation; SQLite serializes concurrent writers internally.
pub struct SqliteCountStore {
    db_path: PathBuf,
}

impl SqliteCountStore {
    /// Open or create the database and ensure the tally tables exist.
    pub fn new(db_path: PathBuf) -> Result<Self, StoreError> {
        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|e| StoreError::Open(e.to_string()))?;
        // Writers from several worker threads contend on the file lock; wait
        // instead of surfacing SQLITE_BUSY.
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(|e| StoreError::Open(e.to_string()))?;
        Ok(conn)
    }

    fn init(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Open(e.to_string()))?;
        }
        let conn = self.open()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS keyword_counts (
                speaker_id INTEGER NOT NULL,
                keyword TEXT NOT NULL,
                count INTEGER NOT NULL,
                PRIMARY KEY (speaker_id, keyword)
            );

            CREATE TABLE IF NOT EXISTS speaker_names (
                speaker_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| StoreError::Open(e.to_string()))?;
        Ok(())
    }
}

impl CountStore for SqliteCountStore {
    fn increment_or_insert(
        &self,
        speaker: SpeakerId,
        keyword: &str,
        delta: u64,
    ) -> Result<(), StoreError> {
        let conn = self.open()?;
        conn.execute(
            r#"
            INSERT INTO keyword_counts (speaker_id, keyword, count)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(speaker_id, keyword)
            DO UPDATE SET count = count + ?3
            "#,
            params![speaker.0 as i64, keyword, delta as i64],
        )
        .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<CountRecord>, StoreError> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare("SELECT speaker_id, keyword, count FROM keyword_counts ORDER BY rowid")
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let rows = stmt
            .query_map([], |r| {
                Ok(CountRecord {
                    speaker: SpeakerId(r.get::<_, i64>(0)? as u64),
                    keyword: r.get(1)?,
                    count: r.get::<_, i64>(2)? as u64,
                })
            })
            .map_err(|e| StoreError::Query(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(rows)
    }

    fn record_name(&self, speaker: SpeakerId, name: &str) -> Result<(), StoreError> {
        let conn = self.open()?;
        conn.execute(
            r#"
            INSERT INTO speaker_names (speaker_id, name)
            VALUES (?1, ?2)
            ON CONFLICT(speaker_id)
            DO UPDATE SET name = excluded.name
            "#,
            params![speaker.0 as i64, name],
        )
        .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    fn read_names(&self) -> Result<Vec<(SpeakerId, String)>, StoreError> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare("SELECT speaker_id, name FROM speaker_names")
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let rows = stmt
            .query_map([], |r| {
                Ok((SpeakerId(r.get::<_, i64>(0)? as u64), r.get::<_, String>(1)?))
            })
            .map_err(|e| StoreError::Query(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(rows)
    }
}
