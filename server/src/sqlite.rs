use std::path::Path;

use chrono::{DateTime, Utc};
use kernel::BlobRecord;
use rusqlite::{params, Connection, Error, OpenFlags};

use crate::domain::MetadataStore;

const CACHE_SIZE: &str = "4096";

pub enum Mode {
    ReadWrite,
    ReadOnly,
}

pub struct Sqlite {
    conn: Connection,
}

impl MetadataStore for Sqlite {
    type Err = Error;

    fn new_database(&self) -> Result<(), Self::Err> {
        self.pragma_update("encoding", "UTF-8")?;

        self.conn.execute(
            "CREATE TABLE file (
                  id             INTEGER PRIMARY KEY AUTOINCREMENT,
                  original_name  TEXT NOT NULL,
                  mime_type      TEXT NOT NULL,
                  stored_name    TEXT NOT NULL UNIQUE,
                  uploaded_at    TEXT NOT NULL
                  )",
            [],
        )?;

        self.conn
            .execute("CREATE INDEX uploaded_at_ix ON file(uploaded_at)", [])?;

        Ok(())
    }

    fn insert(
        &mut self,
        original_name: &str,
        mime_type: &str,
        stored_name: &str,
        uploaded_at: DateTime<Utc>,
    ) -> Result<i64, Self::Err> {
        self.assign_cache_size()?;
        self.pragma_update("synchronous", "FULL")?;

        self.conn
            .prepare_cached(
                "INSERT INTO file (original_name, mime_type, stored_name, uploaded_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?
            .execute(params![original_name, mime_type, stored_name, uploaded_at])?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get(&mut self, id: i64) -> Result<Option<BlobRecord>, Self::Err> {
        use rusqlite::OptionalExtension;

        self.conn
            .prepare_cached(
                "SELECT id, original_name, mime_type, stored_name, uploaded_at
                 FROM file WHERE id = ?1",
            )?
            .query_row(params![id], Self::map_record)
            .optional()
    }

    fn list_all(&mut self) -> Result<Vec<BlobRecord>, Self::Err> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, original_name, mime_type, stored_name, uploaded_at
             FROM file ORDER BY uploaded_at DESC, id DESC",
        )?;

        let rows = stmt.query_map([], Self::map_record)?;
        rows.collect()
    }

    fn delete(&mut self, id: i64) -> Result<bool, Self::Err> {
        self.pragma_update("synchronous", "FULL")?;

        let affected = self
            .conn
            .prepare_cached("DELETE FROM file WHERE id = ?1")?
            .execute(params![id])?;

        Ok(affected > 0)
    }
}

impl Sqlite {
    pub fn open<P: AsRef<Path>>(path: P, mode: Mode) -> Result<Self, Error> {
        let c = match mode {
            Mode::ReadWrite => Connection::open(path),
            Mode::ReadOnly => Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY),
        }?;
        // transient "database is locked" errors under concurrent access
        c.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(Self { conn: c })
    }

    fn map_record(row: &rusqlite::Row<'_>) -> Result<BlobRecord, Error> {
        Ok(BlobRecord {
            id: row.get(0)?,
            original_name: row.get(1)?,
            mime_type: row.get(2)?,
            path: row.get(3)?,
            uploaded_at: row.get(4)?,
        })
    }

    fn assign_cache_size(&self) -> Result<(), Error> {
        self.pragma_update("cache_size", CACHE_SIZE)
    }

    fn pragma_update(&self, name: &str, value: &str) -> Result<(), Error> {
        self.conn.pragma_update(None, name, value)
    }
}
