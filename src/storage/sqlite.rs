//! SQLite-backed metadata store.
//!
//! Holds the `users` and `records` tables in one database file. Record
//! payloads of non-file types are stored hex-encoded in `encoded_data`;
//! file records keep that column empty and live in the blob store.
//!
//! A single connection is shared behind a mutex. Every call waits at most
//! `timeout` for that mutex, and `busy_timeout` applies the same bound to
//! waits on a locked database file. Running out of either surfaces as an
//! internal error, with no retry.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::MetadataStore;
use crate::errors::{internal, KeepVaultError, Result};
use crate::vault::{NewRecord, Record, RecordId, RecordSummary, RecordType, UserId};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        user_id       TEXT PRIMARY KEY,
        login         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at    TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS records (
        record_id    TEXT PRIMARY KEY,
        user_id      TEXT NOT NULL REFERENCES users(user_id),
        record_type  INTEGER NOT NULL,
        metadata     TEXT NOT NULL,
        encoded_data TEXT NOT NULL DEFAULT '',
        created_at   TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS records_by_owner ON records(user_id);
";

/// Metadata store over a single SQLite connection.
pub struct SqliteMetadataStore {
    conn: Mutex<Connection>,
    timeout: Duration,
}

impl SqliteMetadataStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: &Path, timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path).map_err(internal("open metadata database"))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(path, perms);
        }

        Self::init(conn, timeout)
    }

    /// Open a private in-memory database. Used by tests.
    pub fn open_in_memory(timeout: Duration) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(internal("open in-memory database"))?;
        Self::init(conn, timeout)
    }

    fn init(conn: Connection, timeout: Duration) -> Result<Self> {
        conn.busy_timeout(timeout)
            .map_err(internal("set busy timeout"))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(internal("enable foreign keys"))?;
        conn.execute_batch(SCHEMA)
            .map_err(internal("create schema"))?;

        Ok(Self {
            conn: Mutex::new(conn),
            timeout,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.try_lock_for(self.timeout).ok_or_else(|| {
            tracing::error!(
                timeout_ms = self.timeout.as_millis() as u64,
                "timed out waiting for metadata connection"
            );
            KeepVaultError::Unknown
        })
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn record_type_from_row(code: i64) -> Result<RecordType> {
    RecordType::from_code(code).ok_or_else(|| {
        tracing::error!(code, "unknown record type code in metadata row");
        KeepVaultError::Unknown
    })
}

impl MetadataStore for SqliteMetadataStore {
    fn create_user(&self, login: &str, password_hash: &str) -> Result<UserId> {
        let conn = self.conn()?;

        let taken: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE login = ?1",
                params![login],
                |row| row.get(0),
            )
            .map_err(internal("check login conflict"))?;
        if taken > 0 {
            return Err(KeepVaultError::LoginExists);
        }

        let user_id = Uuid::new_v4().to_string();
        let inserted = conn.execute(
            "INSERT INTO users (user_id, login, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, login, password_hash, Utc::now().to_rfc3339()],
        );

        match inserted {
            Ok(_) => Ok(UserId(user_id)),
            // Lost a race with a concurrent registration of the same login.
            Err(e) if is_unique_violation(&e) => Err(KeepVaultError::LoginExists),
            Err(e) => Err(internal("insert user")(e)),
        }
    }

    fn find_user(&self, login: &str, password_hash: &str) -> Result<UserId> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT user_id FROM users WHERE login = ?1 AND password_hash = ?2",
            params![login, password_hash],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(internal("look up user credentials"))?
        .map(UserId)
        .ok_or(KeepVaultError::WrongCredentials)
    }

    fn list_records(&self, owner: &UserId) -> Result<Vec<RecordSummary>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT record_id, record_type, metadata
                 FROM records
                 WHERE user_id = ?1
                 ORDER BY created_at, record_id",
            )
            .map_err(internal("prepare record listing"))?;

        let rows = stmt
            .query_map(params![owner.0], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(internal("list records"))?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, code, metadata) = row.map_err(internal("read record row"))?;
            summaries.push(RecordSummary {
                id: RecordId(id),
                record_type: record_type_from_row(code)?,
                metadata,
            });
        }

        Ok(summaries)
    }

    fn insert_record(&self, owner: &UserId, record: &NewRecord) -> Result<RecordId> {
        let conn = self.conn()?;

        let record_id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO records (record_id, user_id, record_type, metadata, encoded_data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record_id,
                owner.0,
                record.record_type.code(),
                record.metadata,
                hex::encode(&record.payload),
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(internal("insert record"))?;

        Ok(RecordId(record_id))
    }

    fn get_record(&self, owner: &UserId, id: &RecordId) -> Result<Record> {
        let conn = self.conn()?;

        let row = conn
            .query_row(
                "SELECT record_type, metadata, encoded_data
                 FROM records
                 WHERE record_id = ?1 AND user_id = ?2",
                params![id.0, owner.0],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(internal("fetch record"))?;

        let (code, metadata, encoded) = row.ok_or(KeepVaultError::RecordNotFound)?;
        let payload = hex::decode(encoded).map_err(internal("decode record payload"))?;

        Ok(Record {
            id: id.clone(),
            owner: owner.clone(),
            record_type: record_type_from_row(code)?,
            metadata,
            payload,
        })
    }

    fn delete_record(&self, owner: &UserId, id: &RecordId) -> Result<()> {
        let conn = self.conn()?;

        let affected = conn
            .execute(
                "DELETE FROM records WHERE record_id = ?1 AND user_id = ?2",
                params![id.0, owner.0],
            )
            .map_err(internal("delete record"))?;

        if affected == 0 {
            return Err(KeepVaultError::RecordNotFound);
        }
        Ok(())
    }

    fn file_record_ids(&self) -> Result<Vec<RecordId>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT record_id FROM records WHERE record_type = ?1")
            .map_err(internal("prepare file record scan"))?;
        let rows = stmt
            .query_map(params![RecordType::File.code()], |row| row.get::<_, String>(0))
            .map_err(internal("scan file records"))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(RecordId(row.map_err(internal("read file record id"))?));
        }
        Ok(ids)
    }

    fn record_exists(&self, id: &RecordId) -> Result<bool> {
        let conn = self.conn()?;

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM records WHERE record_id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .map_err(internal("check record existence"))?;
        Ok(count > 0)
    }

    fn purge_record(&self, id: &RecordId) -> Result<()> {
        let conn = self.conn()?;

        let affected = conn
            .execute("DELETE FROM records WHERE record_id = ?1", params![id.0])
            .map_err(internal("purge record"))?;
        if affected == 0 {
            return Err(KeepVaultError::RecordNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::Instant;
    use tempfile::TempDir;

    fn store() -> SqliteMetadataStore {
        SqliteMetadataStore::open_in_memory(Duration::from_secs(1)).unwrap()
    }

    fn text(metadata: &str, payload: &[u8]) -> NewRecord {
        NewRecord {
            record_type: RecordType::Text,
            metadata: metadata.to_string(),
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn open_creates_database_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.db");
        let _store = SqliteMetadataStore::open(&path, Duration::from_secs(1)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn duplicate_login_is_a_conflict() {
        let store = store();
        store.create_user("alice", "h1").unwrap();
        assert!(matches!(
            store.create_user("alice", "h2"),
            Err(KeepVaultError::LoginExists)
        ));
    }

    #[test]
    fn find_user_requires_matching_hash() {
        let store = store();
        let id = store.create_user("alice", "good").unwrap();
        assert_eq!(store.find_user("alice", "good").unwrap(), id);
        assert!(matches!(
            store.find_user("alice", "bad"),
            Err(KeepVaultError::WrongCredentials)
        ));
        assert!(matches!(
            store.find_user("mallory", "good"),
            Err(KeepVaultError::WrongCredentials)
        ));
    }

    #[test]
    fn payload_roundtrips_through_hex_column() {
        let store = store();
        let owner = store.create_user("alice", "h").unwrap();
        let bytes = vec![0u8, 1, 127, 128, 255];
        let id = store.insert_record(&owner, &text("note", &bytes)).unwrap();

        let record = store.get_record(&owner, &id).unwrap();
        assert_eq!(record.payload, bytes);
        assert_eq!(record.metadata, "note");
        assert_eq!(record.record_type, RecordType::Text);
    }

    #[test]
    fn rows_are_scoped_to_their_owner() {
        let store = store();
        let alice = store.create_user("alice", "h").unwrap();
        let bob = store.create_user("bob", "h").unwrap();
        let id = store.insert_record(&alice, &text("a", b"x")).unwrap();

        assert!(store.list_records(&bob).unwrap().is_empty());
        assert!(matches!(
            store.get_record(&bob, &id),
            Err(KeepVaultError::RecordNotFound)
        ));
        assert!(matches!(
            store.delete_record(&bob, &id),
            Err(KeepVaultError::RecordNotFound)
        ));
        assert_eq!(store.list_records(&alice).unwrap().len(), 1);
    }

    #[test]
    fn delete_reports_missing_rows() {
        let store = store();
        let owner = store.create_user("alice", "h").unwrap();
        let id = store.insert_record(&owner, &text("a", b"x")).unwrap();

        store.delete_record(&owner, &id).unwrap();
        assert!(matches!(
            store.delete_record(&owner, &id),
            Err(KeepVaultError::RecordNotFound)
        ));
    }

    #[test]
    fn file_record_scan_and_purge() {
        let store = store();
        let owner = store.create_user("alice", "h").unwrap();
        let file_id = store
            .insert_record(
                &owner,
                &NewRecord {
                    record_type: RecordType::File,
                    metadata: "a.bin".into(),
                    payload: Vec::new(),
                },
            )
            .unwrap();
        store.insert_record(&owner, &text("t", b"x")).unwrap();

        assert_eq!(store.file_record_ids().unwrap(), vec![file_id.clone()]);
        assert!(store.record_exists(&file_id).unwrap());

        store.purge_record(&file_id).unwrap();
        assert!(!store.record_exists(&file_id).unwrap());
    }

    #[test]
    fn call_fails_once_connection_wait_exceeds_timeout() {
        let store = Arc::new(
            SqliteMetadataStore::open_in_memory(Duration::from_millis(200)).unwrap(),
        );
        let owner = store.create_user("alice", "h").unwrap();

        let (locked_tx, locked_rx) = mpsc::channel();
        let holder = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let _guard = store.conn.lock();
                locked_tx.send(()).unwrap();
                thread::sleep(Duration::from_secs(2));
            })
        };
        locked_rx.recv().unwrap();

        let started = Instant::now();
        let result = store.list_records(&owner);
        let waited = started.elapsed();

        assert!(matches!(result, Err(KeepVaultError::Unknown)));
        assert!(waited >= Duration::from_millis(200));
        assert!(waited < Duration::from_millis(1500), "waited {waited:?}");

        holder.join().unwrap();
        assert!(store.list_records(&owner).unwrap().is_empty());
    }
}
