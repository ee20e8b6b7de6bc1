//! Storage capabilities consumed by the vault service.
//!
//! Two backends hold a user's vault:
//! - a `MetadataStore` for users, record metadata and small payloads
//! - a `BlobStore` for file-record payloads, keyed by record id
//!
//! Both are chosen at startup and injected into `VaultService`; the
//! bundled implementations are SQLite (`sqlite`) and a directory of
//! files (`blob`).

pub mod blob;
pub mod sqlite;

use crate::errors::Result;
use crate::vault::{NewRecord, Record, RecordId, RecordSummary, UserId};

pub use blob::FsBlobStore;
pub use sqlite::SqliteMetadataStore;

/// Durable storage for users and record metadata rows.
///
/// Every record operation takes the owning `UserId`; implementations
/// must never return or touch rows belonging to another owner.
/// Backend failures are logged and reported as `KeepVaultError::Unknown`.
pub trait MetadataStore: Send + Sync {
    /// Insert a user. `LoginExists` if the login is taken.
    fn create_user(&self, login: &str, password_hash: &str) -> Result<UserId>;

    /// Find the user matching both login and hash. `WrongCredentials` otherwise.
    fn find_user(&self, login: &str, password_hash: &str) -> Result<UserId>;

    /// Metadata of every record owned by `owner`.
    fn list_records(&self, owner: &UserId) -> Result<Vec<RecordSummary>>;

    /// Insert a record row and return its generated id.
    fn insert_record(&self, owner: &UserId, record: &NewRecord) -> Result<RecordId>;

    /// Fetch a record row. `RecordNotFound` if absent for this owner.
    fn get_record(&self, owner: &UserId, id: &RecordId) -> Result<Record>;

    /// Delete a record row. `RecordNotFound` if no row was affected.
    fn delete_record(&self, owner: &UserId, id: &RecordId) -> Result<()>;

    /// Ids of all file-type rows, across owners. Used by reconciliation.
    fn file_record_ids(&self) -> Result<Vec<RecordId>>;

    /// Whether any owner has a row with this id.
    fn record_exists(&self, id: &RecordId) -> Result<bool>;

    /// Delete a row regardless of owner. Administrative use only.
    fn purge_record(&self, id: &RecordId) -> Result<()>;
}

/// Durable storage for raw payload bytes, one entry per record id.
pub trait BlobStore: Send + Sync {
    /// Write (or replace) the payload for `id`.
    fn put(&self, id: &RecordId, bytes: &[u8]) -> Result<()>;

    /// Read the payload for `id`. `RecordNotFound` if there is none.
    fn get(&self, id: &RecordId) -> Result<Vec<u8>>;

    /// Whether a payload is stored for `id`, without reading it.
    fn exists(&self, id: &RecordId) -> Result<bool>;

    /// Remove the payload for `id`. `RecordNotFound` if there is none.
    fn delete(&self, id: &RecordId) -> Result<()>;

    /// Ids of every stored payload.
    fn list(&self) -> Result<Vec<RecordId>>;

    /// Drop leftovers of writes that never committed. Returns how many
    /// were removed.
    fn remove_partial_writes(&self) -> Result<usize>;
}
