//! Server-side vault orchestration.
//!
//! `VaultService` authorizes each call through the token validator, then
//! runs it against the metadata store and, for file records, the blob
//! store. The resolved `UserId` scopes every storage call.
//!
//! File records are split across the two backends: the metadata row is
//! written first (the store generates the id), then the payload goes to
//! the blob store under that id. If the blob write fails the row is
//! removed again. Deletion drops the row first and the blob second; a
//! blob failure at that point is reported but the row stays deleted.
//! `reconcile` sweeps up whatever these paths leave behind.

use std::path::Path;
use std::sync::Arc;

use crate::auth::{HmacTokenGate, RequestContext, TokenIssuer, TokenValidator};
use crate::config::Settings;
use crate::crypto::kdf::{hash_password, Argon2Params};
use crate::errors::{KeepVaultError, Result};
use crate::storage::{BlobStore, FsBlobStore, MetadataStore, SqliteMetadataStore};

use super::record::{
    AuthToken, Credentials, NewRecord, Record, RecordId, RecordSummary, RecordType, UserId,
};

/// Outcome of a reconciliation sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Blobs removed because no metadata row referenced them.
    pub orphan_blobs_removed: Vec<RecordId>,
    /// File-type rows removed because their blob was missing.
    pub orphan_rows_removed: Vec<RecordId>,
    /// Leftovers of blob writes interrupted before they committed.
    pub partial_writes_removed: usize,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.orphan_blobs_removed.is_empty()
            && self.orphan_rows_removed.is_empty()
            && self.partial_writes_removed == 0
    }
}

/// The vault orchestrator.
pub struct VaultService {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    issuer: Arc<dyn TokenIssuer>,
    validator: Arc<dyn TokenValidator>,
    password_params: Argon2Params,
}

impl VaultService {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Assemble a service from explicit capabilities.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        issuer: Arc<dyn TokenIssuer>,
        validator: Arc<dyn TokenValidator>,
        password_params: Argon2Params,
    ) -> Self {
        Self {
            metadata,
            blobs,
            issuer,
            validator,
            password_params,
        }
    }

    /// Compose the bundled backends under `data_dir` from `settings`:
    /// SQLite metadata, a blob directory, and an HMAC token gate whose
    /// expiry is fixed now.
    pub fn open(data_dir: &Path, settings: &Settings) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        if settings.uses_placeholder_secret() {
            tracing::warn!(
                "signing session tokens with the built-in placeholder secret; set token_secret \
                 or {}",
                Settings::TOKEN_SECRET_ENV
            );
        }

        let metadata = SqliteMetadataStore::open(
            &settings.database_path(data_dir),
            settings.db_timeout(),
        )?;
        let blobs = FsBlobStore::open(&settings.blob_path(data_dir))?;
        let gate = Arc::new(HmacTokenGate::with_ttl(
            settings.token_secret.as_bytes(),
            settings.token_ttl(),
        ));

        tracing::info!(
            data_dir = %data_dir.display(),
            token_expires_at = %gate.expires_at(),
            "vault service ready"
        );

        Ok(Self::new(
            Arc::new(metadata),
            Arc::new(blobs),
            gate.clone(),
            gate,
            settings.password_params(),
        ))
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Register a new user and log them in.
    pub fn register(&self, credentials: &Credentials) -> Result<AuthToken> {
        credentials.validate()?;

        let hash = self.hash(credentials)?;
        let user_id = self.metadata.create_user(&credentials.login, &hash)?;
        tracing::info!(user_id = %user_id, "registered user");

        self.issue(&user_id)
    }

    /// Check credentials and issue a token.
    ///
    /// A wrong login and a wrong password are indistinguishable to the caller.
    pub fn login(&self, credentials: &Credentials) -> Result<AuthToken> {
        credentials.validate()?;

        let hash = self.hash(credentials)?;
        let user_id = match self.metadata.find_user(&credentials.login, &hash) {
            Ok(id) => id,
            Err(KeepVaultError::WrongCredentials) => {
                tracing::info!("login rejected");
                return Err(KeepVaultError::WrongCredentials);
            }
            Err(e) => return Err(e),
        };
        tracing::debug!(user_id = %user_id, "user logged in");

        self.issue(&user_id)
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    /// List metadata of the caller's records. Never touches the blob store.
    pub fn list_records(&self, ctx: &RequestContext) -> Result<Vec<RecordSummary>> {
        let owner = ctx.authorize(self.validator.as_ref())?;
        self.metadata.list_records(&owner)
    }

    /// Fetch one of the caller's records, payload included.
    pub fn get_record(&self, ctx: &RequestContext, id: &RecordId) -> Result<Record> {
        let owner = ctx.authorize(self.validator.as_ref())?;
        let mut record = self.metadata.get_record(&owner, id)?;

        if record.record_type == RecordType::File {
            record.payload = self.blobs.get(id).map_err(|e| {
                if matches!(e, KeepVaultError::RecordNotFound) {
                    tracing::warn!(record_id = %id, "file record has no blob");
                }
                e
            })?;
        }

        Ok(record)
    }

    /// Store a record for the caller and return its id.
    pub fn create_record(&self, ctx: &RequestContext, record: NewRecord) -> Result<RecordId> {
        let owner = ctx.authorize(self.validator.as_ref())?;

        if record.record_type != RecordType::File {
            let id = self.metadata.insert_record(&owner, &record)?;
            tracing::debug!(record_id = %id, record_type = ?record.record_type, "created record");
            return Ok(id);
        }

        let NewRecord {
            record_type,
            metadata,
            payload,
        } = record;
        let row = NewRecord {
            record_type,
            metadata,
            payload: Vec::new(),
        };
        let id = self.metadata.insert_record(&owner, &row)?;

        if let Err(err) = self.blobs.put(&id, &payload) {
            match self.metadata.delete_record(&owner, &id) {
                Ok(()) => {
                    tracing::warn!(record_id = %id, "blob write failed; metadata rolled back")
                }
                Err(cleanup) => tracing::error!(
                    record_id = %id,
                    error = %cleanup,
                    "blob write failed and metadata rollback failed; row left for reconcile"
                ),
            }
            return Err(match err {
                KeepVaultError::RecordNotFound => KeepVaultError::Unknown,
                other => other,
            });
        }

        tracing::debug!(record_id = %id, bytes = payload.len(), "created file record");
        Ok(id)
    }

    /// Delete one of the caller's records and any blob it owns.
    pub fn delete_record(&self, ctx: &RequestContext, id: &RecordId) -> Result<()> {
        let owner = ctx.authorize(self.validator.as_ref())?;
        self.metadata.delete_record(&owner, id)?;

        match self.blobs.delete(id) {
            Ok(()) | Err(KeepVaultError::RecordNotFound) => {
                tracing::debug!(record_id = %id, "deleted record");
                Ok(())
            }
            Err(_) => {
                tracing::error!(record_id = %id, "metadata deleted but blob removal failed");
                Err(KeepVaultError::Unknown)
            }
        }
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Remove blobs without a metadata row, file rows without a blob, and
    /// partial blob writes.
    ///
    /// Must run while no record writes are in flight: a file record
    /// between its row insert and its blob write looks orphaned.
    pub fn reconcile(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport {
            partial_writes_removed: self.blobs.remove_partial_writes()?,
            ..ReconcileReport::default()
        };

        for id in self.blobs.list()? {
            if !self.metadata.record_exists(&id)? {
                match self.blobs.delete(&id) {
                    Ok(()) | Err(KeepVaultError::RecordNotFound) => {
                        report.orphan_blobs_removed.push(id)
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        for id in self.metadata.file_record_ids()? {
            if self.blobs.exists(&id)? {
                continue;
            }
            match self.metadata.purge_record(&id) {
                Ok(()) | Err(KeepVaultError::RecordNotFound) => {
                    report.orphan_rows_removed.push(id)
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            orphan_blobs = report.orphan_blobs_removed.len(),
            orphan_rows = report.orphan_rows_removed.len(),
            partial_writes = report.partial_writes_removed,
            "reconcile finished"
        );
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn hash(&self, credentials: &Credentials) -> Result<String> {
        hash_password(&credentials.login, &credentials.password, &self.password_params).map_err(
            |e| {
                tracing::error!(error = %e, "password hashing failed");
                KeepVaultError::Unknown
            },
        )
    }

    fn issue(&self, user_id: &UserId) -> Result<AuthToken> {
        self.issuer.create_token(user_id)
    }
}
