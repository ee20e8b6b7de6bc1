//! The client's view of the RPC channel.
//!
//! `VaultConnection` is the set of calls a client can make. Errors come
//! back as `Status` values, the same shape a remote transport would
//! deliver. `LocalConnection` is an in-process channel over a
//! `VaultService`.

use std::sync::Arc;

use crate::auth::RequestContext;
use crate::errors::Status;
use crate::vault::{AuthToken, Credentials, NewRecord, Record, RecordId, RecordSummary, VaultService};

/// Result type of a channel call.
pub type CallResult<T> = std::result::Result<T, Status>;

/// Calls a client can issue against a vault server.
pub trait VaultConnection: Send + Sync {
    fn register(&self, credentials: &Credentials) -> CallResult<AuthToken>;
    fn login(&self, credentials: &Credentials) -> CallResult<AuthToken>;
    fn list_records(&self, ctx: &RequestContext) -> CallResult<Vec<RecordSummary>>;
    fn get_record(&self, ctx: &RequestContext, id: &RecordId) -> CallResult<Record>;
    fn create_record(&self, ctx: &RequestContext, record: NewRecord) -> CallResult<RecordId>;
    fn delete_record(&self, ctx: &RequestContext, id: &RecordId) -> CallResult<()>;
}

/// Channel that calls a `VaultService` in the same process.
///
/// Server errors are converted with `to_status`, so internal details are
/// dropped exactly as they would be on a network hop.
#[derive(Clone)]
pub struct LocalConnection {
    service: Arc<VaultService>,
}

impl LocalConnection {
    pub fn new(service: Arc<VaultService>) -> Self {
        Self { service }
    }
}

impl VaultConnection for LocalConnection {
    fn register(&self, credentials: &Credentials) -> CallResult<AuthToken> {
        self.service.register(credentials).map_err(|e| e.to_status())
    }

    fn login(&self, credentials: &Credentials) -> CallResult<AuthToken> {
        self.service.login(credentials).map_err(|e| e.to_status())
    }

    fn list_records(&self, ctx: &RequestContext) -> CallResult<Vec<RecordSummary>> {
        self.service.list_records(ctx).map_err(|e| e.to_status())
    }

    fn get_record(&self, ctx: &RequestContext, id: &RecordId) -> CallResult<Record> {
        self.service.get_record(ctx, id).map_err(|e| e.to_status())
    }

    fn create_record(&self, ctx: &RequestContext, record: NewRecord) -> CallResult<RecordId> {
        self.service
            .create_record(ctx, record)
            .map_err(|e| e.to_status())
    }

    fn delete_record(&self, ctx: &RequestContext, id: &RecordId) -> CallResult<()> {
        self.service.delete_record(ctx, id).map_err(|e| e.to_status())
    }
}
