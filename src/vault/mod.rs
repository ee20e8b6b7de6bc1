//! Vault module: the record model and the server-side orchestrator.
//!
//! This module provides:
//! - Identity, record and typed secret types (`record`)
//! - `VaultService`, which authorizes calls and fans record operations
//!   out to the metadata and blob stores (`service`)

pub mod record;
pub mod service;

pub use record::{
    AuthToken, Credentials, NewRecord, Record, RecordId, RecordSummary, RecordType, SecretData,
    UserId,
};
pub use service::{ReconcileReport, VaultService};
