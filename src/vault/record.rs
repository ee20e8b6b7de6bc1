//! Identities, records and typed secret payloads.
//!
//! A `Record` payload is opaque ciphertext everywhere outside the
//! client's envelope codec. `SecretData` is the plaintext side: the
//! typed shapes a user enters before sealing.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{KeepVaultError, Result};

/// Generated identifier of a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier of a stored record, generated by the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub String);

/// Signed bearer token returned by login and registration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AuthToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are credentials; keep them out of debug output.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(..)")
    }
}

/// Kind of secret a record holds. The integer codes are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    LoginPassword,
    File,
    Text,
    CreditCard,
}

impl RecordType {
    pub const ALL: [RecordType; 4] = [
        RecordType::LoginPassword,
        RecordType::File,
        RecordType::Text,
        RecordType::CreditCard,
    ];

    /// Stable integer code stored in the metadata table.
    pub fn code(self) -> i64 {
        match self {
            Self::LoginPassword => 0,
            Self::File => 1,
            Self::Text => 2,
            Self::CreditCard => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Short name accepted on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            Self::LoginPassword => "login-password",
            Self::File => "file",
            Self::Text => "text",
            Self::CreditCard => "card",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::LoginPassword => "Login + password",
            Self::File => "Binary file",
            Self::Text => "Text",
            Self::CreditCard => "Credit card",
        };
        f.write_str(label)
    }
}

impl FromStr for RecordType {
    type Err = KeepVaultError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| KeepVaultError::InvalidRecordType(s.to_string()))
    }
}

/// A full record as stored and returned by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    pub owner: UserId,
    pub record_type: RecordType,
    /// Free-form label; for files, the path the client restores to.
    pub metadata: String,
    /// Ciphertext (`nonce || sealed bytes`) from the server's point of view.
    pub payload: Vec<u8>,
}

/// A record submitted for creation; the id and owner are assigned server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub record_type: RecordType,
    pub metadata: String,
    pub payload: Vec<u8>,
}

/// Listing entry; never carries payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
    pub id: RecordId,
    pub record_type: RecordType,
    pub metadata: String,
}

/// Login request sent to the server.
#[derive(Clone, Default)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Reject empty fields before anything reaches storage.
    pub fn validate(&self) -> Result<()> {
        if self.login.is_empty() {
            return Err(KeepVaultError::FieldIsEmpty("login"));
        }
        if self.password.is_empty() {
            return Err(KeepVaultError::FieldIsEmpty("password"));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

/// Plaintext secret before sealing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretData {
    LoginPassword { login: String, password: String },
    Text(String),
    CreditCard {
        number: String,
        expiry: String,
        cvc: String,
    },
    File { path: PathBuf },
}

impl SecretData {
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::LoginPassword { .. } => RecordType::LoginPassword,
            Self::Text(_) => RecordType::Text,
            Self::CreditCard { .. } => RecordType::CreditCard,
            Self::File { .. } => RecordType::File,
        }
    }

    /// Serialize into the plaintext bytes that get sealed.
    ///
    /// File secrets are read from disk here.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::LoginPassword { login, password } => {
                Ok(format!("{login}:{password}").into_bytes())
            }
            Self::Text(text) => Ok(text.as_bytes().to_vec()),
            Self::CreditCard {
                number,
                expiry,
                cvc,
            } => Ok(format!("{number}|{expiry}|{cvc}").into_bytes()),
            Self::File { path } => Ok(std::fs::read(path)?),
        }
    }

    /// Label stored next to the record when the caller gives none.
    pub fn default_metadata(&self) -> String {
        match self {
            Self::File { path } => file_label(path),
            other => other.record_type().to_string(),
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
