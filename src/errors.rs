use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used for every failure that is not part of the public taxonomy.
pub const INTERNAL_MESSAGE: &str = "internal error";

/// Message carried by an unauthenticated status caused by bad credentials.
const WRONG_CREDENTIALS_MESSAGE: &str = "wrong login or password";

/// Message carried by an unauthenticated status for a request without a token.
const MISSING_TOKEN_MESSAGE: &str = "missing token";

/// All errors that can occur in KeepVault.
#[derive(Debug, Error)]
pub enum KeepVaultError {
    // --- Validation ---
    #[error("{0} must not be empty")]
    FieldIsEmpty(&'static str),

    #[error("Unknown record type '{0}'")]
    InvalidRecordType(String),

    // --- Conflict ---
    #[error("Login is already taken")]
    LoginExists,

    // --- Authentication ---
    #[error("Wrong login or password")]
    WrongCredentials,

    #[error("Not logged in: no session token was presented")]
    MissingToken,

    #[error("Session is invalid or expired: log in again")]
    InvalidToken,

    // --- Lookup ---
    #[error("Record not found")]
    RecordNotFound,

    // --- Crypto errors ---
    #[error("Decryption failed: wrong master key or corrupted data")]
    DecryptionFailed,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Backend failures (details are logged, never displayed) ---
    #[error("Internal error")]
    Unknown,

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- CLI errors ---
    #[error("User cancelled operation")]
    UserCancelled,
}

/// Convenience type alias for KeepVault results.
pub type Result<T> = std::result::Result<T, KeepVaultError>;

/// Category of a failure as seen by a remote caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidArgument,
    AlreadyExists,
    Unauthenticated,
    NotFound,
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidArgument => "invalid argument",
            Self::AlreadyExists => "already exists",
            Self::Unauthenticated => "unauthenticated",
            Self::NotFound => "not found",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Structured error carried over the RPC channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct Status {
    pub code: ErrorCode,
    pub message: String,
}

impl Status {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl KeepVaultError {
    /// The wire category for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::FieldIsEmpty(_) | Self::InvalidRecordType(_) => ErrorCode::InvalidArgument,
            Self::LoginExists => ErrorCode::AlreadyExists,
            Self::WrongCredentials | Self::MissingToken | Self::InvalidToken => {
                ErrorCode::Unauthenticated
            }
            Self::RecordNotFound => ErrorCode::NotFound,
            _ => ErrorCode::Internal,
        }
    }

    /// Convert into a status that is safe to hand to a remote caller.
    ///
    /// Internal failures always collapse to a generic message.
    pub fn to_status(&self) -> Status {
        match self.code() {
            ErrorCode::Internal => Status::new(ErrorCode::Internal, INTERNAL_MESSAGE),
            ErrorCode::Unauthenticated if matches!(self, Self::WrongCredentials) => {
                Status::new(ErrorCode::Unauthenticated, WRONG_CREDENTIALS_MESSAGE)
            }
            ErrorCode::Unauthenticated if matches!(self, Self::MissingToken) => {
                Status::new(ErrorCode::Unauthenticated, MISSING_TOKEN_MESSAGE)
            }
            code => Status::new(code, self.to_string()),
        }
    }

    /// Map a received status back onto the local taxonomy.
    pub fn from_status(status: &Status) -> Self {
        match status.code {
            ErrorCode::InvalidArgument => match status.message.as_str() {
                m if m.starts_with("login") => Self::FieldIsEmpty("login"),
                m if m.starts_with("password") => Self::FieldIsEmpty("password"),
                m if m.starts_with("metadata") => Self::FieldIsEmpty("metadata"),
                _ => Self::FieldIsEmpty("request field"),
            },
            ErrorCode::AlreadyExists => Self::LoginExists,
            ErrorCode::Unauthenticated if status.message == WRONG_CREDENTIALS_MESSAGE => {
                Self::WrongCredentials
            }
            ErrorCode::Unauthenticated if status.message == MISSING_TOKEN_MESSAGE => {
                Self::MissingToken
            }
            ErrorCode::Unauthenticated => Self::InvalidToken,
            ErrorCode::NotFound => Self::RecordNotFound,
            ErrorCode::Internal => Self::Unknown,
        }
    }
}

impl From<Status> for KeepVaultError {
    fn from(status: Status) -> Self {
        Self::from_status(&status)
    }
}

/// Log a backend failure with full detail and collapse it to `Unknown`.
///
/// Use as `.map_err(internal("insert record"))`.
pub fn internal<E: fmt::Display>(context: &'static str) -> impl FnOnce(E) -> KeepVaultError {
    move |e| {
        tracing::error!(error = %e, "{context} failed");
        KeepVaultError::Unknown
    }
}
