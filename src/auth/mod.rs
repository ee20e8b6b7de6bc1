//! Session authentication gate.
//!
//! `TokenIssuer` turns a user id into a bearer token after login or
//! registration; `TokenValidator` turns a presented token back into the
//! user id it was issued for. `RequestContext` is the typed call
//! metadata that carries the token alongside each record operation.

pub mod token;

use crate::errors::{KeepVaultError, Result};
use crate::vault::{AuthToken, UserId};

pub use token::HmacTokenGate;

/// Issues bearer tokens binding a user id and an expiry.
pub trait TokenIssuer: Send + Sync {
    /// Fails with `Unknown` only if signing itself fails.
    fn create_token(&self, user_id: &UserId) -> Result<AuthToken>;
}

/// Validates bearer tokens back into the user id they carry.
pub trait TokenValidator: Send + Sync {
    /// `InvalidToken` on a bad signature, unexpected algorithm, expiry,
    /// or a missing/malformed user id claim.
    fn validate_token(&self, token: &AuthToken) -> Result<UserId>;
}

/// Per-call metadata accompanying a record operation.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub token: Option<AuthToken>,
}

impl RequestContext {
    /// A context carrying `token`.
    pub fn with_token(token: AuthToken) -> Self {
        Self { token: Some(token) }
    }

    /// A context with no token.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Resolve the caller. Absence of a token is `MissingToken`, which is
    /// distinct from a token that fails validation.
    pub fn authorize(&self, validator: &dyn TokenValidator) -> Result<UserId> {
        let token = self.token.as_ref().ok_or(KeepVaultError::MissingToken)?;
        validator.validate_token(token)
    }
}
