//! Client session: token plus envelope key, behind one lock.
//!
//! `VaultClient` is what a front-end drives. Login and registration
//! replace the session; record operations read it. All calls take the
//! same mutex, so they are serialized.

pub mod connection;

use std::sync::{Mutex, MutexGuard};

use zeroize::Zeroizing;

use crate::auth::RequestContext;
use crate::crypto::{EnvelopeCodec, Opened};
use crate::errors::{KeepVaultError, Result};
use crate::vault::{AuthToken, Credentials, NewRecord, RecordId, RecordSummary, SecretData};

pub use connection::{LocalConnection, VaultConnection};

/// Everything a user supplies to open a session.
pub struct SessionCredentials {
    pub login: String,
    pub password: Zeroizing<String>,
    /// Secret the envelope key is derived from. Never sent to the server.
    pub master_key: Zeroizing<String>,
}

impl SessionCredentials {
    pub fn new(
        login: impl Into<String>,
        password: impl Into<String>,
        master_key: impl Into<String>,
    ) -> Self {
        Self {
            login: login.into(),
            password: Zeroizing::new(password.into()),
            master_key: Zeroizing::new(master_key.into()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.login.is_empty() {
            return Err(KeepVaultError::FieldIsEmpty("login"));
        }
        if self.password.is_empty() {
            return Err(KeepVaultError::FieldIsEmpty("password"));
        }
        if self.master_key.is_empty() {
            return Err(KeepVaultError::FieldIsEmpty("master key"));
        }
        Ok(())
    }

    fn server_credentials(&self) -> Credentials {
        Credentials::new(self.login.clone(), self.password.as_str())
    }
}

#[derive(Default)]
struct Session {
    token: Option<AuthToken>,
    codec: Option<EnvelopeCodec>,
}

impl Session {
    fn context(&self) -> RequestContext {
        RequestContext {
            token: self.token.clone(),
        }
    }

    fn codec(&self) -> Result<&EnvelopeCodec> {
        self.codec.as_ref().ok_or(KeepVaultError::MissingToken)
    }
}

/// A client bound to one connection and one session.
pub struct VaultClient<C: VaultConnection> {
    conn: C,
    session: Mutex<Session>,
}

impl<C: VaultConnection> VaultClient<C> {
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            session: Mutex::new(Session::default()),
        }
    }

    /// Create an account and open a session for it.
    pub fn register(&self, credentials: &SessionCredentials) -> Result<()> {
        credentials.validate()?;
        let mut session = self.lock()?;

        let token = self.conn.register(&credentials.server_credentials())?;
        Self::start(&mut session, token, credentials);
        Ok(())
    }

    /// Log in and open a session; the envelope key is re-derived from
    /// the supplied master key.
    pub fn login(&self, credentials: &SessionCredentials) -> Result<()> {
        credentials.validate()?;
        let mut session = self.lock()?;

        let token = self.conn.login(&credentials.server_credentials())?;
        Self::start(&mut session, token, credentials);
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        self.session
            .lock()
            .map(|s| s.token.is_some())
            .unwrap_or(false)
    }

    /// Metadata of every record in the vault.
    pub fn list_records(&self) -> Result<Vec<RecordSummary>> {
        let session = self.lock()?;
        Ok(self.conn.list_records(&session.context())?)
    }

    /// Fetch and open a record. File records are restored to the path in
    /// their metadata.
    pub fn get_record(&self, id: &RecordId) -> Result<Opened> {
        let session = self.lock()?;
        let codec = session.codec()?;

        let record = self.conn.get_record(&session.context(), id)?;
        codec.open_record(&record)
    }

    /// Seal `secret` and store it under `metadata` (or a default label).
    pub fn create_record(&self, secret: &SecretData, metadata: Option<&str>) -> Result<RecordId> {
        let session = self.lock()?;
        let codec = session.codec()?;

        let plaintext = Zeroizing::new(secret.to_bytes()?);
        let record = NewRecord {
            record_type: secret.record_type(),
            metadata: metadata
                .map(str::to_string)
                .unwrap_or_else(|| secret.default_metadata()),
            payload: codec.seal(&plaintext)?,
        };

        Ok(self.conn.create_record(&session.context(), record)?)
    }

    pub fn delete_record(&self, id: &RecordId) -> Result<()> {
        let session = self.lock()?;
        Ok(self.conn.delete_record(&session.context(), id)?)
    }

    fn start(session: &mut Session, token: AuthToken, credentials: &SessionCredentials) {
        session.token = Some(token);
        session.codec = Some(EnvelopeCodec::from_master_secret(
            credentials.master_key.as_bytes(),
        ));
    }

    fn lock(&self) -> Result<MutexGuard<'_, Session>> {
        self.session.lock().map_err(|_| {
            tracing::error!("client session lock poisoned");
            KeepVaultError::Unknown
        })
    }
}
