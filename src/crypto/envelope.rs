//! Client-side envelope codec.
//!
//! `EnvelopeCodec` owns the session's `MasterKey` and is the only place
//! record payloads are sealed or opened. The server never sees the key.

use std::path::Path;

use crate::errors::{KeepVaultError, Result};
use crate::vault::{Record, RecordType};

use super::encryption;
use super::keys::MasterKey;

/// Result of opening a record on the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opened {
    /// Decrypted bytes of a non-file record.
    Data(Vec<u8>),
    /// A file record was restored to disk; holds a confirmation message.
    SavedFile(String),
}

impl Opened {
    /// Human-readable rendering for terminal output.
    pub fn display(&self) -> String {
        match self {
            Self::Data(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Self::SavedFile(message) => message.clone(),
        }
    }
}

/// Seals and opens record payloads with a key derived from the master secret.
#[derive(Debug)]
pub struct EnvelopeCodec {
    key: MasterKey,
}

impl EnvelopeCodec {
    pub fn new(key: MasterKey) -> Self {
        Self { key }
    }

    /// Derive the session key from the user's master secret.
    pub fn from_master_secret(master_secret: &[u8]) -> Self {
        Self::new(MasterKey::derive(master_secret))
    }

    /// Produce `nonce || ciphertext` with a fresh nonce.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        encryption::seal(self.key.as_bytes(), plaintext)
    }

    /// Reverse [`seal`](Self::seal). Fails with `DecryptionFailed` on a
    /// wrong key or corrupted payload.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        encryption::open(self.key.as_bytes(), sealed)
    }

    /// Open a record fetched from the server.
    ///
    /// File records are written to the path stored in their metadata and
    /// a confirmation message is returned instead of the raw bytes.
    pub fn open_record(&self, record: &Record) -> Result<Opened> {
        let plaintext = self.open(&record.payload)?;

        if record.record_type != RecordType::File {
            return Ok(Opened::Data(plaintext));
        }

        if record.metadata.is_empty() {
            return Err(KeepVaultError::FieldIsEmpty("metadata"));
        }
        let target = Path::new(&record.metadata);
        std::fs::write(target, &plaintext)?;
        tracing::debug!(record_id = %record.id, path = %target.display(), "restored file record");

        Ok(Opened::SavedFile(format!(
            "Saved file successfully to {}.",
            target.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{RecordId, UserId};

    fn record(record_type: RecordType, metadata: &str, payload: Vec<u8>) -> Record {
        Record {
            id: RecordId::from("r-1"),
            owner: UserId("u-1".into()),
            record_type,
            metadata: metadata.to_string(),
            payload,
        }
    }

    #[test]
    fn open_record_returns_plaintext_for_text() {
        let codec = EnvelopeCodec::from_master_secret(b"master");
        let sealed = codec.seal(b"secret note").unwrap();
        let opened = codec
            .open_record(&record(RecordType::Text, "note", sealed))
            .unwrap();
        assert_eq!(opened, Opened::Data(b"secret note".to_vec()));
        assert_eq!(opened.display(), "secret note");
    }

    #[test]
    fn open_record_writes_file_records_to_metadata_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("restored.bin");
        let codec = EnvelopeCodec::from_master_secret(b"master");
        let sealed = codec.seal(&[0xde, 0xad, 0xbe, 0xef]).unwrap();

        let opened = codec
            .open_record(&record(
                RecordType::File,
                target.to_str().unwrap(),
                sealed,
            ))
            .unwrap();

        assert!(matches!(opened, Opened::SavedFile(ref msg) if msg.contains("restored.bin")));
        assert_eq!(std::fs::read(&target).unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn open_record_with_wrong_key_writes_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("never.bin");
        let sealed = EnvelopeCodec::from_master_secret(b"right")
            .seal(b"data")
            .unwrap();

        let result = EnvelopeCodec::from_master_secret(b"wrong").open_record(&record(
            RecordType::File,
            target.to_str().unwrap(),
            sealed,
        ));

        assert!(matches!(result, Err(KeepVaultError::DecryptionFailed)));
        assert!(!target.exists());
    }
}
