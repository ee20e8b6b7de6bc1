//! Session key material held by the client.
//!
//! The envelope key is a one-way SHA-256 hash of the master secret the
//! user types at login or registration. It lives only in memory and is
//! zeroed on drop; nothing here is ever sent to the server.

use sha2::{Digest, Sha256};
use zeroize::Zeroize;

/// Length of the envelope key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// A 32-byte symmetric key that zeroes its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Derive the envelope key from a user-held master secret.
    ///
    /// Deterministic: the same secret always yields the same key, so the
    /// key can be rebuilt on every login.
    pub fn derive(master_secret: &[u8]) -> Self {
        let digest = Sha256::digest(master_secret);
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&digest);
        Self { bytes }
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic() {
        let a = MasterKey::derive(b"correct horse");
        let b = MasterKey::derive(b"correct horse");
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_secrets_give_different_keys() {
        let a = MasterKey::derive(b"one");
        let b = MasterKey::derive(b"two");
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn debug_does_not_print_key_bytes() {
        let key = MasterKey::new([0xAB; KEY_LEN]);
        assert_eq!(format!("{key:?}"), "MasterKey(..)");
    }
}
