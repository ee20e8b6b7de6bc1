//! Cryptographic primitives for KeepVault.
//!
//! This module provides:
//! - AES-256-GCM sealing and opening (`encryption`)
//! - Session key derivation from the master secret (`keys`)
//! - Deterministic Argon2id password hashing for the server (`kdf`)
//! - The client-side envelope codec built on the above (`envelope`)

pub mod encryption;
pub mod envelope;
pub mod kdf;
pub mod keys;

pub use encryption::{open, seal};
pub use envelope::{EnvelopeCodec, Opened};
pub use kdf::{hash_password, Argon2Params};
pub use keys::MasterKey;
