use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::Argon2Params;
use crate::errors::{KeepVaultError, Result};

/// Placeholder secret used when none is configured. The server logs a
/// warning whenever it signs tokens with it.
pub const PLACEHOLDER_TOKEN_SECRET: &str = "change-me-keepvault-token-secret";

/// Server and client configuration, loaded from `<data_dir>/keepvault.toml`.
///
/// Every field has a sensible default so KeepVault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// SQLite file holding users and record metadata, relative to the data dir.
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Directory holding file-record payloads, relative to the data dir.
    #[serde(default = "default_blob_dir")]
    pub blob_dir: String,

    /// HMAC secret used to sign session tokens.
    #[serde(default = "default_token_secret")]
    pub token_secret: String,

    /// Lifetime of tokens issued by this process, in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Upper bound on a single metadata-store call, in milliseconds.
    #[serde(default = "default_db_timeout_ms")]
    pub db_timeout_ms: u64,

    /// `tracing` filter directive (e.g. "info", "keepvault=debug").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Argon2 memory cost in KiB for password hashing.
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count.
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree.
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_database_file() -> String {
    "vault.db".to_string()
}

fn default_blob_dir() -> String {
    "files".to_string()
}

fn default_token_secret() -> String {
    PLACEHOLDER_TOKEN_SECRET.to_string()
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_db_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_argon2_memory_kib() -> u32 {
    19_456
}

fn default_argon2_iterations() -> u32 {
    2
}

fn default_argon2_parallelism() -> u32 {
    1
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
            blob_dir: default_blob_dir(),
            token_secret: default_token_secret(),
            token_ttl_secs: default_token_ttl_secs(),
            db_timeout_ms: default_db_timeout_ms(),
            log_level: default_log_level(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the data directory.
    const FILE_NAME: &'static str = "keepvault.toml";

    /// Environment variable overriding `token_secret`.
    pub const TOKEN_SECRET_ENV: &'static str = "KEEPVAULT_TOKEN_SECRET";

    /// Environment variable overriding `log_level`.
    pub const LOG_ENV: &'static str = "KEEPVAULT_LOG";

    /// Load settings from `<data_dir>/keepvault.toml`, then apply
    /// environment overrides.
    ///
    /// If the file does not exist, defaults are used.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let mut settings = Self::load_file(data_dir)?;

        if let Ok(secret) = std::env::var(Self::TOKEN_SECRET_ENV) {
            if !secret.is_empty() {
                settings.token_secret = secret;
            }
        }
        if let Ok(level) = std::env::var(Self::LOG_ENV) {
            if !level.is_empty() {
                settings.log_level = level;
            }
        }

        Ok(settings)
    }

    /// Load only the config file, without environment overrides.
    pub fn load_file(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        toml::from_str(&contents).map_err(|e| {
            KeepVaultError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })
    }

    /// Full path to the SQLite metadata database.
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.database_file)
    }

    /// Full path to the blob directory.
    pub fn blob_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.blob_dir)
    }

    pub fn db_timeout(&self) -> Duration {
        Duration::from_millis(self.db_timeout_ms)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    /// Whether tokens would be signed with the built-in placeholder.
    pub fn uses_placeholder_secret(&self) -> bool {
        self.token_secret == PLACEHOLDER_TOKEN_SECRET
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn password_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.database_file, "vault.db");
        assert_eq!(s.blob_dir, "files");
        assert_eq!(s.token_ttl_secs, 3600);
        assert_eq!(s.db_timeout(), Duration::from_secs(5));
        assert!(s.uses_placeholder_secret());
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load_file(tmp.path()).unwrap();
        assert_eq!(settings.blob_dir, "files");
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
database_file = "meta.sqlite"
blob_dir = "blobs"
token_secret = "s3cr3t"
token_ttl_secs = 60
db_timeout_ms = 250
log_level = "debug"
argon2_memory_kib = 8192
argon2_iterations = 1
argon2_parallelism = 2
"#;
        fs::write(tmp.path().join("keepvault.toml"), config).unwrap();

        let settings = Settings::load_file(tmp.path()).unwrap();
        assert_eq!(settings.database_file, "meta.sqlite");
        assert_eq!(settings.blob_dir, "blobs");
        assert_eq!(settings.token_secret, "s3cr3t");
        assert_eq!(settings.token_ttl(), Duration::from_secs(60));
        assert_eq!(settings.db_timeout(), Duration::from_millis(250));
        assert_eq!(settings.log_level, "debug");
        assert_eq!(
            settings.password_params(),
            Argon2Params {
                memory_kib: 8192,
                iterations: 1,
                parallelism: 2,
            }
        );
        assert!(!settings.uses_placeholder_secret());
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("keepvault.toml"), "token_ttl_secs = 10\n").unwrap();

        let settings = Settings::load_file(tmp.path()).unwrap();
        assert_eq!(settings.token_ttl_secs, 10);
        assert_eq!(settings.database_file, "vault.db");
        assert_eq!(settings.db_timeout_ms, 5000);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("keepvault.toml"), "not valid {{toml").unwrap();

        let result = Settings::load_file(tmp.path());
        assert!(matches!(result, Err(KeepVaultError::Config(_))));
    }

    #[test]
    fn paths_are_resolved_against_data_dir() {
        let s = Settings::default();
        let data = Path::new("/srv/keepvault");
        assert_eq!(
            s.database_path(data),
            PathBuf::from("/srv/keepvault/vault.db")
        );
        assert_eq!(s.blob_path(data), PathBuf::from("/srv/keepvault/files"));
    }
}
