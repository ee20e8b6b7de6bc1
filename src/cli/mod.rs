//! CLI module: Clap argument parser, prompts and commands.

pub mod commands;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use zeroize::Zeroizing;

use crate::client::{LocalConnection, SessionCredentials, VaultClient};
use crate::config::Settings;
use crate::errors::{KeepVaultError, Result};
use crate::vault::VaultService;

/// Environment variable holding the account password (CI/scripted use).
pub const PASSWORD_ENV: &str = "KEEPVAULT_PASSWORD";

/// Environment variable holding the master key (CI/scripted use).
pub const MASTER_KEY_ENV: &str = "KEEPVAULT_MASTER_KEY";

/// KeepVault CLI: multi-user secret vault with client-side encryption.
#[derive(Parser)]
#[command(
    name = "keepvault",
    about = "Multi-user secret vault with client-side encryption",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the vault database, blobs and keepvault.toml
    #[arg(long, default_value = ".keepvault", global = true)]
    pub data_dir: String,

    /// Account login (prompted if omitted)
    #[arg(short, long, env = "KEEPVAULT_LOGIN", global = true)]
    pub login: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new account
    Register,

    /// List records in your vault
    List,

    /// Decrypt and show a record (file records are restored to disk)
    Get {
        /// Record id
        id: String,
    },

    /// Encrypt and store a new record
    Add {
        /// Label stored with the record (defaults to the type, or the file name)
        #[arg(long, global = true)]
        label: Option<String>,

        #[command(subcommand)]
        kind: AddKind,
    },

    /// Delete a record
    Delete {
        /// Record id
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Remove blobs and file rows that lost their counterpart
    Reconcile,
}

/// Record kinds accepted by `add`.
#[derive(clap::Subcommand)]
pub enum AddKind {
    /// A username and password pair
    LoginPassword {
        /// Username to store
        username: String,
        /// Password to store (omit for interactive prompt)
        password: Option<String>,
    },

    /// Free-form text
    Text {
        /// Text to store (omit for interactive prompt)
        text: Option<String>,
    },

    /// Credit card details
    Card {
        /// Card number
        number: String,
        /// Expiration date (e.g. 12/29)
        expiry: String,
        /// Security code (omit for interactive prompt)
        cvc: Option<String>,
    },

    /// A file from disk
    File {
        /// Path of the file to encrypt
        path: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolve `--data-dir` against the working directory.
pub fn data_dir(cli: &Cli) -> Result<PathBuf> {
    Ok(std::env::current_dir()?.join(&cli.data_dir))
}

/// Open the vault service for this data directory.
pub fn open_service(cli: &Cli, settings: &Settings) -> Result<Arc<VaultService>> {
    let dir = data_dir(cli)?;
    Ok(Arc::new(VaultService::open(&dir, settings)?))
}

/// Read a secret from `env_var`, falling back to a hidden prompt.
fn secret_from_env_or_prompt(env_var: &str, prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.is_empty() {
            return Ok(Zeroizing::new(value));
        }
    }

    let value = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|_| KeepVaultError::UserCancelled)?;
    Ok(Zeroizing::new(value))
}

/// Resolve the login from `--login` / `KEEPVAULT_LOGIN` or a prompt.
pub fn resolve_login(cli: &Cli) -> Result<String> {
    if let Some(login) = &cli.login {
        return Ok(login.clone());
    }

    dialoguer::Input::<String>::new()
        .with_prompt("Login")
        .interact_text()
        .map_err(|_| KeepVaultError::UserCancelled)
}

/// Gather login, password and master key for a session.
pub fn prompt_session_credentials(cli: &Cli) -> Result<SessionCredentials> {
    let login = resolve_login(cli)?;
    let password = secret_from_env_or_prompt(PASSWORD_ENV, "Password")?;
    let master_key = secret_from_env_or_prompt(MASTER_KEY_ENV, "Master key")?;
    Ok(SessionCredentials::new(
        login,
        password.as_str(),
        master_key.as_str(),
    ))
}

/// Prompt for a secret value that is part of a record (not a credential).
pub fn prompt_record_secret(prompt: &str) -> Result<Zeroizing<String>> {
    let value = dialoguer::Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .map_err(|_| KeepVaultError::UserCancelled)?;
    Ok(Zeroizing::new(value))
}

/// Open the service, log in, and hand back a ready client.
pub fn logged_in_client(cli: &Cli, settings: &Settings) -> Result<VaultClient<LocalConnection>> {
    let service = open_service(cli, settings)?;
    let client = VaultClient::new(LocalConnection::new(service));
    client.login(&prompt_session_credentials(cli)?)?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_card_with_label() {
        let cli = Cli::parse_from([
            "keepvault",
            "--login",
            "alice",
            "add",
            "--label",
            "visa",
            "card",
            "4111111111111111",
            "12/29",
            "123",
        ]);

        assert_eq!(cli.login.as_deref(), Some("alice"));
        match cli.command {
            Commands::Add {
                label,
                kind: AddKind::Card { number, expiry, cvc },
            } => {
                assert_eq!(label.as_deref(), Some("visa"));
                assert_eq!(number, "4111111111111111");
                assert_eq!(expiry, "12/29");
                assert_eq!(cvc.as_deref(), Some("123"));
            }
            _ => panic!("expected add card"),
        }
    }

    #[test]
    fn data_dir_defaults_to_dot_keepvault() {
        let cli = Cli::parse_from(["keepvault", "list"]);
        assert_eq!(cli.data_dir, ".keepvault");
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn delete_accepts_force_flag() {
        let cli = Cli::parse_from(["keepvault", "delete", "abc", "-f"]);
        assert!(matches!(cli.command, Commands::Delete { ref id, force: true } if id == "abc"));
    }
}
