//! `keepvault register`: create an account.

use crate::cli::output;
use crate::cli::{open_service, prompt_session_credentials, Cli};
use crate::client::{LocalConnection, VaultClient};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `register` command.
pub fn execute(cli: &Cli, settings: &Settings) -> Result<()> {
    let service = open_service(cli, settings)?;
    let client = VaultClient::new(LocalConnection::new(service));

    let credentials = prompt_session_credentials(cli)?;
    client.register(&credentials)?;

    output::success(&format!("Registered '{}'", credentials.login));
    output::tip("Keep your master key safe: records cannot be opened without it.");

    Ok(())
}
