//! `keepvault delete`: remove a record and its stored file, if any.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{logged_in_client, Cli};
use crate::config::Settings;
use crate::errors::{KeepVaultError, Result};
use crate::vault::RecordId;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, settings: &Settings, id: &str, force: bool) -> Result<()> {
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete record '{id}'?"))
            .default(false)
            .interact()
            .map_err(|_| KeepVaultError::UserCancelled)?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let client = logged_in_client(cli, settings)?;
    client.delete_record(&RecordId::from(id))?;

    output::success(&format!("Deleted record '{id}'"));
    Ok(())
}
