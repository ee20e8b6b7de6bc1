//! `keepvault list`: show every record's id, type and label.

use crate::cli::output;
use crate::cli::{logged_in_client, Cli};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli, settings: &Settings) -> Result<()> {
    let client = logged_in_client(cli, settings)?;
    let records = client.list_records()?;

    output::print_records_table(&records);
    Ok(())
}
