//! `keepvault get`: decrypt a single record.
//!
//! Text-like records are printed to stdout; file records are restored to
//! the path stored in their label.

use crate::cli::output;
use crate::cli::{logged_in_client, Cli};
use crate::config::Settings;
use crate::crypto::Opened;
use crate::errors::Result;
use crate::vault::RecordId;

/// Execute the `get` command.
pub fn execute(cli: &Cli, settings: &Settings, id: &str) -> Result<()> {
    let client = logged_in_client(cli, settings)?;

    match client.get_record(&RecordId::from(id))? {
        opened @ Opened::Data(_) => println!("{}", opened.display()),
        saved @ Opened::SavedFile(_) => output::success(&saved.display()),
    }

    Ok(())
}
