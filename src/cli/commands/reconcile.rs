//! `keepvault reconcile`: sweep blobs and file rows that lost their pair.
//!
//! Operates on the whole data directory and needs no login. Run it while
//! nothing else is writing to the vault.

use crate::cli::output;
use crate::cli::{open_service, Cli};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `reconcile` command.
pub fn execute(cli: &Cli, settings: &Settings) -> Result<()> {
    let service = open_service(cli, settings)?;
    let report = service.reconcile()?;

    if report.is_clean() {
        output::success("Vault is consistent; nothing to remove.");
        return Ok(());
    }

    output::success(&format!(
        "Removed {} orphaned file(s), {} dangling record(s) and {} partial write(s)",
        report.orphan_blobs_removed.len(),
        report.orphan_rows_removed.len(),
        report.partial_writes_removed
    ));
    Ok(())
}
