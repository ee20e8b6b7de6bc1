//! Colored terminal output helpers.
//!
//! Every command prints through these so styling stays consistent.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::RecordSummary;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Build the records table (ID, Type, Label) without printing it.
pub fn records_table(records: &[RecordSummary]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Type", "Label"]);

    for r in records {
        table.add_row(vec![
            r.id.to_string(),
            r.record_type.to_string(),
            r.metadata.clone(),
        ]);
    }

    table
}

/// Print the records table, or a hint when the vault is empty.
pub fn print_records_table(records: &[RecordSummary]) {
    if records.is_empty() {
        info("No records in this vault yet.");
        tip("Run `keepvault add <type> ...` to store your first record.");
        return;
    }

    println!("{}", records_table(records));
}
