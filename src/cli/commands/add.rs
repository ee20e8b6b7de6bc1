//! `keepvault add`: encrypt and store a new record.

use crate::cli::output;
use crate::cli::{logged_in_client, prompt_record_secret, AddKind, Cli};
use crate::config::Settings;
use crate::errors::Result;
use crate::vault::SecretData;

/// Execute the `add` command.
pub fn execute(cli: &Cli, settings: &Settings, kind: &AddKind, label: Option<&str>) -> Result<()> {
    // Collect the secret before logging in so prompts come first.
    let secret = secret_from_args(kind)?;

    let client = logged_in_client(cli, settings)?;
    let id = client.create_record(&secret, label)?;

    output::success(&format!("Stored {} record {id}", secret.record_type()));
    Ok(())
}

/// Turn command-line arguments into a `SecretData`, prompting for any
/// omitted secret part.
fn secret_from_args(kind: &AddKind) -> Result<SecretData> {
    let secret = match kind {
        AddKind::LoginPassword { username, password } => SecretData::LoginPassword {
            login: username.clone(),
            password: match password {
                Some(p) => p.clone(),
                None => prompt_record_secret("Password to store")?.to_string(),
            },
        },
        AddKind::Text { text } => SecretData::Text(match text {
            Some(t) => t.clone(),
            None => prompt_record_secret("Text to store")?.to_string(),
        }),
        AddKind::Card {
            number,
            expiry,
            cvc,
        } => SecretData::CreditCard {
            number: number.clone(),
            expiry: expiry.clone(),
            cvc: match cvc {
                Some(c) => c.clone(),
                None => prompt_record_secret("Security code")?.to_string(),
            },
        },
        AddKind::File { path } => SecretData::File { path: path.clone() },
    };

    Ok(secret)
}
