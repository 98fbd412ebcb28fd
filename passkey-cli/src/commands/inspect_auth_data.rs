//! Inspect-auth-data command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use passkey_core::AuthenticatorData;
use tracing::info;

use crate::utils::{auth_data_json, ensure_rp_id, print_auth_data, read_payload, PayloadSource};

/// Execute the inspect-auth-data command.
pub fn execute(source: PayloadSource, rp_id: Option<String>, json: bool) -> Result<()> {
    let bytes = read_payload(&source)?;
    info!(bytes = bytes.len(), "Read authenticator data");

    let auth_data = AuthenticatorData::parse(&bytes).context("Invalid authenticator data")?;
    let rp_id = rp_id.as_deref();

    if json {
        println!("{:#}", auth_data_json(&auth_data, rp_id));
    } else {
        println!();
        println!("{}", "Authenticator data".bold());
        print_auth_data(&auth_data, rp_id);
    }

    ensure_rp_id(&auth_data, rp_id)
}
