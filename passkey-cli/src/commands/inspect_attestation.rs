//! Inspect-attestation command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use passkey_core::{AttestationObject, AuthenticatorData};
use serde_json::json;
use tracing::{debug, info};

use crate::utils::{auth_data_json, ensure_rp_id, print_auth_data, read_payload, PayloadSource};

/// Execute the inspect-attestation command.
pub fn execute(source: PayloadSource, rp_id: Option<String>, json: bool) -> Result<()> {
    let bytes = read_payload(&source)?;
    info!(bytes = bytes.len(), "Read attestation object");

    let attestation = AttestationObject::parse(&bytes).context("Invalid attestation object")?;
    debug!(fmt = attestation.fmt, att_stmt_bytes = attestation.att_stmt.len(), "Decoded attestation object");

    let auth_data =
        AuthenticatorData::parse(attestation.auth_data).context("Invalid authenticator data")?;
    let rp_id = rp_id.as_deref();

    if json {
        let value = json!({
            "fmt": attestation.fmt,
            "attStmt": hex::encode(attestation.att_stmt),
            "authData": auth_data_json(&auth_data, rp_id),
        });
        println!("{value:#}");
    } else {
        println!();
        println!("{}", "Attestation object".bold());
        println!("   {} {}", "Format:".dimmed(), attestation.fmt);
        println!(
            "   {} {} bytes (not verified)",
            "Statement:".dimmed(),
            attestation.att_stmt.len()
        );
        println!();
        println!("{}", "Authenticator data".bold());
        print_auth_data(&auth_data, rp_id);
        if auth_data.attested_credential_data.is_none() {
            println!();
            println!(
                "   {}",
                "No attested credential data (AT flag clear)".yellow()
            );
        }
    }

    ensure_rp_id(&auth_data, rp_id)
}
