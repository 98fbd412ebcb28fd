//! Inspect-client-data command implementation.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use passkey_core::{base64url, ClientData};
use serde_json::json;
use tracing::info;

use crate::utils::{read_payload, PayloadSource};

/// Execute the inspect-client-data command.
///
/// With `origin`, the client data's origin must equal it exactly.
pub fn execute(source: PayloadSource, origin: Option<String>, json: bool) -> Result<()> {
    let bytes = read_payload(&source)?;
    info!(bytes = bytes.len(), "Read client data");

    let client_data = ClientData::parse(&bytes).context("Invalid client data")?;
    let challenge_len = base64url::decode(&client_data.challenge)
        .map(|c| c.len())
        .ok();
    let origin_matches = origin.as_deref().map(|o| o == client_data.origin);

    if json {
        let mut value = json!({
            "type": client_data.ceremony_type,
            "challenge": client_data.challenge,
            "challengeBytes": challenge_len,
            "origin": client_data.origin,
            "crossOrigin": client_data.cross_origin,
            "topOrigin": client_data.top_origin,
        });
        if let Some(matches) = origin_matches {
            value["originMatches"] = json!(matches);
        }
        println!("{value:#}");
    } else {
        println!();
        println!("{}", "Client data".bold());
        println!("   {} {}", "Type:".dimmed(), client_data.ceremony_type);
        match challenge_len {
            Some(len) => println!(
                "   {} {} ({len} bytes)",
                "Challenge:".dimmed(),
                client_data.challenge
            ),
            None => println!(
                "   {} {} ({})",
                "Challenge:".dimmed(),
                client_data.challenge,
                "not base64url".red()
            ),
        }
        let origin_line = match origin_matches {
            Some(true) => client_data.origin.green().to_string(),
            Some(false) => format!("{} {}", client_data.origin.red(), "MISMATCH".red().bold()),
            None => client_data.origin.clone(),
        };
        println!("   {} {}", "Origin:".dimmed(), origin_line);
        if let Some(cross_origin) = client_data.cross_origin {
            println!("   {} {}", "Cross-origin:".dimmed(), cross_origin);
        }
        if let Some(top_origin) = &client_data.top_origin {
            println!("   {} {}", "Top origin:".dimmed(), top_origin);
        }
    }

    if origin_matches == Some(false) {
        bail!(
            "Origin {} does not match {}",
            client_data.origin,
            origin.unwrap_or_default()
        );
    }
    Ok(())
}
