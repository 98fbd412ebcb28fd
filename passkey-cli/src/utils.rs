//! Common utility functions shared across CLI commands.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use colored::Colorize;
use passkey_core::credential::format_aaguid;
use passkey_core::{base64url, AuthenticatorData};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Where a payload comes from: an inline base64url argument or a file.
pub struct PayloadSource {
    pub payload: Option<String>,
    pub file: Option<PathBuf>,
}

/// Load the payload bytes.
///
/// Files holding base64url text are decoded; anything else is taken as raw
/// bytes. A file path of `-` reads stdin.
pub fn read_payload(source: &PayloadSource) -> Result<Vec<u8>> {
    match (&source.payload, &source.file) {
        (Some(payload), None) => decode_text(payload),
        (None, Some(path)) => {
            let bytes = read_file(path)?;
            match std::str::from_utf8(&bytes) {
                Ok(text) if base64url::decode(text.trim()).is_ok() => {
                    debug!(path = %path.display(), "Decoding base64url file contents");
                    decode_text(text)
                }
                _ => {
                    debug!(path = %path.display(), bytes = bytes.len(), "Using raw file contents");
                    Ok(bytes)
                }
            }
        }
        (Some(_), Some(_)) => bail!("Pass either a PAYLOAD argument or --file, not both"),
        (None, None) => bail!("Missing payload: pass a base64url PAYLOAD or --file <PATH>"),
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read stdin")?;
        return Ok(bytes);
    }
    std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

fn decode_text(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    if text.is_empty() {
        bail!("Payload is empty");
    }
    base64url::decode(text).context("Payload is not valid base64url")
}

/// JSON rendering of parsed authenticator data.
pub fn auth_data_json(auth_data: &AuthenticatorData, rp_id: Option<&str>) -> Value {
    let flags = auth_data.flags;
    let mut value = json!({
        "rpIdHash": hex::encode(auth_data.rp_id_hash),
        "flags": {
            "raw": flags.0,
            "userPresent": flags.user_present(),
            "userVerified": flags.user_verified(),
            "backupEligible": flags.backup_eligible(),
            "backedUp": flags.backed_up(),
            "attestedCredentialData": flags.attested_credential_data(),
            "extensionData": flags.extension_data(),
        },
        "signCount": auth_data.sign_count,
    });

    if let Some(rp_id) = rp_id {
        value["rpIdMatches"] = json!(auth_data.matches_rp_id(rp_id));
    }
    if let Some(attested) = &auth_data.attested_credential_data {
        value["attestedCredentialData"] = json!({
            "aaguid": format_aaguid(&attested.aaguid),
            "credentialId": base64url::encode(&attested.credential_id),
            "algorithm": attested.credential_public_key.algorithm().as_str(),
            "publicKey": attested.credential_public_key,
        });
    }
    if let Some(extensions) = &auth_data.extensions {
        value["extensions"] = json!(hex::encode(extensions));
    }
    value
}

/// Colored rendering of parsed authenticator data.
pub fn print_auth_data(auth_data: &AuthenticatorData, rp_id: Option<&str>) {
    let flags = auth_data.flags;
    println!(
        "   {} {}",
        "RP ID hash:".dimmed(),
        hex::encode(auth_data.rp_id_hash)
    );
    if let Some(rp_id) = rp_id {
        if auth_data.matches_rp_id(rp_id) {
            println!("   {} {}", "RP ID:".dimmed(), format!("matches {rp_id}").green());
        } else {
            println!(
                "   {} {} (expected {})",
                "RP ID:".dimmed(),
                "MISMATCH".red().bold(),
                hex::encode(Sha256::digest(rp_id.as_bytes()))
            );
        }
    }
    println!(
        "   {} 0x{:02x} [{}]",
        "Flags:".dimmed(),
        flags.0,
        flag_names(auth_data).join(" ")
    );
    println!("   {} {}", "Sign count:".dimmed(), auth_data.sign_count);

    if let Some(attested) = &auth_data.attested_credential_data {
        println!();
        println!("   {}", "Attested credential".bold());
        println!("   {} {}", "AAGUID:".dimmed(), format_aaguid(&attested.aaguid));
        println!(
            "   {} {}",
            "Credential ID:".dimmed(),
            base64url::encode(&attested.credential_id)
        );
        println!(
            "   {} {}",
            "Algorithm:".dimmed(),
            attested.credential_public_key.algorithm().as_str()
        );
    }
    if let Some(extensions) = &auth_data.extensions {
        println!("   {} {} bytes", "Extensions:".dimmed(), extensions.len());
    }
}

fn flag_names(auth_data: &AuthenticatorData) -> Vec<&'static str> {
    let flags = auth_data.flags;
    [
        (flags.user_present(), "UP"),
        (flags.user_verified(), "UV"),
        (flags.backup_eligible(), "BE"),
        (flags.backed_up(), "BS"),
        (flags.attested_credential_data(), "AT"),
        (flags.extension_data(), "ED"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect()
}

/// Fail when an `--rp-id` check was requested and does not hold.
pub fn ensure_rp_id(auth_data: &AuthenticatorData, rp_id: Option<&str>) -> Result<()> {
    match rp_id {
        Some(rp_id) if !auth_data.matches_rp_id(rp_id) => {
            bail!("RP ID hash does not match {rp_id}")
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_inline_payload() {
        let source = PayloadSource {
            payload: Some(" AQID \n".to_string()),
            file: None,
        };
        assert_eq!(read_payload(&source).unwrap(), [1, 2, 3]);
    }

    #[test]
    fn test_file_payload_text_and_binary() {
        let mut text = tempfile::NamedTempFile::new().unwrap();
        writeln!(text, "AQID").unwrap();
        let source = PayloadSource {
            payload: None,
            file: Some(text.path().to_path_buf()),
        };
        assert_eq!(read_payload(&source).unwrap(), [1, 2, 3]);

        let mut binary = tempfile::NamedTempFile::new().unwrap();
        binary.write_all(&[0xa3, 0x00, 0xff]).unwrap();
        let source = PayloadSource {
            payload: None,
            file: Some(binary.path().to_path_buf()),
        };
        assert_eq!(read_payload(&source).unwrap(), [0xa3, 0x00, 0xff]);
    }

    #[test]
    fn test_missing_or_conflicting_payload() {
        let none = PayloadSource {
            payload: None,
            file: None,
        };
        assert!(read_payload(&none).is_err());

        let both = PayloadSource {
            payload: Some("AQID".into()),
            file: Some(PathBuf::from("x")),
        };
        assert!(read_payload(&both).is_err());
    }
}
