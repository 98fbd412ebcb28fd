//! CLI integration tests for passkey-cli.
//!
//! These tests run the actual binary against hand-built payloads and check
//! outputs and exit codes.

use assert_cmd::Command;
use ciborium::value::Value;
use passkey_core::base64url;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a Command for the passkey binary.
fn passkey() -> Command {
    Command::cargo_bin("passkey").unwrap()
}

fn int(v: i64) -> Value {
    Value::Integer(v.into())
}

fn cbor(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).unwrap();
    buf
}

fn rp_id_hash(rp_id: &str) -> Vec<u8> {
    use sha2::{Digest, Sha256};
    Sha256::digest(rp_id.as_bytes()).to_vec()
}

/// Authenticator data for example.com with UP|UV|AT and an EC2 key.
fn auth_data_with_credential() -> Vec<u8> {
    let mut data = rp_id_hash("example.com");
    data.push(0x45);
    data.extend_from_slice(&7u32.to_be_bytes());
    data.extend_from_slice(&[0x2a; 16]);
    data.extend_from_slice(&4u16.to_be_bytes());
    data.extend_from_slice(b"cred");
    data.extend_from_slice(&cbor(&Value::Map(vec![
        (int(1), int(2)),
        (int(3), int(-7)),
        (int(-1), int(1)),
        (int(-2), Value::Bytes(vec![0x11; 32])),
        (int(-3), Value::Bytes(vec![0x22; 32])),
    ])));
    data
}

fn assertion_auth_data() -> Vec<u8> {
    let mut data = rp_id_hash("example.com");
    data.push(0x01);
    data.extend_from_slice(&42u32.to_be_bytes());
    data
}

fn attestation_object() -> Vec<u8> {
    cbor(&Value::Map(vec![
        (Value::Text("fmt".into()), Value::Text("packed".into())),
        (Value::Text("attStmt".into()), Value::Map(vec![])),
        (
            Value::Text("authData".into()),
            Value::Bytes(auth_data_with_credential()),
        ),
    ]))
}

fn client_data() -> Vec<u8> {
    serde_json::json!({
        "type": "webauthn.get",
        "challenge": base64url::encode([9u8; 32]),
        "origin": "https://example.com",
        "crossOrigin": false,
    })
    .to_string()
    .into_bytes()
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    passkey()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Inspect WebAuthn/FIDO2"))
        .stdout(predicate::str::contains("inspect-attestation"))
        .stdout(predicate::str::contains("inspect-auth-data"))
        .stdout(predicate::str::contains("inspect-client-data"));
}

#[test]
fn test_help_shows_exit_codes() {
    passkey()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("65"))
        .stdout(predicate::str::contains("66"));
}

#[test]
fn test_version_displays_version() {
    passkey()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("passkey"));
}

// ============================================================================
// Authenticator Data
// ============================================================================

#[test]
fn test_inspect_auth_data() {
    passkey()
        .args(["inspect-auth-data", &base64url::encode(assertion_auth_data())])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sign count"))
        .stdout(predicate::str::contains("42"))
        .stdout(predicate::str::contains("UP"));
}

#[test]
fn test_inspect_auth_data_json() {
    let output = passkey()
        .args([
            "inspect-auth-data",
            "--json",
            "--rp-id",
            "example.com",
            &base64url::encode(auth_data_with_credential()),
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["signCount"], 7);
    assert_eq!(json["rpIdMatches"], true);
    assert_eq!(json["flags"]["userVerified"], true);
    assert_eq!(json["attestedCredentialData"]["credentialId"], "Y3JlZA");
    assert_eq!(json["attestedCredentialData"]["algorithm"], "ES256");
    assert_eq!(json["attestedCredentialData"]["publicKey"]["kty"], "EC2");
}

#[test]
fn test_rp_id_mismatch_exits_with_data_error() {
    passkey()
        .args([
            "inspect-auth-data",
            "--rp-id",
            "other.example",
            &base64url::encode(assertion_auth_data()),
        ])
        .assert()
        .code(65)
        .stdout(predicate::str::contains("MISMATCH"))
        .stderr(predicate::str::contains("does not match"));
}

#[test]
fn test_truncated_auth_data_exits_with_data_error() {
    passkey()
        .args(["inspect-auth-data", &base64url::encode([0u8; 36])])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Invalid authenticator data"));
}

// ============================================================================
// Attestation Objects
// ============================================================================

#[test]
fn test_inspect_attestation_from_binary_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("attestation.cbor");
    fs::write(&path, attestation_object()).unwrap();

    passkey()
        .args(["inspect-attestation", "--file"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("packed"))
        .stdout(predicate::str::contains(
            "2a2a2a2a-2a2a-2a2a-2a2a-2a2a2a2a2a2a",
        ))
        .stdout(predicate::str::contains("ES256"));
}

#[test]
fn test_inspect_attestation_from_text_file_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("attestation.b64");
    fs::write(&path, format!("{}\n", base64url::encode(attestation_object()))).unwrap();

    let output = passkey()
        .args(["inspect-attestation", "--json", "--file"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["fmt"], "packed");
    assert_eq!(json["authData"]["signCount"], 7);
}

#[test]
fn test_malformed_attestation_exits_with_data_error() {
    passkey()
        .args(["inspect-attestation", &base64url::encode([0xa1, 0x63])])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Invalid attestation object"));
}

#[test]
fn test_missing_file_exits_with_input_error() {
    passkey()
        .args(["inspect-attestation", "--file", "/nonexistent/attestation.cbor"])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read file"));
}

// ============================================================================
// Client Data
// ============================================================================

#[test]
fn test_inspect_client_data() {
    passkey()
        .args(["inspect-client-data", &base64url::encode(client_data())])
        .assert()
        .success()
        .stdout(predicate::str::contains("webauthn.get"))
        .stdout(predicate::str::contains("(32 bytes)"))
        .stdout(predicate::str::contains("https://example.com"));
}

#[test]
fn test_client_data_origin_check() {
    let payload = base64url::encode(client_data());

    passkey()
        .args([
            "inspect-client-data",
            "--json",
            "--origin",
            "https://example.com",
            &payload,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"originMatches\": true"));

    passkey()
        .args([
            "inspect-client-data",
            "--origin",
            "https://evil.example",
            &payload,
        ])
        .assert()
        .code(65);
}

#[test]
fn test_payload_must_be_base64url() {
    passkey()
        .args(["inspect-client-data", "not base64!"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid base64url"));
}
