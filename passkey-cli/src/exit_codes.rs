//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling scripts and CI systems to handle errors appropriately.

use passkey_core::CeremonyError;

/// Successful execution.
pub const SUCCESS: u8 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: u8 = 1;

/// Payload is malformed or fails a requested check (RP ID, origin).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: u8 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: u8 = 66;

/// Represents an exit code with optional error context.
#[derive(Debug)]
pub struct ExitCode {
    pub code: u8,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Classify error by inspecting the chain
        let code = if err.chain().any(|cause| cause.is::<std::io::Error>()) {
            INPUT_ERROR
        } else if err.chain().any(|cause| cause.is::<CeremonyError>())
            || message.contains("does not match")
        {
            DATA_ERROR
        } else {
            GENERAL_ERROR
        };

        Self {
            code,
            message: Some(message),
        }
    }
}
