//! Subcommand implementations.

pub mod inspect_attestation;
pub mod inspect_auth_data;
pub mod inspect_client_data;
