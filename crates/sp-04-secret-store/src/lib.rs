//! # Secret Store Subsystem
//!
//! Client for a Vault server: layered configuration and transit
//! encryption.
//!
//! ## Configuration Layering
//!
//! ```text
//! defaults (struct fields) ◄── config/global ◄── config/{path}
//!        lowest                                    highest
//! ```
//!
//! Only the keys present in the defaults are taken from the stored
//! layers, and every value is a string.
//!
//! ## Transit Encryption
//!
//! Plaintext is sent base64-encoded to `/v1/transit/encrypt/{key}`; only the
//! returned ciphertext is stored, as `{"value": ciphertext}` under
//! `{path}/{uuid}`. Reading reverses the process through
//! `/v1/transit/decrypt/{key}`.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod client;
pub mod config;
pub mod error;
pub mod ports;

pub use client::{EncryptedSecret, VaultClient};
pub use config::VaultConfig;
pub use error::SecretStoreError;
pub use ports::SecretStore;

/// Path of the configuration layer shared by every service.
pub const GLOBAL_CONFIG_PATH: &str = "config/global";

/// Path of the configuration layer for one service.
pub fn service_config_path(path: &str) -> String {
    format!("config/{path}")
}
