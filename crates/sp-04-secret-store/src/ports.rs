//! Secret store port.

use crate::client::EncryptedSecret;
use crate::error::SecretStoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Operations services need from a secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Data stored at `path`, `None` when absent.
    async fn read(&self, path: &str) -> Result<Option<Map<String, Value>>, SecretStoreError>;

    /// Replace the data at `path`.
    async fn write(&self, path: &str, data: Map<String, Value>) -> Result<(), SecretStoreError>;

    /// `defaults` overlaid with the global layer, then the layer for `path`.
    async fn merged_config(
        &self,
        path: &str,
        defaults: BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, SecretStoreError>;

    /// Encrypt `plaintext` with transit key `key`.
    async fn encrypt(&self, key: &str, plaintext: &[u8]) -> Result<String, SecretStoreError>;

    /// Decrypt `ciphertext` with transit key `key`.
    async fn decrypt(&self, key: &str, ciphertext: &str) -> Result<Vec<u8>, SecretStoreError>;

    /// Encrypt `value` and store the ciphertext under a fresh child of `path`.
    async fn write_encrypted(
        &self,
        key: &str,
        path: &str,
        value: &[u8],
    ) -> Result<EncryptedSecret, SecretStoreError>;

    /// Read and decrypt a value stored by [`SecretStore::write_encrypted`].
    async fn read_encrypted(&self, key: &str, path: &str)
        -> Result<Option<Vec<u8>>, SecretStoreError>;
}
