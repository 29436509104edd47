//! Configuration for the Vault client

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;

/// Vault connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Server base URL.
    pub address: String,
    /// Token sent as `X-Vault-Token`; empty sends none.
    pub token: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            token: String::new(),
            timeout_secs: 30,
        }
    }
}

impl VaultConfig {
    /// Load from `VAULT_ADDR`, `VAULT_TOKEN` and `VAULT_TIMEOUT_SECS`.
    /// Unset or empty variables keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(address) = non_empty_var("VAULT_ADDR") {
            config.address = address;
        }
        if let Some(token) = non_empty_var("VAULT_TOKEN") {
            config.token = token;
        }
        if let Some(secs) = non_empty_var("VAULT_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.timeout_secs = secs;
        }
        config
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

impl fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultConfig")
            .field("address", &self.address)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VaultConfig::default();
        assert_eq!(config.address, "http://127.0.0.1:8200");
        assert!(config.token.is_empty());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_from_env() {
        env::set_var("VAULT_ADDR", "https://vault.internal:8200");
        env::set_var("VAULT_TOKEN", "s.abc");
        env::set_var("VAULT_TIMEOUT_SECS", "not-a-number");

        let config = VaultConfig::from_env();
        assert_eq!(config.address, "https://vault.internal:8200");
        assert_eq!(config.token, "s.abc");
        assert_eq!(config.timeout_secs, 30);

        env::remove_var("VAULT_ADDR");
        env::remove_var("VAULT_TOKEN");
        env::remove_var("VAULT_TIMEOUT_SECS");
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = VaultConfig {
            token: "s.secret".into(),
            ..VaultConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s.secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
