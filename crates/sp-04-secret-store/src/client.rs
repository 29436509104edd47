//! # Vault Client
//!
//! HTTP client for the KV and transit endpoints of a Vault server.

use crate::config::VaultConfig;
use crate::error::SecretStoreError;
use crate::ports::SecretStore;
use crate::{service_config_path, GLOBAL_CONFIG_PATH};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

const TOKEN_HEADER: &str = "X-Vault-Token";

/// Location and ciphertext of a value stored by `write_encrypted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedSecret {
    /// Full path the value was written to, `{path}/{uuid}`.
    pub path: String,
    /// Transit ciphertext, e.g. `vault:v1:...`.
    pub ciphertext: String,
}

/// `{"data": {...}}` envelope Vault wraps responses in.
#[derive(Debug, Deserialize)]
struct DataResponse {
    data: Option<Map<String, Value>>,
}

/// Vault HTTP client.
#[derive(Clone)]
pub struct VaultClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("base_url", &self.base_url.as_str())
            .field("has_token", &!self.token.is_empty())
            .finish()
    }
}

impl VaultClient {
    /// Client for `config`.
    ///
    /// # Errors
    ///
    /// [`SecretStoreError::NotInitialized`] when the address is not a valid
    /// URL or the HTTP client cannot be built.
    pub fn new(config: VaultConfig) -> Result<Self, SecretStoreError> {
        let base_url = Url::parse(&config.address).map_err(|e| {
            SecretStoreError::NotInitialized(format!("invalid address {:?}: {e}", config.address))
        })?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SecretStoreError::NotInitialized(e.to_string()))?;

        info!(address = %base_url, "Vault client initialised");
        Ok(Self {
            client,
            base_url,
            token: config.token,
        })
    }

    /// Client configured from `VAULT_ADDR`, `VAULT_TOKEN` and
    /// `VAULT_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, SecretStoreError> {
        Self::new(VaultConfig::from_env())
    }

    /// Server base URL.
    pub fn address(&self) -> &Url {
        &self.base_url
    }

    /// Flatten `defaults` (a struct of string fields) and overlay the global
    /// and `config/{path}` layers onto it.
    pub async fn config_map<T: Serialize>(
        &self,
        path: &str,
        defaults: &T,
    ) -> Result<BTreeMap<String, String>, SecretStoreError> {
        self.merged_config(path, flatten_defaults(defaults)?).await
    }

    /// [`VaultClient::config_map`] deserialized back into `T`.
    pub async fn load_config<T>(&self, path: &str, defaults: &T) -> Result<T, SecretStoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        let merged = self.config_map(path, defaults).await?;
        let value = serde_json::to_value(merged).map_err(|e| SecretStoreError::Parse(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| SecretStoreError::Parse(e.to_string()))
    }

    fn url(&self, path: &str) -> Result<Url, SecretStoreError> {
        self.base_url
            .join(&format!("v1/{}", path.trim_start_matches('/')))
            .map_err(|e| SecretStoreError::Parse(format!("invalid path {path:?}: {e}")))
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<DataResponse>, SecretStoreError> {
        let url = self.url(path)?;
        let mut request = self.client.request(method.clone(), url);
        if !self.token.is_empty() {
            request = request.header(TOKEN_HEADER, &self.token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(method = %method, path, status = status.as_u16(), "Vault request");

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SecretStoreError::Status {
                status: status.as_u16(),
                path: path.to_string(),
                body,
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Some(DataResponse { data: None }));
        }

        let parsed = response
            .json::<DataResponse>()
            .await
            .map_err(|e| SecretStoreError::Parse(e.to_string()))?;
        Ok(Some(parsed))
    }

    async fn transit(
        &self,
        operation: &str,
        key: &str,
        body: Value,
        field: &str,
    ) -> Result<String, SecretStoreError> {
        let path = format!("transit/{operation}/{key}");
        let response = self
            .request(Method::POST, &path, Some(body))
            .await?
            .ok_or_else(|| SecretStoreError::Status {
                status: StatusCode::NOT_FOUND.as_u16(),
                path: path.clone(),
                body: String::new(),
            })?;
        string_field(response.data.as_ref(), field)
    }
}

#[async_trait]
impl SecretStore for VaultClient {
    async fn read(&self, path: &str) -> Result<Option<Map<String, Value>>, SecretStoreError> {
        Ok(self
            .request(Method::GET, path, None)
            .await?
            .map(|response| response.data.unwrap_or_default()))
    }

    async fn write(&self, path: &str, data: Map<String, Value>) -> Result<(), SecretStoreError> {
        self.request(Method::PUT, path, Some(Value::Object(data)))
            .await?
            .ok_or_else(|| SecretStoreError::Status {
                status: StatusCode::NOT_FOUND.as_u16(),
                path: path.to_string(),
                body: String::new(),
            })?;
        debug!(path, "Vault write");
        Ok(())
    }

    async fn merged_config(
        &self,
        path: &str,
        mut defaults: BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, SecretStoreError> {
        for layer in [GLOBAL_CONFIG_PATH.to_string(), service_config_path(path)] {
            match self.read(&layer).await? {
                Some(data) => overlay(&mut defaults, &data)?,
                None => debug!(layer = %layer, "Config layer absent"),
            }
        }
        Ok(defaults)
    }

    async fn encrypt(&self, key: &str, plaintext: &[u8]) -> Result<String, SecretStoreError> {
        let body = json!({ "plaintext": BASE64.encode(plaintext) });
        self.transit("encrypt", key, body, "ciphertext").await
    }

    async fn decrypt(&self, key: &str, ciphertext: &str) -> Result<Vec<u8>, SecretStoreError> {
        let body = json!({ "ciphertext": ciphertext });
        let plaintext = self.transit("decrypt", key, body, "plaintext").await?;
        Ok(BASE64.decode(plaintext)?)
    }

    async fn write_encrypted(
        &self,
        key: &str,
        path: &str,
        value: &[u8],
    ) -> Result<EncryptedSecret, SecretStoreError> {
        let ciphertext = self.encrypt(key, value).await?;
        let target = format!("{}/{}", path.trim_end_matches('/'), Uuid::new_v4());

        let mut data = Map::new();
        data.insert("value".to_string(), Value::String(ciphertext.clone()));
        if let Err(e) = self.write(&target, data).await {
            warn!(path = %target, error = %e, "Failed to store encrypted value");
            return Err(e);
        }

        Ok(EncryptedSecret {
            path: target,
            ciphertext,
        })
    }

    async fn read_encrypted(
        &self,
        key: &str,
        path: &str,
    ) -> Result<Option<Vec<u8>>, SecretStoreError> {
        let Some(data) = self.read(path).await? else {
            return Ok(None);
        };
        let ciphertext = string_field(Some(&data), "value")?;
        self.decrypt(key, &ciphertext).await.map(Some)
    }
}

fn string_field(data: Option<&Map<String, Value>>, field: &str) -> Result<String, SecretStoreError> {
    data.and_then(|d| d.get(field))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SecretStoreError::MissingField(field.to_string()))
}

/// String fields of `defaults` as a map.
fn flatten_defaults<T: Serialize>(defaults: &T) -> Result<BTreeMap<String, String>, SecretStoreError> {
    let value = serde_json::to_value(defaults).map_err(|e| SecretStoreError::Parse(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(SecretStoreError::UnsupportedField("<root>".to_string()));
    };

    fields
        .into_iter()
        .map(|(name, value)| match value {
            Value::String(s) => Ok((name, s)),
            _ => Err(SecretStoreError::UnsupportedField(name)),
        })
        .collect()
}

/// Replace values for keys already in `target` with string values in `layer`.
fn overlay(
    target: &mut BTreeMap<String, String>,
    layer: &Map<String, Value>,
) -> Result<(), SecretStoreError> {
    for (name, current) in target.iter_mut() {
        match layer.get(name) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => *current = s.clone(),
            Some(_) => return Err(SecretStoreError::UnsupportedField(name.clone())),
        }
    }
    Ok(())
}
