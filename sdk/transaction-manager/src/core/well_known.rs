//! Client identity published at `{origin}/.well-known/revibase.json`.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use crate::core::connection::BoxError;
use crate::error::{Result, TransactionManagerError};

pub const WELL_KNOWN_PATH: &str = "/.well-known/revibase.json";

/// Body of the well-known document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellKnownDocument {
    /// Base64url-encoded client JWK
    pub jwk: Option<String>,
    pub trusted_devices: Option<Vec<String>>,
}

/// Fetches the well-known document of a client origin.
#[async_trait]
pub trait WellKnownFetcher: Send + Sync {
    async fn fetch(&self, origin: &str) -> std::result::Result<WellKnownDocument, BoxError>;
}

/// [`WellKnownFetcher`] over HTTPS, optionally through a proxy that takes
/// the origin as a query parameter.
pub struct HttpWellKnownFetcher {
    client: reqwest::Client,
    proxy_url: Option<String>,
}

impl HttpWellKnownFetcher {
    pub fn new(timeout: Duration, proxy_url: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransactionManagerError::Config(e.to_string()))?;
        Ok(Self { client, proxy_url })
    }

    fn request(&self, origin: &str) -> reqwest::RequestBuilder {
        match &self.proxy_url {
            Some(proxy) => self.client.get(proxy).query(&[("origin", origin)]),
            None => self
                .client
                .get(format!("{}{WELL_KNOWN_PATH}", origin.trim_end_matches('/'))),
        }
    }
}

#[async_trait]
impl WellKnownFetcher for HttpWellKnownFetcher {
    async fn fetch(&self, origin: &str) -> std::result::Result<WellKnownDocument, BoxError> {
        let document = self
            .request(origin)
            .send()
            .await?
            .error_for_status()?
            .json::<WellKnownDocument>()
            .await?;
        Ok(document)
    }
}

/// A client's trusted key material as cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellKnownClient {
    pub client_jwk: String,
    pub trusted_device_jwks: Option<Vec<String>>,
    /// Unix time in milliseconds
    pub cached_at: u64,
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Per-origin cache of well-known documents.
///
/// Entries are never mutated; a refresh replaces the whole entry.
pub struct WellKnownCache {
    fetcher: Arc<dyn WellKnownFetcher>,
    ttl_ms: u64,
    entries: RwLock<HashMap<String, Arc<WellKnownClient>>>,
}

impl WellKnownCache {
    pub fn new(fetcher: Arc<dyn WellKnownFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl_ms: ttl.as_millis() as u64,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, origin: &str) -> Result<Arc<WellKnownClient>> {
        let now = now_ms();
        if let Some(entry) = self.entries.read().await.get(origin) {
            if now.saturating_sub(entry.cached_at) < self.ttl_ms {
                tracing::trace!(origin, "well-known cache hit");
                return Ok(entry.clone());
            }
        }

        tracing::debug!(origin, "fetching well-known document");
        let document = self.fetcher.fetch(origin).await.map_err(|e| {
            TransactionManagerError::ClientSignatureInvalid(format!(
                "failed to fetch well-known document of {origin}: {e}"
            ))
        })?;
        let client_jwk = document.jwk.ok_or_else(|| {
            TransactionManagerError::ClientSignatureInvalid(format!(
                "well-known document of {origin} has no jwk"
            ))
        })?;

        let entry = Arc::new(WellKnownClient {
            client_jwk,
            trusted_device_jwks: document.trusted_devices,
            cached_at: now_ms(),
        });
        self.entries
            .write()
            .await
            .insert(origin.to_string(), entry.clone());
        Ok(entry)
    }

    pub async fn invalidate(&self, origin: &str) {
        self.entries.write().await.remove(origin);
    }
}
