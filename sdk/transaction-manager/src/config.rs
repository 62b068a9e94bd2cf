use serde::{Deserialize, Deserializer};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, TransactionManagerError};

/// Prefix of the environment variables read by [`TransactionManagerConfig::from_env`]
pub const ENV_PREFIX: &str = "REVIBASE_TM_";

/// Runtime settings of the Transaction Manager.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransactionManagerConfig {
    /// Multi-wallet program address
    #[serde(deserialize_with = "deserialize_pubkey")]
    pub program_id: Pubkey,

    /// Proxy that fetches `/.well-known/revibase.json` on our behalf
    pub well_known_proxy_url: Option<String>,

    pub well_known_cache_ttl_ms: u64,

    /// Validity proof fetches are retried this many times in total
    pub proof_retry_attempts: u32,

    pub proof_retry_delay_ms: u64,

    pub http_timeout_ms: u64,
}

impl Default for TransactionManagerConfig {
    fn default() -> Self {
        Self {
            program_id: revibase_interface::ID,
            well_known_proxy_url: None,
            well_known_cache_ttl_ms: 300_000,
            proof_retry_attempts: 10,
            proof_retry_delay_ms: 400,
            http_timeout_ms: 10_000,
        }
    }
}

fn deserialize_pubkey<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Pubkey, D::Error> {
    let s = String::deserialize(deserializer)?;
    Pubkey::from_str(&s).map_err(serde::de::Error::custom)
}

impl TransactionManagerConfig {
    pub fn with_program_id(mut self, program_id: Pubkey) -> Self {
        self.program_id = program_id;
        self
    }

    pub fn with_well_known_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.well_known_proxy_url = Some(url.into());
        self
    }

    pub fn with_well_known_cache_ttl(mut self, ttl: Duration) -> Self {
        self.well_known_cache_ttl_ms = ttl.as_millis() as u64;
        self
    }

    pub fn with_proof_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.proof_retry_attempts = attempts;
        self.proof_retry_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn well_known_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.well_known_cache_ttl_ms)
    }

    pub fn proof_retry_delay(&self) -> Duration {
        Duration::from_millis(self.proof_retry_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TransactionManagerError::Config(e.to_string()))
    }

    /// Defaults overridden by `REVIBASE_TM_*` variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
        let mut config = Self::default();
        for (name, value) in vars {
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match key {
                "PROGRAM_ID" => {
                    config.program_id = Pubkey::from_str(&value)
                        .map_err(|e| TransactionManagerError::Config(format!("{name}: {e}")))?;
                },
                "WELL_KNOWN_PROXY_URL" => config.well_known_proxy_url = Some(value),
                "WELL_KNOWN_CACHE_TTL_MS" => config.well_known_cache_ttl_ms = parse(&name, &value)?,
                "PROOF_RETRY_ATTEMPTS" => config.proof_retry_attempts = parse(&name, &value)?,
                "PROOF_RETRY_DELAY_MS" => config.proof_retry_delay_ms = parse(&name, &value)?,
                "HTTP_TIMEOUT_MS" => config.http_timeout_ms = parse(&name, &value)?,
                _ => tracing::warn!(variable = %name, "ignoring unknown configuration variable"),
            }
        }
        Ok(config)
    }
}

fn parse<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| TransactionManagerError::Config(format!("{name}: {e}")))
}
