use async_trait::async_trait;
use revibase_interface::instruction::ValidityProof;
use solana_sdk::pubkey::Pubkey;
use std::future::Future;
use std::time::Duration;

use crate::core::connection::BoxError;

/// A compressed account as returned by the compression indexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedAccount {
    pub address: [u8; 32],
    /// Leaf hash in the state tree
    pub hash: [u8; 32],
    pub tree: Pubkey,
    pub leaf_index: u32,
    pub discriminator: [u8; 8],
    pub data: Vec<u8>,
}

/// Validity proof for a set of compressed account hashes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityProofWithContext {
    /// `None` when every account can be proven by index
    pub proof: Option<ValidityProof>,
    pub root_indices: Vec<u16>,
}

/// ZK compression indexer.
#[async_trait]
pub trait CompressionRpc: Send + Sync {
    async fn get_compressed_account(
        &self,
        address: &[u8; 32],
    ) -> Result<Option<CompressedAccount>, BoxError>;

    /// Proof generation is eventually consistent with the indexer; callers
    /// should retry failures.
    async fn get_validity_proof(
        &self,
        hashes: &[[u8; 32]],
    ) -> Result<ValidityProofWithContext, BoxError>;
}

/// Fixed-delay retry schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Runs `op` until it succeeds or the attempts are used up, returning
    /// the last error.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, BoxError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BoxError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.attempts => return Err(e),
                Err(e) => {
                    tracing::warn!(what, attempt, error = %e, "retrying");
                    attempt += 1;
                    tokio::time::sleep(self.delay).await;
                },
            }
        }
    }
}
