use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::account::Account;
use solana_sdk::pubkey::Pubkey;
use std::error::Error;

/// Boxed error returned by external collaborators
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Read access to on-chain accounts.
#[async_trait]
pub trait SolConnection: Send + Sync {
    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, BoxError>;
}

#[async_trait]
impl SolConnection for RpcClient {
    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, BoxError> {
        let response = self
            .get_account_with_commitment(pubkey, self.commitment())
            .await
            .map_err(|e| Box::new(e) as BoxError)?;
        Ok(response.value)
    }
}
