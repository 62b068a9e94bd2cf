//! Wallet index to settings resolution.

use revibase_interface::ids::ADDRESS_TREE;
use revibase_interface::state::{SEED_MULTI_WALLET, SEED_SETTINGS, SEED_VAULT};
use revibase_interface::Settings;
use solana_sdk::keccak;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

use crate::core::compression::{CompressedAccount, CompressionRpc, RetryPolicy, ValidityProofWithContext};
use crate::core::connection::SolConnection;
use crate::error::{Result, TransactionManagerError};

//=============================================================================
// Address Derivation
//=============================================================================

/// Plain settings PDA of wallet `index`
pub fn settings_address(program_id: &Pubkey, index: u128) -> Pubkey {
    Pubkey::find_program_address(&[SEED_MULTI_WALLET, &index.to_le_bytes()], program_id).0
}

/// Vault PDA holding the funds of the wallet configured by `settings`
pub fn vault_address(program_id: &Pubkey, settings: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[SEED_MULTI_WALLET, settings.as_ref(), SEED_VAULT],
        program_id,
    )
    .0
}

/// Keccak-256 truncated into the BN254 scalar field.
fn hashv_to_bn254_field(inputs: &[&[u8]]) -> [u8; 32] {
    let mut hash = keccak::hashv(inputs).to_bytes();
    hash[0] = 0;
    hash
}

/// Address of wallet `index`'s compressed settings in [`ADDRESS_TREE`]
pub fn compressed_settings_address(program_id: &Pubkey, index: u128) -> [u8; 32] {
    let seed = hashv_to_bn254_field(&[SEED_SETTINGS, &index.to_le_bytes()]);
    hashv_to_bn254_field(&[&seed, ADDRESS_TREE.as_ref(), program_id.as_ref()])
}

//=============================================================================
// Resolution
//=============================================================================

/// Where a wallet's settings were found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsStorage {
    Plain,
    Compressed(CompressedAccount),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    /// Plain settings PDA; also the wallet identity for compressed settings
    pub settings_address: Pubkey,
    pub settings: Settings,
    pub storage: SettingsStorage,
    /// Present for compressed settings resolved with a proof
    pub proof: Option<ValidityProofWithContext>,
}

pub struct SettingsResolver {
    program_id: Pubkey,
    connection: Arc<dyn SolConnection>,
    compression: Arc<dyn CompressionRpc>,
    retry: RetryPolicy,
}

impl SettingsResolver {
    pub fn new(
        program_id: Pubkey,
        connection: Arc<dyn SolConnection>,
        compression: Arc<dyn CompressionRpc>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            program_id,
            connection,
            compression,
            retry,
        }
    }

    pub fn settings_address(&self, index: u128) -> Pubkey {
        settings_address(&self.program_id, index)
    }

    pub fn vault_address(&self, settings: &Pubkey) -> Pubkey {
        vault_address(&self.program_id, settings)
    }

    /// Reads the compressed settings first and falls back to the plain PDA.
    pub async fn resolve(&self, index: u128) -> Result<ResolvedSettings> {
        let settings_address = self.settings_address(index);
        let compressed_address = compressed_settings_address(&self.program_id, index);

        let compressed = self
            .compression
            .get_compressed_account(&compressed_address)
            .await
            .map_err(|e| TransactionManagerError::Connection(e.to_string()))?;
        if let Some(account) = compressed {
            tracing::debug!(index, "settings found in compressed state");
            let settings = Settings::from_compressed_data(&account.data)?;
            return Ok(ResolvedSettings {
                settings_address,
                settings,
                storage: SettingsStorage::Compressed(account),
                proof: None,
            });
        }

        let account = self
            .connection
            .get_account(&settings_address)
            .await
            .map_err(|e| TransactionManagerError::Connection(e.to_string()))?
            .ok_or(TransactionManagerError::SettingsNotFound(index))?;
        tracing::debug!(index, %settings_address, "settings found in plain account");
        Ok(ResolvedSettings {
            settings_address,
            settings: Settings::from_account_data(&account.data)?,
            storage: SettingsStorage::Plain,
            proof: None,
        })
    }

    /// [`Self::resolve`], plus a validity proof when the settings are compressed.
    pub async fn resolve_with_proof(&self, index: u128) -> Result<ResolvedSettings> {
        let mut resolved = self.resolve(index).await?;
        let account_hash = match &resolved.storage {
            SettingsStorage::Compressed(account) => Some(account.hash),
            SettingsStorage::Plain => None,
        };
        let Some(account_hash) = account_hash else {
            return Ok(resolved);
        };

        let hashes = [account_hash];
        let proof = self
            .retry
            .run("validity proof", || self.compression.get_validity_proof(&hashes))
            .await
            .map_err(|e| TransactionManagerError::ValidityProofUnavailable {
                attempts: self.retry.attempts,
                reason: e.to_string(),
            })?;
        resolved.proof = Some(proof);
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivations_are_deterministic() {
        let program_id = revibase_interface::ID;
        assert_eq!(settings_address(&program_id, 7), settings_address(&program_id, 7));
        assert_ne!(settings_address(&program_id, 7), settings_address(&program_id, 8));

        let settings = settings_address(&program_id, 7);
        assert_ne!(vault_address(&program_id, &settings), settings);
    }

    #[test]
    fn test_compressed_address_in_field() {
        let program_id = revibase_interface::ID;
        let address = compressed_settings_address(&program_id, 1);
        assert_eq!(address[0], 0);
        assert_ne!(address, compressed_settings_address(&program_id, 2));
        assert_ne!(address, compressed_settings_address(&Pubkey::new_unique(), 1));
    }
}
