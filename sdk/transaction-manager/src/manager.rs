//! Transaction Manager entry point.

use futures::future::join_all;
use revibase_message::{CompiledInstruction, MessageAddressTableLookup, WrappedTransactionMessage};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::VersionedMessage;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::VersionedTransaction;
use std::sync::Arc;

use crate::config::TransactionManagerConfig;
use crate::core::compression::{CompressionRpc, RetryPolicy};
use crate::core::connection::SolConnection;
use crate::core::well_known::{HttpWellKnownFetcher, WellKnownCache, WellKnownFetcher};
use crate::error::{Result, TransactionManagerError};
use crate::lookup::LookupResolver;
use crate::router::InstructionRouter;
use crate::settings::SettingsResolver;
use crate::types::{AuthorizationResponse, VerifiedInstruction};
use crate::verify::ChainVerifier;

/// Verifies that every multi-wallet instruction of a transaction was
/// authorized by its signers before the manager co-signs it.
pub struct TransactionManager {
    config: TransactionManagerConfig,
    lookup: Arc<LookupResolver>,
    settings: Arc<SettingsResolver>,
    router: InstructionRouter,
    verifier: ChainVerifier,
}

fn malformed(reason: &str) -> TransactionManagerError {
    TransactionManagerError::MalformedInstruction(format!("transaction message: {reason}"))
}

/// Re-expresses a Solana message in the wrapped message layout so both
/// share one decompiler.
pub fn wrap_versioned_message(message: &VersionedMessage) -> Result<WrappedTransactionMessage> {
    let header = message.header();
    let static_keys = message.static_account_keys();
    let num_signers = header.num_required_signatures;
    let num_writable_signers = num_signers
        .checked_sub(header.num_readonly_signed_accounts)
        .ok_or_else(|| malformed("more readonly signers than signers"))?;
    let num_writable_non_signers = static_keys
        .len()
        .checked_sub(num_signers as usize)
        .and_then(|unsigned| unsigned.checked_sub(header.num_readonly_unsigned_accounts as usize))
        .and_then(|writable| u8::try_from(writable).ok())
        .ok_or_else(|| malformed("header counts exceed static keys"))?;

    let instructions = message
        .instructions()
        .iter()
        .map(|ix| CompiledInstruction {
            program_id_index: ix.program_id_index,
            account_indexes: ix.accounts.clone(),
            data: ix.data.clone(),
        })
        .collect();
    let address_table_lookups = message
        .address_table_lookups()
        .unwrap_or_default()
        .iter()
        .map(|lookup| MessageAddressTableLookup {
            account_key: lookup.account_key,
            writable_indexes: lookup.writable_indexes.clone(),
            readonly_indexes: lookup.readonly_indexes.clone(),
        })
        .collect();

    Ok(WrappedTransactionMessage {
        num_signers,
        num_writable_signers,
        num_writable_non_signers,
        account_keys: static_keys.to_vec(),
        instructions,
        address_table_lookups,
    })
}

impl TransactionManager {
    pub fn new(
        config: TransactionManagerConfig,
        connection: Arc<dyn SolConnection>,
        compression: Arc<dyn CompressionRpc>,
        fetcher: Arc<dyn WellKnownFetcher>,
    ) -> Self {
        let lookup = Arc::new(LookupResolver::new(connection.clone()));
        let settings = Arc::new(SettingsResolver::new(
            config.program_id,
            connection,
            compression,
            RetryPolicy::new(config.proof_retry_attempts, config.proof_retry_delay()),
        ));
        let well_known = Arc::new(WellKnownCache::new(fetcher, config.well_known_cache_ttl()));
        Self {
            router: InstructionRouter::new(config.program_id, lookup.clone(), settings.clone()),
            verifier: ChainVerifier::new(config.program_id, well_known),
            config,
            lookup,
            settings,
        }
    }

    /// Manager backed by an RPC node and HTTP well-known lookups.
    pub fn with_rpc(
        config: TransactionManagerConfig,
        rpc: Arc<RpcClient>,
        compression: Arc<dyn CompressionRpc>,
    ) -> Result<Self> {
        let fetcher = HttpWellKnownFetcher::new(
            config.http_timeout(),
            config.well_known_proxy_url.clone(),
        )?;
        Ok(Self::new(config, rpc, compression, Arc::new(fetcher)))
    }

    pub fn config(&self) -> &TransactionManagerConfig {
        &self.config
    }

    pub fn router(&self) -> &InstructionRouter {
        &self.router
    }

    /// Settings resolver shared with the router, retrying validity proofs
    /// as configured.
    pub fn settings_resolver(&self) -> &SettingsResolver {
        &self.settings
    }

    /// Logical instructions of `transaction`, lookup tables resolved.
    pub async fn decompile(&self, transaction: &VersionedTransaction) -> Result<Vec<Instruction>> {
        let wrapped = wrap_versioned_message(&transaction.message)?;
        let tables: Vec<Pubkey> = wrapped
            .address_table_lookups
            .iter()
            .map(|lookup| lookup.account_key)
            .collect();
        let contents = self.lookup.resolve(&tables).await?;
        Ok(wrapped.decompile(&contents)?)
    }

    /// Verifies every multi-wallet instruction of `transaction`.
    ///
    /// `responses` holds one authorization response per passkey signer,
    /// in instruction order and then signer order.
    pub async fn verify_transaction(
        &self,
        transaction: &VersionedTransaction,
        responses: &[AuthorizationResponse],
    ) -> Result<Vec<VerifiedInstruction>> {
        let fee_payer = *transaction
            .message
            .static_account_keys()
            .first()
            .ok_or_else(|| malformed("no fee payer"))?;
        let instructions = self.decompile(transaction).await?;
        let results = self.router.route(&instructions, &fee_payer).await?;

        let expected: usize = results.iter().map(|result| result.passkey_count()).sum();
        if expected != responses.len() {
            return Err(TransactionManagerError::SignerCountMismatch {
                expected,
                actual: responses.len(),
            });
        }

        let mut remaining = responses;
        let checks = results.into_iter().map(|result| {
            let (own, rest) = remaining.split_at(result.passkey_count());
            remaining = rest;
            async move {
                let signers = self
                    .verifier
                    .verify(result.settings_address.as_ref(), &result.signers, own)
                    .await?;
                Ok(VerifiedInstruction {
                    settings_address: result.settings_address,
                    signers,
                    instructions_to_verify: result.instructions_to_verify,
                })
            }
        });
        let verified = join_all(checks).await.into_iter().collect::<Result<Vec<_>>>()?;

        tracing::info!(
            fee_payer = %fee_payer,
            instructions = verified.len(),
            signers = responses.len(),
            "transaction verified"
        );
        Ok(verified)
    }
}
