use revibase_interface::instruction::SyncTransactionMessage;
use solana_sdk::instruction::{AccountMeta, Instruction};

use crate::error::{Result, TransactionManagerError};

/// Settings (or payer), slot hashes sysvar and instructions sysvar.
pub const FIXED_LEADING_ACCOUNTS: usize = 3;

/// Rebuilds the inner instructions of a synchronous execute.
///
/// The message carries no keys of its own; they are the outer accounts
/// after the leading accounts and the lookup table accounts. Signer flags
/// follow the message header, writability follows the outer account meta.
pub fn decompile_sync_message(
    outer: &Instruction,
    message: &SyncTransactionMessage,
) -> Result<Vec<Instruction>> {
    let offset = FIXED_LEADING_ACCOUNTS + message.num_address_table_lookups as usize;
    let end = offset + message.num_account_keys as usize;
    let keys = outer.accounts.get(offset..end).ok_or_else(|| {
        TransactionManagerError::MalformedInstruction(format!(
            "sync message needs accounts {offset}..{end}, instruction has {}",
            outer.accounts.len()
        ))
    })?;

    let key_at = |index: u8| {
        keys.get(index as usize).ok_or_else(|| {
            TransactionManagerError::MalformedInstruction(format!(
                "sync message account index {index} out of range ({} keys)",
                keys.len()
            ))
        })
    };

    message
        .instructions
        .iter()
        .map(|ix| {
            let program_id = key_at(ix.program_id_index)?.pubkey;
            let accounts = ix
                .account_indexes
                .iter()
                .map(|&index| {
                    let meta = key_at(index)?;
                    Ok(AccountMeta {
                        pubkey: meta.pubkey,
                        is_signer: index < message.num_signers,
                        is_writable: meta.is_writable,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Instruction {
                program_id,
                accounts,
                data: ix.data.clone(),
            })
        })
        .collect()
}
