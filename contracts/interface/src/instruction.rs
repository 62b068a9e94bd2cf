//! Argument layouts of the multi-wallet instructions the Transaction Manager reads.
//!
//! Every layout follows the 8-byte discriminator and is borsh encoded.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::discriminator::MultiWalletInstruction;
use crate::error::{InterfaceError, Result};
use crate::state::{Member, MemberKey};

/// Reference from a multi-wallet instruction to a signature verified by a
/// sibling secp256r1 precompile instruction.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Secp256r1VerifyArgs {
    /// Position in the transaction's flattened list of signed messages
    pub signed_message_index: u8,
    /// Slot whose hash was mixed into the WebAuthn challenge
    pub slot_number: u64,
}

/// Locates compressed settings in the address tree
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressedSettingsRef {
    pub index: u128,
    pub merkle_tree_index: u8,
    pub queue_index: u8,
    pub leaf_index: u32,
    pub root_index: u16,
}

/// Groth16 validity proof as passed to the light system program
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityProof {
    pub a: [u8; 32],
    pub b: [u8; 64],
    pub c: [u8; 32],
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    AddMembers(Vec<Member>),
    RemoveMembers(Vec<MemberKey>),
    EditPermissions(Vec<Member>),
    SetThreshold(u8),
}

/// `change_config`
///
/// Accounts:
/// 0. `[writable]` Settings
/// 1. `[writable, signer]` Payer
/// 2. `[]` System program
/// 3. `[]` Slot hashes sysvar
/// 4. `[]` Instructions sysvar
/// 5.. `[signer]` Member signers
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChangeConfigArgs {
    pub config_actions: Vec<ConfigAction>,
    pub secp256r1_verify_args: Vec<Secp256r1VerifyArgs>,
}

/// `change_config_compressed`
///
/// Accounts:
/// 0. `[writable, signer]` Payer
/// 1. `[]` Slot hashes sysvar
/// 2. `[]` Instructions sysvar
/// 3.. member signers followed by light system accounts
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChangeConfigCompressedArgs {
    pub settings: CompressedSettingsRef,
    pub config_actions: Vec<ConfigAction>,
    pub secp256r1_verify_args: Vec<Secp256r1VerifyArgs>,
    pub proof: Option<ValidityProof>,
}

/// `native_transfer_intent` / `token_transfer_intent`
///
/// Accounts:
/// 0. `[]` Settings
/// 1. `[]` Slot hashes sysvar
/// 2. `[]` Instructions sysvar
/// 3. `[writable]` Source vault
/// 4. `[writable]` Destination
/// 5.. program accounts (system, or mint/token accounts) and member signers
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransferIntentArgs {
    pub amount: u64,
    pub secp256r1_verify_args: Option<Secp256r1VerifyArgs>,
}

/// `native_transfer_intent_compressed` / `token_transfer_intent_compressed`
///
/// Same accounts as the plain variant without the settings account.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransferIntentCompressedArgs {
    pub settings: CompressedSettingsRef,
    pub amount: u64,
    pub secp256r1_verify_args: Option<Secp256r1VerifyArgs>,
    pub proof: Option<ValidityProof>,
}

/// `transaction_buffer_create`
///
/// Accounts:
/// 0. `[]` Settings
/// 1. `[writable, signer]` Payer
/// 2. `[]` System program
/// 3. `[]` Slot hashes sysvar
/// 4. `[]` Instructions sysvar
/// 5. `[writable]` Transaction buffer
/// 6.. `[signer]` Creator
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionBufferCreateArgs {
    pub buffer_index: u8,
    pub preauthorize_execution: bool,
    /// SHA-256 of the complete wrapped transaction message
    pub final_buffer_hash: [u8; 32],
    pub final_buffer_size: u16,
    /// Wrapped transaction message bytes
    pub buffer: Vec<u8>,
    pub secp256r1_verify_args: Option<Secp256r1VerifyArgs>,
}

/// `transaction_buffer_create_compressed`
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionBufferCreateCompressedArgs {
    pub settings: CompressedSettingsRef,
    pub create: TransactionBufferCreateArgs,
    pub proof: Option<ValidityProof>,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct SyncCompiledInstruction {
    pub program_id_index: u8,
    pub account_indexes: Vec<u8>,
    pub data: Vec<u8>,
}

/// Transaction message executed synchronously by `transaction_execute_sync`.
///
/// Account keys are not carried in the message: they are the instruction's
/// accounts following the fixed leading accounts and the lookup table
/// accounts.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct SyncTransactionMessage {
    pub num_signers: u8,
    pub num_writable_signers: u8,
    pub num_writable_non_signers: u8,
    pub num_account_keys: u8,
    pub instructions: Vec<SyncCompiledInstruction>,
    pub num_address_table_lookups: u8,
}

/// `transaction_execute_sync`
///
/// Accounts:
/// 0. `[writable]` Settings
/// 1. `[]` Slot hashes sysvar
/// 2. `[]` Instructions sysvar
/// 3..3+n lookup table accounts
/// 3+n.. message account keys
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionExecuteSyncArgs {
    pub transaction_message: SyncTransactionMessage,
    pub secp256r1_verify_args: Vec<Secp256r1VerifyArgs>,
}

/// `transaction_execute_sync_compressed`
///
/// Accounts:
/// 0. `[writable, signer]` Payer
/// 1. `[]` Slot hashes sysvar
/// 2. `[]` Instructions sysvar
/// 3.. as in the plain variant
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionExecuteSyncCompressedArgs {
    pub settings: CompressedSettingsRef,
    pub transaction_message: SyncTransactionMessage,
    pub secp256r1_verify_args: Vec<Secp256r1VerifyArgs>,
    pub proof: Option<ValidityProof>,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateUserAccountArgs {
    pub member: MemberKey,
    pub is_permanent_member: bool,
    pub transaction_manager_url: Option<String>,
}

/// `create_user_accounts`
///
/// Accounts:
/// 0. `[writable, signer]` Payer
/// 1. `[]` System program
/// 2. `[]` Slot hashes sysvar
/// 3. `[]` Instructions sysvar
/// 4.. user accounts and `[signer]` members
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateUserAccountsArgs {
    pub users: Vec<CreateUserAccountArgs>,
    pub secp256r1_verify_args: Option<Secp256r1VerifyArgs>,
}

/// `edit_transaction_manager_url`
///
/// Accounts:
/// 0. `[writable]` User account
/// 1. `[signer]` Authority
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct EditTransactionManagerUrlArgs {
    pub transaction_manager_url: String,
}

/// Decodes `bytes` as `T`, rejecting trailing data.
pub fn decode_args<T: BorshDeserialize>(layout: &'static str, bytes: &[u8]) -> Result<T> {
    borsh::from_slice(bytes).map_err(|source| InterfaceError::Decode { layout, source })
}

/// Instruction data for `ix` carrying `args`.
pub fn encode_instruction_data<T: BorshSerialize>(
    ix: MultiWalletInstruction,
    args: &T,
) -> Result<Vec<u8>> {
    let mut data = ix.discriminator().to_vec();
    args.serialize(&mut data).map_err(|source| InterfaceError::Encode {
        layout: std::any::type_name::<T>(),
        source,
    })?;
    Ok(data)
}
