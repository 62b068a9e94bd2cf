//! The project's shared address lookup table.
//!
//! Its contents are pinned here so the Transaction Manager never has to
//! trust an RPC node for them. Append to `PINNED_LOOKUP_TABLE_ADDRESSES`
//! whenever the on-chain table is extended.

use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

use crate::ids;

pub const PINNED_LOOKUP_TABLE: Pubkey = pubkey!("ALTmH6tXX4cMNNGmkBR9kVATcUg2fmRF6Nn1wWcpgPSa");

pub const PINNED_LOOKUP_TABLE_ADDRESSES: [Pubkey; 14] = [
    ids::ID,
    ids::SYSTEM_PROGRAM_ID,
    ids::COMPUTE_BUDGET_PROGRAM_ID,
    ids::MEMO_PROGRAM_ID,
    ids::SECP256R1_PROGRAM_ID,
    ids::INSTRUCTIONS_SYSVAR_ID,
    ids::SLOT_HASHES_SYSVAR_ID,
    ids::TOKEN_PROGRAM_ID,
    ids::TOKEN_2022_PROGRAM_ID,
    ids::ASSOCIATED_TOKEN_PROGRAM_ID,
    ids::LIGHT_SYSTEM_PROGRAM_ID,
    ids::ACCOUNT_COMPRESSION_PROGRAM_ID,
    ids::NOOP_PROGRAM_ID,
    ids::ADDRESS_TREE,
];
