//! Revibase wrapped transaction message
//!
//! A compact, Solana-like message format embedded in on-chain transaction
//! buffers. This crate compiles instructions into it, encodes and decodes
//! its bytes, and decompiles it back into instructions.

pub mod account_keys;
pub mod compiled_keys;
pub mod error;
pub mod wire;

pub use account_keys::{LoadedAddresses, LookupTableAccount, MessageAccountKeys};
pub use compiled_keys::{CompiledKeys, KeyMeta};
pub use error::{MessageError, Result};
pub use wire::{CompiledInstruction, MessageAddressTableLookup, MessageHeader, WrappedTransactionMessage};
