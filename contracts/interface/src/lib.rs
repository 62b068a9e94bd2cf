//! Revibase multi-wallet program interface
//!
//! Off-chain view of the on-chain program: its address, the programs a
//! wallet transaction may touch, the 8-byte discriminators of every
//! instruction and account, and the borsh layouts of the instruction
//! arguments the Transaction Manager needs to read.

pub mod discriminator;
pub mod error;
pub mod ids;
pub mod instruction;
pub mod lookup_table;
pub mod state;

pub use discriminator::{AccountDiscriminator, MultiWalletInstruction, DISCRIMINATOR_LEN};
pub use error::{InterfaceError, Result};
pub use ids::{is_whitelisted_program, ID};
pub use instruction::Secp256r1VerifyArgs;
pub use state::{Member, MemberKey, Secp256r1Pubkey, Settings};
