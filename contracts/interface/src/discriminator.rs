//! 8-byte Anchor discriminators of the multi-wallet program, copied from its IDL.

use crate::error::{InterfaceError, Result};

pub const DISCRIMINATOR_LEN: usize = 8;

/// Every instruction the multi-wallet program exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultiWalletInstruction {
    ChangeConfig,
    ChangeConfigCompressed,
    CompressSettingsAccount,
    CreateDomainConfig,
    CreateUserAccounts,
    CreateWallet,
    DecompressSettingsAccount,
    EditTransactionManagerUrl,
    NativeTransferIntent,
    NativeTransferIntentCompressed,
    TokenTransferIntent,
    TokenTransferIntentCompressed,
    TransactionBufferClose,
    TransactionBufferCloseCompressed,
    TransactionBufferCreate,
    TransactionBufferCreateCompressed,
    TransactionBufferExecute,
    TransactionBufferExecuteCompressed,
    TransactionBufferExtend,
    TransactionBufferExtendCompressed,
    TransactionBufferVote,
    TransactionBufferVoteCompressed,
    TransactionExecute,
    TransactionExecuteCompressed,
    TransactionExecuteSync,
    TransactionExecuteSyncCompressed,
}

impl MultiWalletInstruction {
    pub const ALL: [Self; 26] = [
        Self::ChangeConfig,
        Self::ChangeConfigCompressed,
        Self::CompressSettingsAccount,
        Self::CreateDomainConfig,
        Self::CreateUserAccounts,
        Self::CreateWallet,
        Self::DecompressSettingsAccount,
        Self::EditTransactionManagerUrl,
        Self::NativeTransferIntent,
        Self::NativeTransferIntentCompressed,
        Self::TokenTransferIntent,
        Self::TokenTransferIntentCompressed,
        Self::TransactionBufferClose,
        Self::TransactionBufferCloseCompressed,
        Self::TransactionBufferCreate,
        Self::TransactionBufferCreateCompressed,
        Self::TransactionBufferExecute,
        Self::TransactionBufferExecuteCompressed,
        Self::TransactionBufferExtend,
        Self::TransactionBufferExtendCompressed,
        Self::TransactionBufferVote,
        Self::TransactionBufferVoteCompressed,
        Self::TransactionExecute,
        Self::TransactionExecuteCompressed,
        Self::TransactionExecuteSync,
        Self::TransactionExecuteSyncCompressed,
    ];

    pub const fn discriminator(self) -> [u8; DISCRIMINATOR_LEN] {
        match self {
            Self::ChangeConfig => [24, 158, 114, 115, 94, 210, 244, 233],
            Self::ChangeConfigCompressed => [33, 185, 159, 154, 181, 251, 157, 58],
            Self::CompressSettingsAccount => [107, 157, 58, 253, 4, 163, 46, 145],
            Self::CreateDomainConfig => [197, 81, 191, 2, 164, 140, 184, 90],
            Self::CreateUserAccounts => [191, 13, 235, 224, 45, 2, 138, 16],
            Self::CreateWallet => [82, 172, 128, 18, 161, 207, 88, 63],
            Self::DecompressSettingsAccount => [237, 87, 232, 84, 218, 176, 222, 134],
            Self::EditTransactionManagerUrl => [33, 93, 221, 189, 123, 250, 91, 8],
            Self::NativeTransferIntent => [57, 156, 213, 157, 88, 202, 2, 151],
            Self::NativeTransferIntentCompressed => [215, 168, 194, 70, 97, 19, 81, 126],
            Self::TokenTransferIntent => [51, 91, 96, 155, 132, 232, 179, 48],
            Self::TokenTransferIntentCompressed => [42, 48, 107, 147, 228, 201, 67, 173],
            Self::TransactionBufferClose => [17, 182, 208, 228, 136, 24, 178, 102],
            Self::TransactionBufferCloseCompressed => [82, 65, 25, 49, 208, 28, 191, 84],
            Self::TransactionBufferCreate => [245, 201, 113, 108, 37, 63, 29, 89],
            Self::TransactionBufferCreateCompressed => [96, 163, 111, 240, 71, 192, 125, 64],
            Self::TransactionBufferExecute => [48, 73, 34, 19, 129, 99, 128, 73],
            Self::TransactionBufferExecuteCompressed => [217, 17, 124, 197, 3, 110, 139, 7],
            Self::TransactionBufferExtend => [230, 157, 67, 56, 5, 238, 245, 146],
            Self::TransactionBufferExtendCompressed => [21, 112, 96, 97, 196, 102, 207, 203],
            Self::TransactionBufferVote => [203, 50, 79, 187, 94, 53, 82, 122],
            Self::TransactionBufferVoteCompressed => [86, 82, 187, 102, 103, 52, 135, 183],
            Self::TransactionExecute => [93, 171, 78, 134, 252, 84, 186, 189],
            Self::TransactionExecuteCompressed => [60, 99, 11, 42, 178, 216, 28, 158],
            Self::TransactionExecuteSync => [149, 138, 204, 32, 181, 61, 153, 227],
            Self::TransactionExecuteSyncCompressed => [251, 154, 149, 157, 125, 132, 60, 183],
        }
    }

    pub fn from_discriminator(discriminator: &[u8; DISCRIMINATOR_LEN]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ix| ix.discriminator() == *discriminator)
    }

    /// Splits instruction data into its discriminator and argument bytes.
    ///
    /// Returns `Ok((None, args))` for a well-formed prefix that names no
    /// known instruction.
    pub fn split(data: &[u8]) -> Result<(Option<Self>, &[u8])> {
        let (prefix, args) = data
            .split_first_chunk::<DISCRIMINATOR_LEN>()
            .ok_or(InterfaceError::MissingDiscriminator(data.len()))?;
        Ok((Self::from_discriminator(prefix), args))
    }

    /// Instruction data with this discriminator prepended to `args`.
    pub fn with_args(self, args: &[u8]) -> Vec<u8> {
        let mut data = Vec::with_capacity(DISCRIMINATOR_LEN + args.len());
        data.extend_from_slice(&self.discriminator());
        data.extend_from_slice(args);
        data
    }
}

/// Account discriminators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountDiscriminator {
    Settings,
    TransactionBuffer,
    DomainConfig,
    GlobalCounter,
}

impl AccountDiscriminator {
    pub const fn discriminator(self) -> [u8; DISCRIMINATOR_LEN] {
        match self {
            Self::Settings => [223, 179, 163, 190, 177, 224, 67, 173],
            Self::TransactionBuffer => [90, 36, 35, 219, 93, 225, 110, 96],
            Self::DomainConfig => [201, 232, 212, 229, 59, 241, 106, 197],
            Self::GlobalCounter => [42, 206, 176, 58, 175, 129, 130, 233],
        }
    }

    /// Strips the discriminator from account data, failing if it does not match.
    pub fn strip(self, data: &[u8]) -> Result<&[u8]> {
        match data.split_first_chunk::<DISCRIMINATOR_LEN>() {
            Some((prefix, rest)) if *prefix == self.discriminator() => Ok(rest),
            _ => Err(InterfaceError::AccountDiscriminatorMismatch),
        }
    }
}
