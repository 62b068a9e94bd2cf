use revibase_interface::instruction::{
    decode_args, ChangeConfigArgs, ChangeConfigCompressedArgs, CreateUserAccountsArgs,
    EditTransactionManagerUrlArgs, TransactionBufferCreateArgs,
    TransactionBufferCreateCompressedArgs, TransactionExecuteSyncArgs,
    TransactionExecuteSyncCompressedArgs, TransferIntentArgs, TransferIntentCompressedArgs,
};
use revibase_interface::{MultiWalletInstruction, DISCRIMINATOR_LEN};

use crate::error::Result;

/// A multi-wallet instruction classified by discriminator, with its
/// arguments decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInstruction {
    ChangeConfig(ChangeConfigArgs),
    ChangeConfigCompressed(ChangeConfigCompressedArgs),
    /// Native or token transfer intent
    TransferIntent(TransferIntentArgs),
    TransferIntentCompressed(TransferIntentCompressedArgs),
    TransactionBufferCreate(TransactionBufferCreateArgs),
    TransactionBufferCreateCompressed(TransactionBufferCreateCompressedArgs),
    TransactionExecuteSync(TransactionExecuteSyncArgs),
    TransactionExecuteSyncCompressed(TransactionExecuteSyncCompressedArgs),
    CreateUserAccounts(CreateUserAccountsArgs),
    EditTransactionManagerUrl(EditTransactionManagerUrlArgs),
    /// Needs no authorization beyond what the program checks
    NoOp(MultiWalletInstruction),
    /// Any other discriminator, known or not
    Unrecognized(String),
}

impl ParsedInstruction {
    pub fn parse(data: &[u8]) -> Result<Self> {
        use MultiWalletInstruction as Ix;

        let (ix, args) = MultiWalletInstruction::split(data)?;
        let Some(ix) = ix else {
            return Ok(Self::Unrecognized(format!("{:?}", &data[..DISCRIMINATOR_LEN])));
        };

        let parsed = match ix {
            Ix::ChangeConfig => Self::ChangeConfig(decode_args("ChangeConfigArgs", args)?),
            Ix::ChangeConfigCompressed => {
                Self::ChangeConfigCompressed(decode_args("ChangeConfigCompressedArgs", args)?)
            },
            Ix::NativeTransferIntent | Ix::TokenTransferIntent => {
                Self::TransferIntent(decode_args("TransferIntentArgs", args)?)
            },
            Ix::NativeTransferIntentCompressed | Ix::TokenTransferIntentCompressed => {
                Self::TransferIntentCompressed(decode_args("TransferIntentCompressedArgs", args)?)
            },
            Ix::TransactionBufferCreate => {
                Self::TransactionBufferCreate(decode_args("TransactionBufferCreateArgs", args)?)
            },
            Ix::TransactionBufferCreateCompressed => Self::TransactionBufferCreateCompressed(
                decode_args("TransactionBufferCreateCompressedArgs", args)?,
            ),
            Ix::TransactionExecuteSync => {
                Self::TransactionExecuteSync(decode_args("TransactionExecuteSyncArgs", args)?)
            },
            Ix::TransactionExecuteSyncCompressed => Self::TransactionExecuteSyncCompressed(
                decode_args("TransactionExecuteSyncCompressedArgs", args)?,
            ),
            Ix::CreateUserAccounts => {
                Self::CreateUserAccounts(decode_args("CreateUserAccountsArgs", args)?)
            },
            Ix::EditTransactionManagerUrl => Self::EditTransactionManagerUrl(decode_args(
                "EditTransactionManagerUrlArgs",
                args,
            )?),
            Ix::DecompressSettingsAccount
            | Ix::TransactionBufferClose
            | Ix::TransactionBufferCloseCompressed => Self::NoOp(ix),
            Ix::CompressSettingsAccount
            | Ix::CreateDomainConfig
            | Ix::CreateWallet
            | Ix::TransactionBufferExecute
            | Ix::TransactionBufferExecuteCompressed
            | Ix::TransactionBufferExtend
            | Ix::TransactionBufferExtendCompressed
            | Ix::TransactionBufferVote
            | Ix::TransactionBufferVoteCompressed
            | Ix::TransactionExecute
            | Ix::TransactionExecuteCompressed => Self::Unrecognized(format!("{ix:?}")),
        };
        Ok(parsed)
    }
}
