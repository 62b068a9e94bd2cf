use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// Truncated, over-length or otherwise undecodable bytes
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("More than 256 distinct account keys")]
    TooManyAccounts,

    #[error("Message has no writable signer")]
    NoWritableSigner,

    #[error("First writable signer is not the fee payer")]
    PayerNotFirst,

    #[error("Address lookup table index overflowed during compilation")]
    LookupIndexOverflow,

    #[error("Account index overflowed during compilation")]
    AccountIndexOverflow,

    #[error("Encountered unknown account key `{0}` during instruction compilation")]
    UnknownAccountKey(Pubkey),

    #[error("Account index {0} is out of range")]
    InvalidAccountIndex(u8),

    #[error("Address lookup table `{0}` was not resolved")]
    LookupTableNotFound(Pubkey),

    #[error("Index {index} is out of range for lookup table `{table}`")]
    InvalidLookupIndex { table: Pubkey, index: u8 },
}

pub type Result<T> = std::result::Result<T, MessageError>;
