use revibase_interface::InterfaceError;
use revibase_message::MessageError;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Coarse classification of a verification failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad wire bytes, unknown discriminator, non-whitelisted program.
    /// Always fatal to the whole transaction.
    MalformedInput,
    /// One of the passkey signature layers rejected a signer
    SignatureInvalid,
    /// Settings, compressed or lookup table account missing
    StateNotFound,
    /// Count mismatch, expired request, missing auth provider
    Precondition,
    /// Validity proof still unavailable after retrying
    TransientInfra,
    /// An account or lookup table read failed at the RPC; never retried
    Connection,
}

/// Layers of the passkey authorization chain, in the order their failures
/// take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignatureLayer {
    Challenge,
    MessageHash,
    Device,
    Client,
    AuthProvider,
}

/// Transaction Manager error types
#[derive(Debug, Error)]
pub enum TransactionManagerError {
    /// Wrapped or native message failed to compile or decompile
    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    /// Instruction or account layout failed to decode
    #[error("Interface error: {0}")]
    Interface(#[from] InterfaceError),

    #[error("Malformed instruction: {0}")]
    MalformedInstruction(String),

    #[error("Malformed authorization response: {0}")]
    MalformedAuthResponse(String),

    #[error("Program {0} is not allowed in a co-signed transaction")]
    UnauthorizedProgram(Pubkey),

    #[error("Unknown multi-wallet instruction: {0}")]
    UnknownInstruction(String),

    #[error("Signed message {index} not found, transaction carries {available}")]
    SignedMessageNotFound { index: u8, available: usize },

    #[error("Transaction buffer hash mismatch")]
    BufferHashMismatch,

    #[error("Invalid WebAuthn challenge: {0}")]
    InvalidChallenge(String),

    #[error("Invalid WebAuthn message hash: {0}")]
    InvalidMessageHash(String),

    #[error("Device signature invalid: {0}")]
    DeviceSignatureInvalid(String),

    #[error("Client signature invalid: {0}")]
    ClientSignatureInvalid(String),

    #[error("Auth provider signature invalid: {0}")]
    AuthProviderSignatureInvalid(String),

    #[error("Expected {expected} authorization responses, got {actual}")]
    SignerCountMismatch { expected: usize, actual: usize },

    #[error("Request expired at {valid_till}, now {now}")]
    RequestExpired { valid_till: u64, now: u64 },

    #[error("Expected a transaction request, got a message request")]
    UnexpectedPayloadType,

    #[error("Auth provider is required when the request sends the transaction")]
    MissingAuthProvider,

    #[error("Settings for wallet {0} not found")]
    SettingsNotFound(u128),

    #[error("Address lookup table not found: {0}")]
    LookupTableNotFound(Pubkey),

    #[error("Validity proof unavailable after {attempts} attempts: {reason}")]
    ValidityProofUnavailable { attempts: u32, reason: String },

    /// Connection or RPC error
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TransactionManagerError {
    pub fn kind(&self) -> ErrorKind {
        use TransactionManagerError::*;
        match self {
            Message(_)
            | Interface(_)
            | MalformedInstruction(_)
            | MalformedAuthResponse(_)
            | UnauthorizedProgram(_)
            | UnknownInstruction(_)
            | SignedMessageNotFound { .. }
            | BufferHashMismatch => ErrorKind::MalformedInput,
            InvalidChallenge(_)
            | InvalidMessageHash(_)
            | DeviceSignatureInvalid(_)
            | ClientSignatureInvalid(_)
            | AuthProviderSignatureInvalid(_) => ErrorKind::SignatureInvalid,
            SettingsNotFound(_) | LookupTableNotFound(_) => ErrorKind::StateNotFound,
            SignerCountMismatch { .. }
            | RequestExpired { .. }
            | UnexpectedPayloadType
            | MissingAuthProvider
            | Config(_) => ErrorKind::Precondition,
            ValidityProofUnavailable { .. } => ErrorKind::TransientInfra,
            Connection(_) => ErrorKind::Connection,
        }
    }

    /// The failing passkey layer, for signature failures.
    pub fn layer(&self) -> Option<SignatureLayer> {
        match self {
            Self::InvalidChallenge(_) => Some(SignatureLayer::Challenge),
            Self::InvalidMessageHash(_) => Some(SignatureLayer::MessageHash),
            Self::DeviceSignatureInvalid(_) => Some(SignatureLayer::Device),
            Self::ClientSignatureInvalid(_) => Some(SignatureLayer::Client),
            Self::AuthProviderSignatureInvalid(_) => Some(SignatureLayer::AuthProvider),
            _ => None,
        }
    }
}

/// Result type alias for Transaction Manager operations
pub type Result<T> = std::result::Result<T, TransactionManagerError>;
