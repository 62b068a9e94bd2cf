use thiserror::Error;

/// Errors raised while reading program-defined byte layouts
#[derive(Debug, Error)]
pub enum InterfaceError {
    /// Instruction data shorter than a discriminator
    #[error("Instruction data is {0} bytes, expected at least 8")]
    MissingDiscriminator(usize),

    /// Account data does not start with the expected discriminator
    #[error("Account discriminator mismatch")]
    AccountDiscriminatorMismatch,

    /// Borsh decoding failure
    #[error("Failed to decode {layout}: {source}")]
    Decode {
        layout: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Borsh encoding failure
    #[error("Failed to encode {layout}: {source}")]
    Encode {
        layout: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A member key tag that the program does not define
    #[error("Unknown member key type: {0}")]
    UnknownKeyType(u8),
}

pub type Result<T> = std::result::Result<T, InterfaceError>;
