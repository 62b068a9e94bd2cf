pub mod config;
pub mod core;
pub mod error;
pub mod lookup;
pub mod manager;
pub mod router;
pub mod settings;
pub mod signers;
pub mod types;
pub mod verify;

pub use crate::config::TransactionManagerConfig;
pub use crate::core::compression::{CompressionRpc, RetryPolicy};
pub use crate::core::connection::SolConnection;
pub use crate::core::well_known::{HttpWellKnownFetcher, WellKnownCache, WellKnownFetcher};
pub use crate::error::{ErrorKind, Result, SignatureLayer, TransactionManagerError};
pub use crate::lookup::LookupResolver;
pub use crate::manager::TransactionManager;
pub use crate::router::InstructionRouter;
pub use crate::settings::{
    compressed_settings_address, settings_address, vault_address, ResolvedSettings,
    SettingsResolver,
};
pub use crate::types::{
    AuthorizationResponse, ProcessingResult, SignerInfo, VerifiedInstruction, VerifiedSigner,
};
pub use crate::verify::ChainVerifier;

pub mod interface {
    pub use revibase_interface::*;
}

pub mod message {
    pub use revibase_message::*;
}
