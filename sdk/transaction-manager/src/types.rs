use revibase_interface::Secp256r1Pubkey;
use serde::{Deserialize, Serialize};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;

/// Evidence that a passkey signed a message, taken from a secp256r1
/// verify instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasskeyProof {
    /// SHA-256 of the message verified on chain
    pub message_hash: [u8; 32],
    /// Slot the multi-wallet instruction says the challenge was bound to
    pub slot_number: u64,
}

/// A key that authorized a multi-wallet instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerInfo {
    /// Ed25519 transaction signer; the transaction signature is its proof
    Plain(Pubkey),
    /// Passkey whose authorization must be re-verified off chain
    Passkey {
        public_key: Secp256r1Pubkey,
        proof: Option<PasskeyProof>,
    },
}

impl SignerInfo {
    pub fn is_passkey(&self) -> bool {
        matches!(self, Self::Passkey { .. })
    }
}

/// Output of an instruction processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingResult {
    /// `None` for instructions that act on no wallet
    pub settings_address: Option<Pubkey>,
    pub signers: Vec<SignerInfo>,
    pub instructions_to_verify: Vec<Instruction>,
}

impl ProcessingResult {
    pub fn passkey_count(&self) -> usize {
        self.signers.iter().filter(|signer| signer.is_passkey()).count()
    }
}

/// WebAuthn assertion, every field base64url encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAuthnAssertion {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub authenticator_data: String,
    #[serde(default)]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAuthorization {
    pub origin: String,
    pub jws: String,
}

/// A JWK and a compact JWS made with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyAuthorization {
    /// Base64url-encoded JWK
    pub jwk: String,
    pub jws: String,
}

/// What the client asked the user to approve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StartRequestData {
    Transaction {
        /// Base64-encoded transaction bytes
        payload: String,
        #[serde(rename = "sendTx", default)]
        send_tx: bool,
    },
    Message {
        payload: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    /// Unix time in milliseconds
    pub valid_till: u64,
    pub data: StartRequestData,
}

/// Everything a signer's client collected while authorizing a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationResponse {
    pub auth_response: WebAuthnAssertion,
    pub client: ClientAuthorization,
    pub device: KeyAuthorization,
    #[serde(default)]
    pub auth_provider: Option<KeyAuthorization>,
    pub start_request: StartRequest,
    pub slot_number: u64,
    /// Base58-encoded slot hash
    pub slot_hash: String,
    pub nonce: String,
}

/// Client identity a passkey signature was made through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClient {
    pub origin: String,
    pub client_jwk: String,
    pub trusted_device_jwks: Option<Vec<String>>,
    pub cached_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifiedSigner {
    Plain {
        signer: Pubkey,
        wallet_address: Option<Pubkey>,
    },
    Passkey {
        signer: Secp256r1Pubkey,
        wallet_address: Option<Pubkey>,
        client: VerifiedClient,
        device_jwk: String,
        auth_provider_jwk: Option<String>,
    },
}

impl VerifiedSigner {
    pub fn wallet_address(&self) -> Option<&Pubkey> {
        match self {
            Self::Plain { wallet_address, .. } | Self::Passkey { wallet_address, .. } => {
                wallet_address.as_ref()
            },
        }
    }
}

/// A multi-wallet instruction whose signers all checked out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedInstruction {
    pub settings_address: Option<Pubkey>,
    pub signers: Vec<VerifiedSigner>,
    pub instructions_to_verify: Vec<Instruction>,
}
