use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{Result, TransactionManagerError};
use crate::types::WebAuthnAssertion;
use crate::verify::jws::decode_base64url;

pub const WEBAUTHN_GET: &str = "webauthn.get";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientData {
    #[serde(rename = "type")]
    pub kind: String,
    /// Base64url-encoded challenge
    pub challenge: String,
    pub origin: String,
    #[serde(default)]
    pub cross_origin: Option<bool>,
}

/// A WebAuthn assertion with its fields decoded
#[derive(Debug, Clone)]
pub struct DecodedAssertion {
    pub client_data_json: Vec<u8>,
    pub client_data: ClientData,
    pub authenticator_data: Vec<u8>,
}

impl DecodedAssertion {
    pub fn decode(assertion: &WebAuthnAssertion) -> Result<Self> {
        let malformed = |what: &str, e: String| {
            TransactionManagerError::MalformedAuthResponse(format!("{what}: {e}"))
        };
        let client_data_json = decode_base64url(&assertion.client_data_json)
            .map_err(|e| malformed("clientDataJSON", e.to_string()))?;
        let client_data = serde_json::from_slice(&client_data_json)
            .map_err(|e| malformed("clientDataJSON", e.to_string()))?;
        let authenticator_data = decode_base64url(&assertion.authenticator_data)
            .map_err(|e| malformed("authenticatorData", e.to_string()))?;
        Ok(Self {
            client_data_json,
            client_data,
            authenticator_data,
        })
    }

    /// Message the authenticator signed: `authData || SHA256(clientDataJSON)`
    pub fn signed_message(&self) -> Vec<u8> {
        webauthn_message(&self.authenticator_data, &self.client_data_json)
    }

    pub fn message_hash(&self) -> [u8; 32] {
        Sha256::digest(self.signed_message()).into()
    }

    /// Challenge bytes embedded in the client data
    pub fn challenge(&self) -> Result<Vec<u8>> {
        decode_base64url(&self.client_data.challenge).map_err(|e| {
            TransactionManagerError::InvalidChallenge(format!("challenge is not base64url: {e}"))
        })
    }
}

pub fn webauthn_message(authenticator_data: &[u8], client_data_json: &[u8]) -> Vec<u8> {
    let mut message = authenticator_data.to_vec();
    message.extend_from_slice(&Sha256::digest(client_data_json));
    message
}

/// Values bound into a transaction challenge
#[derive(Debug, Clone, Copy)]
pub struct ChallengeInput<'a> {
    pub payload: &'a [u8],
    pub origin: &'a str,
    /// Base64url-encoded device JWK, as sent
    pub device_jwk: &'a str,
    pub nonce: &'a str,
    pub slot_hash: &'a [u8; 32],
    pub slot_number: u64,
}

impl ChallengeInput<'_> {
    /// SHA-256 over the fields joined without separators or length
    /// prefixes. The wallet program derives the same bytes on chain, so the
    /// layout must stay byte-for-byte identical.
    pub fn challenge(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.payload);
        hasher.update(self.origin.as_bytes());
        hasher.update(self.device_jwk.as_bytes());
        hasher.update(self.nonce.as_bytes());
        hasher.update(self.slot_hash);
        hasher.update(self.slot_number.to_le_bytes());
        hasher.finalize().into()
    }
}
