//! Passkey authorization chain.
//!
//! Each passkey signer of an instruction is matched, by position, with an
//! authorization response and checked in five layers: the WebAuthn
//! challenge, the WebAuthn message hash, the device signature, the client
//! signature and the optional auth provider signature. All layers of a
//! signer run to completion and the first failure in that order is
//! reported.

pub mod jws;
pub mod webauthn;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::future::join_all;
use revibase_interface::Secp256r1Pubkey;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

use crate::core::well_known::{now_ms, WellKnownCache, WellKnownClient};
use crate::error::{Result, TransactionManagerError};
use crate::settings::vault_address;
use crate::types::{
    AuthorizationResponse, PasskeyProof, SignerInfo, StartRequestData, VerifiedClient,
    VerifiedSigner,
};
use jws::{verify_compact, PublicJwk};
use webauthn::{ChallengeInput, DecodedAssertion, WEBAUTHN_GET};

pub struct ChainVerifier {
    program_id: Pubkey,
    well_known: Arc<WellKnownCache>,
}

fn verify_jws(
    jwk: &str,
    jws: &str,
    payload: &[u8],
    error: fn(String) -> TransactionManagerError,
) -> Result<()> {
    let jwk = PublicJwk::from_base64url(jwk).map_err(|e| error(format!("jwk: {e}")))?;
    verify_compact(jws, &jwk, payload).map_err(|e| error(e.to_string()))
}

fn check_challenge(
    assertion: &DecodedAssertion,
    proof: Option<&PasskeyProof>,
    response: &AuthorizationResponse,
    expected: &[u8; 32],
) -> Result<()> {
    if assertion.client_data.kind != WEBAUTHN_GET {
        return Err(TransactionManagerError::InvalidChallenge(format!(
            "client data type is {}",
            assertion.client_data.kind
        )));
    }
    if let Some(proof) = proof {
        if proof.slot_number != response.slot_number {
            return Err(TransactionManagerError::InvalidChallenge(format!(
                "slot {} does not match the verified slot {}",
                response.slot_number, proof.slot_number
            )));
        }
    }
    if assertion.challenge()? != expected {
        return Err(TransactionManagerError::InvalidChallenge(
            "challenge does not match the request".to_string(),
        ));
    }
    Ok(())
}

fn check_message_hash(assertion: &DecodedAssertion, message_hash: Option<&[u8; 32]>) -> Result<()> {
    match message_hash {
        Some(hash) if *hash == assertion.message_hash() => Ok(()),
        Some(_) => Err(TransactionManagerError::InvalidMessageHash(
            "assertion does not hash to the verified message".to_string(),
        )),
        None => Err(TransactionManagerError::InvalidMessageHash(
            "no verified message for passkey".to_string(),
        )),
    }
}

fn check_device(response: &AuthorizationResponse, message_hash: Option<&[u8; 32]>) -> Result<()> {
    let hash = message_hash.ok_or_else(|| {
        TransactionManagerError::DeviceSignatureInvalid("no message hash".to_string())
    })?;
    verify_jws(
        &response.device.jwk,
        &response.device.jws,
        hash,
        TransactionManagerError::DeviceSignatureInvalid,
    )
}

/// Returns the auth provider JWK when one signed.
fn check_auth_provider(
    response: &AuthorizationResponse,
    send_tx: bool,
    message_hash: Option<&[u8; 32]>,
) -> Result<Option<String>> {
    let Some(auth_provider) = &response.auth_provider else {
        if send_tx {
            return Err(TransactionManagerError::MissingAuthProvider);
        }
        return Ok(None);
    };
    let hash = message_hash.ok_or_else(|| {
        TransactionManagerError::AuthProviderSignatureInvalid("no message hash".to_string())
    })?;
    verify_jws(
        &auth_provider.jwk,
        &auth_provider.jws,
        hash,
        TransactionManagerError::AuthProviderSignatureInvalid,
    )?;
    Ok(Some(auth_provider.jwk.clone()))
}

impl ChainVerifier {
    pub fn new(program_id: Pubkey, well_known: Arc<WellKnownCache>) -> Self {
        Self {
            program_id,
            well_known,
        }
    }

    async fn check_client(
        &self,
        response: &AuthorizationResponse,
        signed: Option<&[u8]>,
    ) -> Result<Arc<WellKnownClient>> {
        let client = self.well_known.get(&response.client.origin).await?;
        let signed = signed.ok_or_else(|| {
            TransactionManagerError::ClientSignatureInvalid("no message hash".to_string())
        })?;
        verify_jws(
            &client.client_jwk,
            &response.client.jws,
            signed,
            TransactionManagerError::ClientSignatureInvalid,
        )?;
        Ok(client)
    }

    /// Verifies the signers of one instruction. `responses` holds one entry
    /// per passkey signer, in signer order.
    pub async fn verify(
        &self,
        settings_address: Option<&Pubkey>,
        signers: &[SignerInfo],
        responses: &[AuthorizationResponse],
    ) -> Result<Vec<VerifiedSigner>> {
        let expected = signers.iter().filter(|signer| signer.is_passkey()).count();
        if expected != responses.len() {
            return Err(TransactionManagerError::SignerCountMismatch {
                expected,
                actual: responses.len(),
            });
        }

        let wallet_address = settings_address.map(|settings| vault_address(&self.program_id, settings));
        let mut responses = responses.iter();
        let checks = signers.iter().map(|signer| {
            // Passkeys consume responses in order; the count check above
            // guarantees one is available.
            let response = match signer {
                SignerInfo::Passkey { .. } => responses.next(),
                SignerInfo::Plain(_) => None,
            };
            async move {
                match (signer, response) {
                    (SignerInfo::Plain(key), _) => Ok(VerifiedSigner::Plain {
                        signer: *key,
                        wallet_address,
                    }),
                    (SignerInfo::Passkey { public_key, proof }, Some(response)) => {
                        self.verify_passkey(public_key, proof.as_ref(), response, wallet_address)
                            .await
                    },
                    (SignerInfo::Passkey { .. }, None) => {
                        Err(TransactionManagerError::SignerCountMismatch {
                            expected,
                            actual: expected - 1,
                        })
                    },
                }
            }
        });

        join_all(checks).await.into_iter().collect()
    }

    async fn verify_passkey(
        &self,
        public_key: &Secp256r1Pubkey,
        proof: Option<&PasskeyProof>,
        response: &AuthorizationResponse,
        wallet_address: Option<Pubkey>,
    ) -> Result<VerifiedSigner> {
        let now = now_ms();
        let valid_till = response.start_request.valid_till;
        if valid_till < now {
            return Err(TransactionManagerError::RequestExpired { valid_till, now });
        }
        let StartRequestData::Transaction { payload, send_tx } = &response.start_request.data
        else {
            return Err(TransactionManagerError::UnexpectedPayloadType);
        };
        let send_tx = *send_tx;

        let assertion = DecodedAssertion::decode(&response.auth_response)?;
        let payload = STANDARD.decode(payload).map_err(|e| {
            TransactionManagerError::MalformedAuthResponse(format!("payload: {e}"))
        })?;
        let slot_hash: [u8; 32] = bs58::decode(&response.slot_hash)
            .into_vec()
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| {
                TransactionManagerError::MalformedAuthResponse(
                    "slotHash is not a base58 32-byte hash".to_string(),
                )
            })?;
        let challenge = ChallengeInput {
            payload: &payload,
            origin: &response.client.origin,
            device_jwk: &response.device.jwk,
            nonce: &response.nonce,
            slot_hash: &slot_hash,
            slot_number: response.slot_number,
        }
        .challenge();
        let message_hash = proof.map(|proof| proof.message_hash);
        let client_payload = if send_tx {
            Some(challenge.to_vec())
        } else {
            message_hash.map(|hash| hash.to_vec())
        };

        let challenge_check = async { check_challenge(&assertion, proof, response, &challenge) };
        let message_hash_check = async { check_message_hash(&assertion, message_hash.as_ref()) };
        let device_check = async { check_device(response, message_hash.as_ref()) };
        let client_check = self.check_client(response, client_payload.as_deref());
        let auth_provider_check = async { check_auth_provider(response, send_tx, message_hash.as_ref()) };

        let (challenge_ok, message_hash_ok, device_ok, client, auth_provider_jwk) = futures::join!(
            challenge_check,
            message_hash_check,
            device_check,
            client_check,
            auth_provider_check
        );

        let outcome = challenge_ok
            .and(message_hash_ok)
            .and(device_ok)
            .and(client)
            .and_then(|client| auth_provider_jwk.map(|jwk| (client, jwk)));
        let (client, auth_provider_jwk) = match outcome {
            Ok(verified) => verified,
            Err(e) => {
                tracing::warn!(signer = %public_key, layer = ?e.layer(), error = %e, "passkey rejected");
                return Err(e);
            },
        };

        tracing::debug!(signer = %public_key, origin = %response.client.origin, "passkey verified");
        Ok(VerifiedSigner::Passkey {
            signer: *public_key,
            wallet_address,
            client: VerifiedClient {
                origin: response.client.origin.clone(),
                client_jwk: client.client_jwk.clone(),
                trusted_device_jwks: client.trusted_device_jwks.clone(),
                cached_at: client.cached_at,
            },
            device_jwk: response.device.jwk.clone(),
            auth_provider_jwk,
        })
    }
}
