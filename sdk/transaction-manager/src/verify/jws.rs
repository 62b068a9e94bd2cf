//! Compact JWS verification for ES256 and EdDSA keys.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature as P256Signature, VerifyingKey};
use serde::Deserialize;
use solana_sdk::signature::Signature as Ed25519Signature;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JwsError {
    #[error("invalid encoding: {0}")]
    Encoding(String),

    #[error("unsupported key: {0}")]
    UnsupportedKey(String),

    #[error("algorithm {actual} does not match key algorithm {expected}")]
    AlgorithmMismatch { expected: &'static str, actual: String },

    #[error("payload does not match the expected bytes")]
    PayloadMismatch,

    #[error("signature verification failed")]
    BadSignature,
}

/// Decodes base64url, with or without padding.
pub fn decode_base64url(encoded: &str) -> Result<Vec<u8>, JwsError> {
    URL_SAFE_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .map_err(|e| JwsError::Encoding(e.to_string()))
}

pub fn encode_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Deserialize)]
struct RawJwk {
    kty: String,
    crv: Option<String>,
    x: Option<String>,
    y: Option<String>,
}

#[derive(Deserialize)]
struct JwsHeader {
    alg: String,
}

/// A public JWK
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicJwk {
    /// EC P-256
    Es256(VerifyingKey),
    /// OKP Ed25519
    EdDsa([u8; 32]),
}

fn coordinate(value: Option<&String>, name: &str) -> Result<[u8; 32], JwsError> {
    let value = value.ok_or_else(|| JwsError::UnsupportedKey(format!("missing {name}")))?;
    decode_base64url(value)?
        .try_into()
        .map_err(|_| JwsError::UnsupportedKey(format!("{name} is not 32 bytes")))
}

impl PublicJwk {
    /// Parses a base64url-encoded JSON JWK.
    pub fn from_base64url(encoded: &str) -> Result<Self, JwsError> {
        let json = decode_base64url(encoded)?;
        let raw: RawJwk =
            serde_json::from_slice(&json).map_err(|e| JwsError::Encoding(e.to_string()))?;

        match (raw.kty.as_str(), raw.crv.as_deref()) {
            ("EC", Some("P-256")) => {
                let x = coordinate(raw.x.as_ref(), "x")?;
                let y = coordinate(raw.y.as_ref(), "y")?;
                let mut sec1 = Vec::with_capacity(65);
                sec1.push(0x04);
                sec1.extend_from_slice(&x);
                sec1.extend_from_slice(&y);
                let key = VerifyingKey::from_sec1_bytes(&sec1)
                    .map_err(|e| JwsError::UnsupportedKey(e.to_string()))?;
                Ok(Self::Es256(key))
            },
            ("OKP", Some("Ed25519")) => Ok(Self::EdDsa(coordinate(raw.x.as_ref(), "x")?)),
            (kty, crv) => Err(JwsError::UnsupportedKey(format!("{kty}/{crv:?}"))),
        }
    }

    pub fn alg(&self) -> &'static str {
        match self {
            Self::Es256(_) => "ES256",
            Self::EdDsa(_) => "EdDSA",
        }
    }

    fn verify_signature(&self, signing_input: &[u8], signature: &[u8]) -> Result<(), JwsError> {
        match self {
            Self::Es256(key) => {
                let signature =
                    P256Signature::from_slice(signature).map_err(|_| JwsError::BadSignature)?;
                key.verify(signing_input, &signature)
                    .map_err(|_| JwsError::BadSignature)
            },
            Self::EdDsa(key) => {
                let signature =
                    Ed25519Signature::try_from(signature).map_err(|_| JwsError::BadSignature)?;
                if signature.verify(key, signing_input) {
                    Ok(())
                } else {
                    Err(JwsError::BadSignature)
                }
            },
        }
    }
}

/// Verifies a compact JWS over `expected_payload`.
///
/// An empty payload segment is a detached payload and stands for
/// `expected_payload`.
pub fn verify_compact(jws: &str, jwk: &PublicJwk, expected_payload: &[u8]) -> Result<(), JwsError> {
    let mut parts = jws.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(JwsError::Encoding("expected three segments".to_string()));
    };

    let header: JwsHeader = serde_json::from_slice(&decode_base64url(header_b64)?)
        .map_err(|e| JwsError::Encoding(e.to_string()))?;
    if header.alg != jwk.alg() {
        return Err(JwsError::AlgorithmMismatch {
            expected: jwk.alg(),
            actual: header.alg,
        });
    }

    let expected_b64 = encode_base64url(expected_payload);
    let payload_b64 = match payload_b64 {
        "" => expected_b64.as_str(),
        attached if attached == expected_b64 => attached,
        _ => return Err(JwsError::PayloadMismatch),
    };

    let signing_input = format!("{header_b64}.{payload_b64}");
    let signature = decode_base64url(signature_b64)?;
    jwk.verify_signature(signing_input.as_bytes(), &signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::Signer as _;
    use p256::ecdsa::SigningKey;
    use solana_sdk::signature::{Keypair, Signer as _};

    fn es256_jwk(key: &SigningKey) -> String {
        let point = key.verifying_key().to_encoded_point(false);
        let json = serde_json::json!({
            "kty": "EC",
            "crv": "P-256",
            "x": encode_base64url(point.x().unwrap()),
            "y": encode_base64url(point.y().unwrap()),
        });
        encode_base64url(json.to_string().as_bytes())
    }

    fn es256_jws(key: &SigningKey, payload: &[u8], detached: bool) -> String {
        let header = encode_base64url(br#"{"alg":"ES256"}"#);
        let payload = encode_base64url(payload);
        let signature: P256Signature = key.sign(format!("{header}.{payload}").as_bytes());
        let payload = if detached { "" } else { payload.as_str() };
        format!("{header}.{payload}.{}", encode_base64url(&signature.to_bytes()))
    }

    #[test]
    fn test_es256_attached_and_detached() {
        let key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let jwk = PublicJwk::from_base64url(&es256_jwk(&key)).unwrap();
        assert_eq!(jwk.alg(), "ES256");

        let message = [1u8; 32];
        assert_eq!(verify_compact(&es256_jws(&key, &message, false), &jwk, &message), Ok(()));
        assert_eq!(verify_compact(&es256_jws(&key, &message, true), &jwk, &message), Ok(()));

        assert_eq!(
            verify_compact(&es256_jws(&key, &message, false), &jwk, &[2u8; 32]),
            Err(JwsError::PayloadMismatch)
        );
        assert_eq!(
            verify_compact(&es256_jws(&key, &message, true), &jwk, &[2u8; 32]),
            Err(JwsError::BadSignature)
        );
    }

    #[test]
    fn test_eddsa() {
        let keypair = Keypair::new();
        let x = encode_base64url(keypair.pubkey().as_ref());
        let jwk_json = format!(r#"{{"kty":"OKP","crv":"Ed25519","x":"{x}"}}"#);
        let jwk = PublicJwk::from_base64url(&encode_base64url(jwk_json.as_bytes())).unwrap();

        let header = encode_base64url(br#"{"alg":"EdDSA"}"#);
        let payload = encode_base64url(b"hash");
        let signature = keypair.sign_message(format!("{header}.{payload}").as_bytes());
        let jws = format!("{header}.{payload}.{}", encode_base64url(signature.as_ref()));

        assert_eq!(verify_compact(&jws, &jwk, b"hash"), Ok(()));
    }

    #[test]
    fn test_algorithm_must_match_key() {
        let key = SigningKey::from_slice(&[9u8; 32]).unwrap();
        let jwk = PublicJwk::from_base64url(&es256_jwk(&key)).unwrap();
        let header = encode_base64url(br#"{"alg":"EdDSA"}"#);
        let jws = format!("{header}..AAAA");
        assert!(matches!(
            verify_compact(&jws, &jwk, b"x"),
            Err(JwsError::AlgorithmMismatch { expected: "ES256", .. })
        ));
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(matches!(
            PublicJwk::from_base64url(&encode_base64url(br#"{"kty":"RSA"}"#)),
            Err(JwsError::UnsupportedKey(_))
        ));
        assert!(PublicJwk::from_base64url("!!").is_err());

        let key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let jwk = PublicJwk::from_base64url(&es256_jwk(&key)).unwrap();
        assert!(matches!(verify_compact("a.b", &jwk, b""), Err(JwsError::Encoding(_))));
        assert!(matches!(verify_compact("a.b.c.d", &jwk, b""), Err(JwsError::Encoding(_))));
    }

    #[test]
    fn test_padded_base64url() {
        assert_eq!(decode_base64url("YQ==").unwrap(), b"a");
        assert_eq!(decode_base64url("YQ").unwrap(), b"a");
    }
}
