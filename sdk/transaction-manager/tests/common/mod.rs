#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use p256::ecdsa::signature::Signer as _;
use p256::ecdsa::{Signature as P256Signature, SigningKey};
use revibase_interface::ids::{INSTRUCTIONS_SYSVAR_ID, SLOT_HASHES_SYSVAR_ID, SYSTEM_PROGRAM_ID};
use revibase_interface::instruction::{encode_instruction_data, TransferIntentArgs};
use revibase_interface::state::permission;
use revibase_interface::{
    Member, MemberKey, MultiWalletInstruction, Secp256r1Pubkey, Secp256r1VerifyArgs, Settings, ID,
};
use revibase_transaction_manager::core::compression::{
    CompressedAccount, CompressionRpc, ValidityProofWithContext,
};
use revibase_transaction_manager::core::connection::{BoxError, SolConnection};
use revibase_transaction_manager::core::well_known::{WellKnownDocument, WellKnownFetcher};
use revibase_transaction_manager::settings::compressed_settings_address;
use revibase_transaction_manager::signers::new_secp256r1_verify_instruction;
use revibase_transaction_manager::types::{
    AuthorizationResponse, ClientAuthorization, KeyAuthorization, StartRequest, StartRequestData,
    WebAuthnAssertion,
};
use revibase_transaction_manager::{TransactionManager, TransactionManagerConfig};
use sha2::{Digest, Sha256};
use solana_sdk::account::Account;
use solana_sdk::address_lookup_table::AddressLookupTableAccount;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::message::{v0, Message, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

pub const ORIGIN: &str = "https://app.revibase.test";
pub const SLOT_NUMBER: u64 = 312_000_123;
pub const SLOT_HASH: [u8; 32] = [0x5a; 32];
pub const NONCE: &str = "c2f1e0d9";

//=============================================================================
// Mock collaborators
//=============================================================================

#[derive(Default)]
pub struct MockConnection {
    accounts: RwLock<HashMap<Pubkey, Account>>,
    calls: AtomicUsize,
}

impl MockConnection {
    pub async fn set_account(&self, pubkey: Pubkey, data: Vec<u8>, owner: Pubkey) {
        let account = Account {
            lamports: 1_000_000,
            data,
            owner,
            executable: false,
            rent_epoch: 0,
        };
        self.accounts.write().await.insert(pubkey, account);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SolConnection for MockConnection {
    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.accounts.read().await.get(pubkey).cloned())
    }
}

/// Compression indexer whose proof endpoint fails `proof_failures` times
/// before answering.
#[derive(Default)]
pub struct MockCompression {
    accounts: RwLock<HashMap<[u8; 32], CompressedAccount>>,
    proof_failures: AtomicU32,
    proof_calls: AtomicU32,
}

impl MockCompression {
    pub fn failing_proofs(failures: u32) -> Self {
        Self {
            proof_failures: AtomicU32::new(failures),
            ..Default::default()
        }
    }

    pub async fn set_account(&self, account: CompressedAccount) {
        self.accounts.write().await.insert(account.address, account);
    }

    pub fn proof_calls(&self) -> u32 {
        self.proof_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompressionRpc for MockCompression {
    async fn get_compressed_account(
        &self,
        address: &[u8; 32],
    ) -> Result<Option<CompressedAccount>, BoxError> {
        Ok(self.accounts.read().await.get(address).cloned())
    }

    async fn get_validity_proof(
        &self,
        hashes: &[[u8; 32]],
    ) -> Result<ValidityProofWithContext, BoxError> {
        self.proof_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.proof_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.proof_failures.store(remaining - 1, Ordering::SeqCst);
            return Err("proof not ready".into());
        }
        Ok(ValidityProofWithContext {
            proof: None,
            root_indices: vec![7; hashes.len()],
        })
    }
}

#[derive(Default)]
pub struct MockWellKnown {
    documents: RwLock<HashMap<String, WellKnownDocument>>,
    fetches: AtomicUsize,
}

impl MockWellKnown {
    pub async fn publish(&self, origin: &str, jwk: Option<String>) {
        let document = WellKnownDocument {
            jwk,
            trusted_devices: None,
        };
        self.documents.write().await.insert(origin.to_string(), document);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WellKnownFetcher for MockWellKnown {
    async fn fetch(&self, origin: &str) -> Result<WellKnownDocument, BoxError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.documents
            .read()
            .await
            .get(origin)
            .cloned()
            .ok_or_else(|| format!("no well-known document for {origin}").into())
    }
}

//=============================================================================
// Keys and JWS
//=============================================================================

pub fn b64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

pub fn signing_key(seed: u8) -> SigningKey {
    SigningKey::from_slice(&[seed; 32]).unwrap()
}

pub fn es256_jwk(key: &SigningKey) -> String {
    let point = key.verifying_key().to_encoded_point(false);
    let json = serde_json::json!({
        "kty": "EC",
        "crv": "P-256",
        "x": b64url(point.x().unwrap()),
        "y": b64url(point.y().unwrap()),
    });
    b64url(json.to_string().as_bytes())
}

/// Compact ES256 JWS with the payload attached
pub fn es256_jws(key: &SigningKey, payload: &[u8]) -> String {
    let header = b64url(br#"{"alg":"ES256","typ":"JWT"}"#);
    let payload = b64url(payload);
    let signature: P256Signature = key.sign(format!("{header}.{payload}").as_bytes());
    format!("{header}.{payload}.{}", b64url(&signature.to_bytes()))
}

pub struct TestPasskey {
    key: SigningKey,
    device: SigningKey,
    pub public_key: Secp256r1Pubkey,
}

impl TestPasskey {
    pub fn new(seed: u8) -> Self {
        let key = signing_key(seed);
        let mut public_key = [0u8; 33];
        public_key.copy_from_slice(key.verifying_key().to_encoded_point(true).as_bytes());
        Self {
            key,
            device: signing_key(seed.wrapping_add(100)),
            public_key: Secp256r1Pubkey(public_key),
        }
    }

    pub fn device_jwk(&self) -> String {
        es256_jwk(&self.device)
    }
}

/// What the signer approved and how
#[derive(Debug, Clone)]
pub struct AuthorizationParams {
    pub origin: String,
    pub payload: Vec<u8>,
    pub send_tx: bool,
    pub slot_number: u64,
    pub valid_till: u64,
    pub auth_provider: Option<u8>,
}

impl Default for AuthorizationParams {
    fn default() -> Self {
        Self {
            origin: ORIGIN.to_string(),
            payload: b"serialized transaction".to_vec(),
            send_tx: false,
            slot_number: SLOT_NUMBER,
            valid_till: now_ms() + 60_000,
            auth_provider: None,
        }
    }
}

/// A passkey authorization: the client's response and the WebAuthn
/// message the authenticator signed.
pub struct Authorization {
    pub response: AuthorizationResponse,
    pub message: Vec<u8>,
    pub signature: [u8; 64],
}

pub fn authorize(passkey: &TestPasskey, client: &SigningKey, params: &AuthorizationParams) -> Authorization {
    let device_jwk = passkey.device_jwk();

    let mut hasher = Sha256::new();
    hasher.update(&params.payload);
    hasher.update(params.origin.as_bytes());
    hasher.update(device_jwk.as_bytes());
    hasher.update(NONCE.as_bytes());
    hasher.update(SLOT_HASH);
    hasher.update(params.slot_number.to_le_bytes());
    let challenge: [u8; 32] = hasher.finalize().into();

    let client_data_json = format!(
        r#"{{"type":"webauthn.get","challenge":"{}","origin":"{}","crossOrigin":false}}"#,
        b64url(&challenge),
        params.origin
    );
    let authenticator_data = [0x49u8; 37];
    let mut message = authenticator_data.to_vec();
    message.extend_from_slice(&Sha256::digest(client_data_json.as_bytes()));
    let message_hash: [u8; 32] = Sha256::digest(&message).into();

    let passkey_signature: P256Signature = passkey.key.sign(&message);
    let mut signature = [0u8; 64];
    signature.copy_from_slice(&passkey_signature.to_bytes());

    let client_payload = if params.send_tx { challenge } else { message_hash };
    let auth_provider = params.auth_provider.map(|seed| {
        let key = signing_key(seed);
        KeyAuthorization {
            jwk: es256_jwk(&key),
            jws: es256_jws(&key, &message_hash),
        }
    });

    let response = AuthorizationResponse {
        auth_response: WebAuthnAssertion {
            client_data_json: b64url(client_data_json.as_bytes()),
            authenticator_data: b64url(&authenticator_data),
            signature: Some(b64url(&signature)),
        },
        client: ClientAuthorization {
            origin: params.origin.clone(),
            jws: es256_jws(client, &client_payload),
        },
        device: KeyAuthorization {
            jwk: device_jwk,
            jws: es256_jws(&passkey.device, &message_hash),
        },
        auth_provider,
        start_request: StartRequest {
            valid_till: params.valid_till,
            data: StartRequestData::Transaction {
                payload: STANDARD.encode(&params.payload),
                send_tx: params.send_tx,
            },
        },
        slot_number: params.slot_number,
        slot_hash: bs58::encode(SLOT_HASH).into_string(),
        nonce: NONCE.to_string(),
    };

    Authorization {
        response,
        message,
        signature,
    }
}

/// Precompile instruction verifying every authorization, in order.
pub fn verify_instruction(passkeys: &[&TestPasskey], authorizations: &[&Authorization]) -> Instruction {
    let entries: Vec<_> = passkeys
        .iter()
        .zip(authorizations)
        .map(|(passkey, auth)| (passkey.public_key, auth.signature, auth.message.clone()))
        .collect();
    new_secp256r1_verify_instruction(&entries).unwrap()
}

//=============================================================================
// Instructions and transactions
//=============================================================================

pub fn verify_args(signed_message_index: u8) -> Secp256r1VerifyArgs {
    Secp256r1VerifyArgs {
        signed_message_index,
        slot_number: SLOT_NUMBER,
    }
}

pub fn transfer_intent(settings: &Pubkey, vault: &Pubkey, args: Option<Secp256r1VerifyArgs>) -> Instruction {
    Instruction {
        program_id: ID,
        accounts: vec![
            AccountMeta::new_readonly(*settings, false),
            AccountMeta::new_readonly(SLOT_HASHES_SYSVAR_ID, false),
            AccountMeta::new_readonly(INSTRUCTIONS_SYSVAR_ID, false),
            AccountMeta::new(*vault, false),
            AccountMeta::new(Pubkey::new_unique(), false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ],
        data: encode_instruction_data(
            MultiWalletInstruction::NativeTransferIntent,
            &TransferIntentArgs {
                amount: 1_000_000,
                secp256r1_verify_args: args,
            },
        ).unwrap(),
    }
}

pub fn legacy_transaction(payer: &Pubkey, instructions: &[Instruction]) -> VersionedTransaction {
    let message = Message::new(instructions, Some(payer));
    VersionedTransaction {
        signatures: vec![Signature::default(); message.header.num_required_signatures as usize],
        message: VersionedMessage::Legacy(message),
    }
}

pub fn v0_transaction(
    payer: &Pubkey,
    instructions: &[Instruction],
    tables: &[AddressLookupTableAccount],
) -> VersionedTransaction {
    let message = v0::Message::try_compile(payer, instructions, tables, Hash::default()).unwrap();
    VersionedTransaction {
        signatures: vec![Signature::default(); message.header.num_required_signatures as usize],
        message: VersionedMessage::V0(message),
    }
}

/// Single-passkey wallet `index`.
pub fn wallet_settings(index: u128, threshold: u8) -> Settings {
    Settings {
        index,
        members: vec![Member {
            pubkey: MemberKey::secp256r1(&TestPasskey::new(1).public_key),
            permissions: permission::INITIATE | permission::VOTE | permission::EXECUTE,
        }],
        threshold,
        multi_wallet_bump: 254,
        bump: 255,
    }
}

/// Compressed account holding `settings` at wallet `index`'s address.
pub fn compressed_settings_account(index: u128, settings: &Settings) -> CompressedAccount {
    CompressedAccount {
        address: compressed_settings_address(&ID, index),
        hash: [index as u8; 32],
        tree: Pubkey::new_unique(),
        leaf_index: 12,
        discriminator: [1; 8],
        data: borsh::to_vec(settings).unwrap(),
    }
}

/// Account data of an active address lookup table.
pub fn lookup_table_data(addresses: &[Pubkey]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&u64::MAX.to_le_bytes());
    data.extend_from_slice(&0u64.to_le_bytes());
    data.push(0);
    data.push(0);
    data.resize(56, 0);
    for address in addresses {
        data.extend_from_slice(address.as_ref());
    }
    data
}

//=============================================================================
// Environment
//=============================================================================

pub struct TestEnv {
    pub connection: Arc<MockConnection>,
    pub compression: Arc<MockCompression>,
    pub well_known: Arc<MockWellKnown>,
    pub client: SigningKey,
    pub manager: TransactionManager,
}

pub async fn setup() -> TestEnv {
    let connection = Arc::new(MockConnection::default());
    let compression = Arc::new(MockCompression::default());
    let well_known = Arc::new(MockWellKnown::default());
    let client = signing_key(42);
    well_known.publish(ORIGIN, Some(es256_jwk(&client))).await;

    let manager = TransactionManager::new(
        TransactionManagerConfig::default(),
        connection.clone(),
        compression.clone(),
        well_known.clone(),
    );
    TestEnv {
        connection,
        compression,
        well_known,
        client,
        manager,
    }
}
