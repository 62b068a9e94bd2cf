use anyhow::Result;
use revibase_interface::ids::{
    INSTRUCTIONS_SYSVAR_ID, MEMO_PROGRAM_ID, SLOT_HASHES_SYSVAR_ID, SYSTEM_PROGRAM_ID,
};
use revibase_interface::instruction::{encode_instruction_data, ChangeConfigArgs};
use revibase_interface::{MultiWalletInstruction, ID};
use revibase_transaction_manager::settings::vault_address;
use revibase_transaction_manager::signers::new_secp256r1_verify_instruction;
use revibase_transaction_manager::types::{StartRequestData, VerifiedSigner};
use revibase_transaction_manager::{SignatureLayer, TransactionManagerError};
use sha2::{Digest, Sha256};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

mod common;
use common::*;

fn change_config(settings: &Pubkey, payer: &Pubkey, members: &[Pubkey], passkeys: u8) -> Instruction {
    let mut accounts = vec![
        AccountMeta::new(*settings, false),
        AccountMeta::new(*payer, true),
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        AccountMeta::new_readonly(SLOT_HASHES_SYSVAR_ID, false),
        AccountMeta::new_readonly(INSTRUCTIONS_SYSVAR_ID, false),
    ];
    accounts.extend(members.iter().map(|member| AccountMeta::new_readonly(*member, true)));
    Instruction {
        program_id: ID,
        accounts,
        data: encode_instruction_data(
            MultiWalletInstruction::ChangeConfig,
            &ChangeConfigArgs {
                config_actions: vec![],
                secp256r1_verify_args: (0..passkeys).map(verify_args).collect(),
            },
        ).unwrap(),
    }
}

/// One passkey approving a transfer from `settings`' vault.
fn single_passkey_transfer(
    env: &TestEnv,
    settings: &Pubkey,
    params: &AuthorizationParams,
) -> (Authorization, Vec<Instruction>) {
    let passkey = TestPasskey::new(1);
    let auth = authorize(&passkey, &env.client, params);
    let instructions = vec![
        verify_instruction(&[&passkey], &[&auth]),
        transfer_intent(settings, &vault_address(&ID, settings), Some(verify_args(0))),
    ];
    (auth, instructions)
}

#[test_log::test(tokio::test)]
async fn test_verifies_passkey_transfer() -> Result<()> {
    let env = setup().await;
    let payer = Pubkey::new_unique();
    let settings = Pubkey::new_unique();
    let (auth, instructions) = single_passkey_transfer(&env, &settings, &AuthorizationParams::default());
    let tx = legacy_transaction(&payer, &instructions);

    let verified = env.manager.verify_transaction(&tx, &[auth.response.clone()]).await?;

    assert_eq!(verified.len(), 1);
    assert_eq!(verified[0].settings_address, Some(settings));
    assert_eq!(verified[0].instructions_to_verify, vec![instructions[1].clone()]);
    match &verified[0].signers[..] {
        [VerifiedSigner::Passkey {
            signer,
            wallet_address,
            client,
            device_jwk,
            auth_provider_jwk,
        }] => {
            assert_eq!(*signer, TestPasskey::new(1).public_key);
            assert_eq!(*wallet_address, Some(vault_address(&ID, &settings)));
            assert_eq!(client.origin, ORIGIN);
            assert_eq!(client.client_jwk, es256_jwk(&env.client));
            assert_eq!(*device_jwk, auth.response.device.jwk);
            assert_eq!(*auth_provider_jwk, None);
        },
        other => panic!("unexpected signers: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_only_pass_through_instructions() -> Result<()> {
    let env = setup().await;
    let payer = Pubkey::new_unique();
    let memo = Instruction::new_with_bytes(MEMO_PROGRAM_ID, b"gm", vec![]);
    let tx = legacy_transaction(&payer, &[memo]);

    assert!(env.manager.verify_transaction(&tx, &[]).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_signers_keep_positions() -> Result<()> {
    let env = setup().await;
    let payer = Pubkey::new_unique();
    let settings = Pubkey::new_unique();
    let member = Pubkey::new_unique();
    let first = TestPasskey::new(1);
    let second = TestPasskey::new(2);
    let first_auth = authorize(&first, &env.client, &AuthorizationParams::default());
    let second_auth = authorize(&second, &env.client, &AuthorizationParams::default());

    let instructions = vec![
        verify_instruction(&[&first, &second], &[&first_auth, &second_auth]),
        change_config(&settings, &payer, &[member], 2),
    ];
    let tx = legacy_transaction(&payer, &instructions);

    let responses = [first_auth.response.clone(), second_auth.response.clone()];
    let verified = env.manager.verify_transaction(&tx, &responses).await?;
    let signers = &verified[0].signers;
    assert_eq!(signers.len(), 3);
    assert!(matches!(&signers[0], VerifiedSigner::Plain { signer, .. } if *signer == member));
    assert!(matches!(&signers[1], VerifiedSigner::Passkey { signer, .. } if *signer == first.public_key));
    assert!(matches!(&signers[2], VerifiedSigner::Passkey { signer, .. } if *signer == second.public_key));
    let vault = vault_address(&ID, &settings);
    assert!(signers.iter().all(|signer| signer.wallet_address() == Some(&vault)));

    let swapped = [second_auth.response.clone(), first_auth.response.clone()];
    let err = env.manager.verify_transaction(&tx, &swapped).await.unwrap_err();
    assert!(matches!(err, TransactionManagerError::InvalidMessageHash(_)));
    Ok(())
}

#[tokio::test]
async fn test_tampered_message_fails_message_hash_layer() -> Result<()> {
    let env = setup().await;
    let payer = Pubkey::new_unique();
    let settings = Pubkey::new_unique();
    let passkey = TestPasskey::new(1);
    let auth = authorize(&passkey, &env.client, &AuthorizationParams::default());

    let mut tampered = auth.message.clone();
    tampered[40] ^= 0x01;
    let instructions = vec![
        new_secp256r1_verify_instruction(&[(passkey.public_key, auth.signature, tampered)])?,
        transfer_intent(&settings, &vault_address(&ID, &settings), Some(verify_args(0))),
    ];
    let tx = legacy_transaction(&payer, &instructions);

    let err = env.manager.verify_transaction(&tx, &[auth.response]).await.unwrap_err();
    assert!(matches!(err, TransactionManagerError::InvalidMessageHash(_)));
    assert_eq!(err.layer(), Some(SignatureLayer::MessageHash));
    Ok(())
}

#[tokio::test]
async fn test_response_count_must_match_passkeys() -> Result<()> {
    let env = setup().await;
    let settings = Pubkey::new_unique();
    let (auth, instructions) = single_passkey_transfer(&env, &settings, &AuthorizationParams::default());
    let tx = legacy_transaction(&Pubkey::new_unique(), &instructions);

    let err = env.manager.verify_transaction(&tx, &[]).await.unwrap_err();
    assert!(matches!(
        err,
        TransactionManagerError::SignerCountMismatch { expected: 1, actual: 0 }
    ));

    let responses = [auth.response.clone(), auth.response];
    let err = env.manager.verify_transaction(&tx, &responses).await.unwrap_err();
    assert!(matches!(
        err,
        TransactionManagerError::SignerCountMismatch { expected: 1, actual: 2 }
    ));
    Ok(())
}

#[tokio::test]
async fn test_expired_request() -> Result<()> {
    let env = setup().await;
    let settings = Pubkey::new_unique();
    let params = AuthorizationParams {
        valid_till: 1,
        ..Default::default()
    };
    let (auth, instructions) = single_passkey_transfer(&env, &settings, &params);
    let tx = legacy_transaction(&Pubkey::new_unique(), &instructions);

    let err = env.manager.verify_transaction(&tx, &[auth.response]).await.unwrap_err();
    assert!(matches!(err, TransactionManagerError::RequestExpired { valid_till: 1, .. }));
    Ok(())
}

#[tokio::test]
async fn test_message_request_is_rejected() -> Result<()> {
    let env = setup().await;
    let settings = Pubkey::new_unique();
    let (mut auth, instructions) = single_passkey_transfer(&env, &settings, &AuthorizationParams::default());
    auth.response.start_request.data = StartRequestData::Message {
        payload: "aGVsbG8=".to_string(),
    };
    let tx = legacy_transaction(&Pubkey::new_unique(), &instructions);

    let err = env.manager.verify_transaction(&tx, &[auth.response]).await.unwrap_err();
    assert!(matches!(err, TransactionManagerError::UnexpectedPayloadType));
    Ok(())
}

#[tokio::test]
async fn test_slot_must_match_verified_slot() -> Result<()> {
    let env = setup().await;
    let settings = Pubkey::new_unique();
    let (mut auth, instructions) = single_passkey_transfer(&env, &settings, &AuthorizationParams::default());
    auth.response.slot_number += 1;
    let tx = legacy_transaction(&Pubkey::new_unique(), &instructions);

    let err = env.manager.verify_transaction(&tx, &[auth.response]).await.unwrap_err();
    assert_eq!(err.layer(), Some(SignatureLayer::Challenge));
    Ok(())
}

#[tokio::test]
async fn test_device_signature_from_other_key() -> Result<()> {
    let env = setup().await;
    let settings = Pubkey::new_unique();
    let (mut auth, instructions) = single_passkey_transfer(&env, &settings, &AuthorizationParams::default());
    let message_hash: [u8; 32] = Sha256::digest(&auth.message).into();
    auth.response.device.jws = es256_jws(&signing_key(200), &message_hash);
    let tx = legacy_transaction(&Pubkey::new_unique(), &instructions);

    let err = env.manager.verify_transaction(&tx, &[auth.response]).await.unwrap_err();
    assert!(matches!(err, TransactionManagerError::DeviceSignatureInvalid(_)));
    Ok(())
}

#[tokio::test]
async fn test_unknown_client_origin() -> Result<()> {
    let env = setup().await;
    let settings = Pubkey::new_unique();
    let params = AuthorizationParams {
        origin: "https://unknown.test".to_string(),
        ..Default::default()
    };
    let (auth, instructions) = single_passkey_transfer(&env, &settings, &params);
    let tx = legacy_transaction(&Pubkey::new_unique(), &instructions);

    let err = env.manager.verify_transaction(&tx, &[auth.response]).await.unwrap_err();
    assert_eq!(err.layer(), Some(SignatureLayer::Client));
    Ok(())
}

#[tokio::test]
async fn test_client_document_is_cached() -> Result<()> {
    let env = setup().await;
    let settings = Pubkey::new_unique();
    let (auth, instructions) = single_passkey_transfer(&env, &settings, &AuthorizationParams::default());
    let tx = legacy_transaction(&Pubkey::new_unique(), &instructions);

    env.manager.verify_transaction(&tx, &[auth.response.clone()]).await?;
    env.manager.verify_transaction(&tx, &[auth.response]).await?;
    assert_eq!(env.well_known.fetches(), 1);
    Ok(())
}

#[tokio::test]
async fn test_send_tx_requires_auth_provider() -> Result<()> {
    let env = setup().await;
    let settings = Pubkey::new_unique();
    let params = AuthorizationParams {
        send_tx: true,
        ..Default::default()
    };
    let (auth, instructions) = single_passkey_transfer(&env, &settings, &params);
    let tx = legacy_transaction(&Pubkey::new_unique(), &instructions);

    let err = env.manager.verify_transaction(&tx, &[auth.response]).await.unwrap_err();
    assert!(matches!(err, TransactionManagerError::MissingAuthProvider));
    Ok(())
}

#[tokio::test]
async fn test_send_tx_client_signs_challenge() -> Result<()> {
    let env = setup().await;
    let settings = Pubkey::new_unique();
    let params = AuthorizationParams {
        send_tx: true,
        auth_provider: Some(77),
        ..Default::default()
    };
    let (auth, instructions) = single_passkey_transfer(&env, &settings, &params);
    let tx = legacy_transaction(&Pubkey::new_unique(), &instructions);

    let verified = env.manager.verify_transaction(&tx, &[auth.response.clone()]).await?;
    assert!(matches!(
        &verified[0].signers[0],
        VerifiedSigner::Passkey { auth_provider_jwk: Some(jwk), .. } if *jwk == es256_jwk(&signing_key(77))
    ));

    // A client signature over the message hash does not authorize sending.
    let mut over_hash = auth.response;
    let message_hash: [u8; 32] = Sha256::digest(&auth.message).into();
    over_hash.client.jws = es256_jws(&env.client, &message_hash);
    let err = env.manager.verify_transaction(&tx, &[over_hash]).await.unwrap_err();
    assert!(matches!(err, TransactionManagerError::ClientSignatureInvalid(_)));
    Ok(())
}
