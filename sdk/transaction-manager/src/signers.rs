//! Signed messages of secp256r1 verify instructions and the signers of
//! multi-wallet instructions.

use revibase_interface::ids::SECP256R1_PROGRAM_ID;
use revibase_interface::state::SECP256R1_PUBKEY_LEN;
use revibase_interface::{Secp256r1Pubkey, Secp256r1VerifyArgs};
use sha2::{Digest, Sha256};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;

use crate::error::{Result, TransactionManagerError};
use crate::types::{PasskeyProof, SignerInfo};

pub const SIGNATURE_SERIALIZED_SIZE: usize = 64;
pub const SIGNATURE_OFFSETS_SERIALIZED_SIZE: usize = 14;
/// `[num_signatures: u8][padding: u8]`
pub const SIGNATURE_OFFSETS_START: usize = 2;
/// Instruction index meaning "the verify instruction itself"
pub const CURRENT_INSTRUCTION: u16 = u16::MAX;

/// Secp256r1 signature offsets structure (matches the native precompile)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Secp256r1SignatureOffsets {
    /// Offset to compact secp256r1 signature of 64 bytes
    pub signature_offset: u16,
    /// Instruction index where the signature can be found
    pub signature_instruction_index: u16,
    /// Offset to compressed public key of 33 bytes
    pub public_key_offset: u16,
    /// Instruction index where the public key can be found
    pub public_key_instruction_index: u16,
    /// Offset to the start of message data
    pub message_data_offset: u16,
    /// Size of message data in bytes
    pub message_data_size: u16,
    /// Instruction index where the message data can be found
    pub message_instruction_index: u16,
}

impl Secp256r1SignatureOffsets {
    /// Deserialize from bytes (14 bytes in little-endian format)
    pub fn from_bytes(bytes: &[u8; SIGNATURE_OFFSETS_SERIALIZED_SIZE]) -> Self {
        let field = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        Self {
            signature_offset: field(0),
            signature_instruction_index: field(2),
            public_key_offset: field(4),
            public_key_instruction_index: field(6),
            message_data_offset: field(8),
            message_data_size: field(10),
            message_instruction_index: field(12),
        }
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_OFFSETS_SERIALIZED_SIZE] {
        let mut bytes = [0u8; SIGNATURE_OFFSETS_SERIALIZED_SIZE];
        for (chunk, field) in bytes.chunks_exact_mut(2).zip([
            self.signature_offset,
            self.signature_instruction_index,
            self.public_key_offset,
            self.public_key_instruction_index,
            self.message_data_offset,
            self.message_data_size,
            self.message_instruction_index,
        ]) {
            chunk.copy_from_slice(&field.to_le_bytes());
        }
        bytes
    }
}

/// A message whose passkey signature the precompile checks on chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    pub public_key: Secp256r1Pubkey,
    pub message: Vec<u8>,
    pub message_hash: [u8; 32],
}

fn malformed(position: usize, what: &str) -> TransactionManagerError {
    TransactionManagerError::MalformedInstruction(format!(
        "secp256r1 verify instruction {position}: {what}"
    ))
}

fn slice_at<'a>(
    instructions: &'a [Instruction],
    position: usize,
    instruction_index: u16,
    offset: u16,
    len: usize,
) -> Result<&'a [u8]> {
    let data = if instruction_index == CURRENT_INSTRUCTION {
        &instructions[position].data
    } else {
        &instructions
            .get(instruction_index as usize)
            .ok_or_else(|| malformed(position, "instruction index out of range"))?
            .data
    };
    let start = offset as usize;
    data.get(start..start + len)
        .ok_or_else(|| malformed(position, "offset out of range"))
}

/// Unpacks the signed messages of the verify instruction at `position`.
fn parse_verify_instruction(
    instructions: &[Instruction],
    position: usize,
) -> Result<Vec<SignedMessage>> {
    let data = &instructions[position].data;
    let (&num_signatures, _) = data
        .split_first()
        .ok_or_else(|| malformed(position, "empty data"))?;

    (0..num_signatures as usize)
        .map(|i| {
            let start = SIGNATURE_OFFSETS_START + i * SIGNATURE_OFFSETS_SERIALIZED_SIZE;
            let offsets_bytes: &[u8; SIGNATURE_OFFSETS_SERIALIZED_SIZE] = data
                .get(start..start + SIGNATURE_OFFSETS_SERIALIZED_SIZE)
                .and_then(|bytes| bytes.try_into().ok())
                .ok_or_else(|| malformed(position, "truncated offsets"))?;
            let offsets = Secp256r1SignatureOffsets::from_bytes(offsets_bytes);

            let public_key = slice_at(
                instructions,
                position,
                offsets.public_key_instruction_index,
                offsets.public_key_offset,
                SECP256R1_PUBKEY_LEN,
            )?;
            let message = slice_at(
                instructions,
                position,
                offsets.message_instruction_index,
                offsets.message_data_offset,
                offsets.message_data_size as usize,
            )?;

            let mut key = [0u8; SECP256R1_PUBKEY_LEN];
            key.copy_from_slice(public_key);
            Ok(SignedMessage {
                public_key: Secp256r1Pubkey(key),
                message: message.to_vec(),
                message_hash: Sha256::digest(message).into(),
            })
        })
        .collect()
}

/// Signed messages of every secp256r1 verify instruction, flattened in
/// transaction order.
pub fn extract_signed_messages(instructions: &[Instruction]) -> Result<Vec<SignedMessage>> {
    let mut signed_messages = Vec::new();
    for (position, ix) in instructions.iter().enumerate() {
        if ix.program_id == SECP256R1_PROGRAM_ID {
            signed_messages.extend(parse_verify_instruction(instructions, position)?);
        }
    }
    tracing::trace!(count = signed_messages.len(), "extracted signed messages");
    Ok(signed_messages)
}

/// Signers of a multi-wallet instruction: every Ed25519 signer account
/// except the fee payer, then one passkey per verify argument.
pub fn instruction_signers(
    ix: &Instruction,
    fee_payer: &Pubkey,
    verify_args: &[Secp256r1VerifyArgs],
    signed_messages: &[SignedMessage],
) -> Result<Vec<SignerInfo>> {
    let mut signers: Vec<SignerInfo> = Vec::new();
    for meta in &ix.accounts {
        let signer = SignerInfo::Plain(meta.pubkey);
        if meta.is_signer && meta.pubkey != *fee_payer && !signers.contains(&signer) {
            signers.push(signer);
        }
    }

    for args in verify_args {
        let signed = signed_messages
            .get(args.signed_message_index as usize)
            .ok_or(TransactionManagerError::SignedMessageNotFound {
                index: args.signed_message_index,
                available: signed_messages.len(),
            })?;
        signers.push(SignerInfo::Passkey {
            public_key: signed.public_key,
            proof: Some(PasskeyProof {
                message_hash: signed.message_hash,
                slot_number: args.slot_number,
            }),
        });
    }

    Ok(signers)
}

/// Builds a secp256r1 verify instruction carrying everything in-line.
pub fn new_secp256r1_verify_instruction(
    entries: &[(Secp256r1Pubkey, [u8; SIGNATURE_SERIALIZED_SIZE], Vec<u8>)],
) -> Result<Instruction> {
    let too_large = || {
        TransactionManagerError::MalformedInstruction(
            "secp256r1 verify instruction exceeds u16 offsets".to_string(),
        )
    };
    let num_signatures = u8::try_from(entries.len()).map_err(|_| too_large())?;

    let mut offsets = Vec::with_capacity(entries.len());
    let mut payload = Vec::new();
    let mut cursor = SIGNATURE_OFFSETS_START + entries.len() * SIGNATURE_OFFSETS_SERIALIZED_SIZE;
    for (public_key, signature, message) in entries {
        let to_u16 = |value: usize| u16::try_from(value).map_err(|_| too_large());
        let public_key_offset = to_u16(cursor)?;
        let signature_offset = to_u16(cursor + SECP256R1_PUBKEY_LEN)?;
        let message_data_offset = to_u16(cursor + SECP256R1_PUBKEY_LEN + SIGNATURE_SERIALIZED_SIZE)?;
        offsets.push(Secp256r1SignatureOffsets {
            signature_offset,
            signature_instruction_index: CURRENT_INSTRUCTION,
            public_key_offset,
            public_key_instruction_index: CURRENT_INSTRUCTION,
            message_data_offset,
            message_data_size: to_u16(message.len())?,
            message_instruction_index: CURRENT_INSTRUCTION,
        });
        payload.extend_from_slice(public_key.as_ref());
        payload.extend_from_slice(signature);
        payload.extend_from_slice(message);
        cursor += SECP256R1_PUBKEY_LEN + SIGNATURE_SERIALIZED_SIZE + message.len();
    }

    let mut data = vec![num_signatures, 0];
    for offset in &offsets {
        data.extend_from_slice(&offset.to_bytes());
    }
    data.extend_from_slice(&payload);

    Ok(Instruction {
        program_id: SECP256R1_PROGRAM_ID,
        accounts: vec![],
        data,
    })
}
