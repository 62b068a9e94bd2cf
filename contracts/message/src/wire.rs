//! Byte layout of the wrapped transaction message.
//!
//! ```text
//! [num_signers: u8][num_writable_signers: u8][num_writable_non_signers: u8]
//! [num_keys: u8][account_keys: 32 * num_keys]
//! [num_ixs: u8] { [program_index: u8][n: u8][account_indices: n][len: u16 LE][data: len] }*
//! [num_lookups: u8] { [table: 32][n: u8][writable: n][m: u8][readonly: m] }*
//! ```

use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

use crate::account_keys::{LoadedAddresses, LookupTableAccount, MessageAccountKeys};
use crate::compiled_keys::CompiledKeys;
use crate::error::{MessageError, Result};

/// Signer and writability counts. Account keys are ordered writable
/// signers, readonly signers, writable non-signers, readonly non-signers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageHeader {
    pub num_signers: u8,
    pub num_writable_signers: u8,
    pub num_writable_non_signers: u8,
}

impl MessageHeader {
    pub fn is_signer_index(&self, index: usize) -> bool {
        index < self.num_signers as usize
    }

    /// Writability of a static key. Keys past the static segment are
    /// classified by the lookup segment they were loaded from instead.
    pub fn is_static_writable_index(&self, index: usize) -> bool {
        let num_signers = self.num_signers as usize;
        if index < num_signers {
            index < self.num_writable_signers as usize
        } else {
            index - num_signers < self.num_writable_non_signers as usize
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indexes: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAddressTableLookup {
    pub account_key: Pubkey,
    pub writable_indexes: Vec<u8>,
    pub readonly_indexes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedTransactionMessage {
    pub num_signers: u8,
    pub num_writable_signers: u8,
    pub num_writable_non_signers: u8,
    pub account_keys: Vec<Pubkey>,
    pub instructions: Vec<CompiledInstruction>,
    pub address_table_lookups: Vec<MessageAddressTableLookup>,
}

impl WrappedTransactionMessage {
    /// Compiles `instructions` with `payer` as the first writable signer,
    /// moving eligible keys into the given lookup tables.
    pub fn try_compile(
        payer: &Pubkey,
        instructions: &[Instruction],
        lookup_tables: &[LookupTableAccount],
    ) -> Result<Self> {
        let mut compiled_keys = CompiledKeys::compile(instructions, *payer);

        let mut address_table_lookups = Vec::with_capacity(lookup_tables.len());
        let mut loaded_addresses_list = Vec::with_capacity(lookup_tables.len());
        for table in lookup_tables {
            if let Some((lookup, loaded)) = compiled_keys.try_extract_table_lookup(table)? {
                address_table_lookups.push(lookup);
                loaded_addresses_list.push(loaded);
            }
        }

        let (header, static_keys) = compiled_keys.get_message_components()?;
        let loaded_addresses = LoadedAddresses::from_iter(loaded_addresses_list);
        let account_keys = MessageAccountKeys::new(&static_keys, Some(&loaded_addresses));
        let instructions = account_keys.try_compile_instructions(instructions)?;

        Ok(Self {
            num_signers: header.num_signers,
            num_writable_signers: header.num_writable_signers,
            num_writable_non_signers: header.num_writable_non_signers,
            account_keys: static_keys,
            instructions,
            address_table_lookups,
        })
    }

    /// Compiles without lookup tables; the lookup array is always empty.
    pub fn try_compile_legacy(payer: &Pubkey, instructions: &[Instruction]) -> Result<Self> {
        Self::try_compile(payer, instructions, &[])
    }

    pub fn header(&self) -> MessageHeader {
        MessageHeader {
            num_signers: self.num_signers,
            num_writable_signers: self.num_writable_signers,
            num_writable_non_signers: self.num_writable_non_signers,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut bytes = vec![
            self.num_signers,
            self.num_writable_signers,
            self.num_writable_non_signers,
        ];

        bytes.push(len_u8(self.account_keys.len(), "account keys")?);
        for key in &self.account_keys {
            bytes.extend_from_slice(key.as_ref());
        }

        bytes.push(len_u8(self.instructions.len(), "instructions")?);
        for ix in &self.instructions {
            bytes.push(ix.program_id_index);
            bytes.push(len_u8(ix.account_indexes.len(), "account indexes")?);
            bytes.extend_from_slice(&ix.account_indexes);
            let data_len = u16::try_from(ix.data.len()).map_err(|_| {
                MessageError::MalformedMessage("instruction data exceeds u16::MAX".to_string())
            })?;
            bytes.extend_from_slice(&data_len.to_le_bytes());
            bytes.extend_from_slice(&ix.data);
        }

        bytes.push(len_u8(self.address_table_lookups.len(), "lookups")?);
        for lookup in &self.address_table_lookups {
            bytes.extend_from_slice(lookup.account_key.as_ref());
            bytes.push(len_u8(lookup.writable_indexes.len(), "writable indexes")?);
            bytes.extend_from_slice(&lookup.writable_indexes);
            bytes.push(len_u8(lookup.readonly_indexes.len(), "readonly indexes")?);
            bytes.extend_from_slice(&lookup.readonly_indexes);
        }

        Ok(bytes)
    }

    /// Structural decode. Truncated buffers and trailing bytes both fail.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);

        let num_signers = reader.read_u8()?;
        let num_writable_signers = reader.read_u8()?;
        let num_writable_non_signers = reader.read_u8()?;

        let num_keys = reader.read_u8()? as usize;
        let mut account_keys = Vec::with_capacity(num_keys);
        for _ in 0..num_keys {
            account_keys.push(reader.read_pubkey()?);
        }

        let num_instructions = reader.read_u8()? as usize;
        let mut instructions = Vec::with_capacity(num_instructions);
        for _ in 0..num_instructions {
            let program_id_index = reader.read_u8()?;
            let num_accounts = reader.read_u8()? as usize;
            let account_indexes = reader.read_bytes(num_accounts)?.to_vec();
            let data_len = reader.read_u16()? as usize;
            let data = reader.read_bytes(data_len)?.to_vec();
            instructions.push(CompiledInstruction {
                program_id_index,
                account_indexes,
                data,
            });
        }

        let num_lookups = reader.read_u8()? as usize;
        let mut address_table_lookups = Vec::with_capacity(num_lookups);
        for _ in 0..num_lookups {
            let account_key = reader.read_pubkey()?;
            let num_writable = reader.read_u8()? as usize;
            let writable_indexes = reader.read_bytes(num_writable)?.to_vec();
            let num_readonly = reader.read_u8()? as usize;
            let readonly_indexes = reader.read_bytes(num_readonly)?.to_vec();
            address_table_lookups.push(MessageAddressTableLookup {
                account_key,
                writable_indexes,
                readonly_indexes,
            });
        }

        if !reader.is_empty() {
            return Err(MessageError::MalformedMessage(format!(
                "{} trailing bytes",
                reader.remaining()
            )));
        }

        Ok(Self {
            num_signers,
            num_writable_signers,
            num_writable_non_signers,
            account_keys,
            instructions,
            address_table_lookups,
        })
    }

    /// Collects the addresses this message loads from its lookup tables,
    /// writable ones first, each group in lookup order.
    pub fn loaded_addresses(
        &self,
        tables: &HashMap<Pubkey, Vec<Pubkey>>,
    ) -> Result<LoadedAddresses> {
        let mut loaded = LoadedAddresses::default();
        for lookup in &self.address_table_lookups {
            let addresses = tables
                .get(&lookup.account_key)
                .ok_or(MessageError::LookupTableNotFound(lookup.account_key))?;
            let resolve = |index: &u8| {
                addresses
                    .get(*index as usize)
                    .copied()
                    .ok_or(MessageError::InvalidLookupIndex {
                        table: lookup.account_key,
                        index: *index,
                    })
            };
            for index in &lookup.writable_indexes {
                loaded.writable.push(resolve(index)?);
            }
            for index in &lookup.readonly_indexes {
                loaded.readonly.push(resolve(index)?);
            }
        }
        Ok(loaded)
    }

    /// Rebuilds the logical instructions using resolved lookup table contents.
    pub fn decompile(&self, tables: &HashMap<Pubkey, Vec<Pubkey>>) -> Result<Vec<Instruction>> {
        let loaded = self.loaded_addresses(tables)?;
        let account_keys = MessageAccountKeys::new(&self.account_keys, Some(&loaded));
        account_keys.decompile_instructions(&self.header(), &self.instructions)
    }
}

fn len_u8(len: usize, what: &str) -> Result<u8> {
    u8::try_from(len)
        .map_err(|_| MessageError::MalformedMessage(format!("too many {what}: {len}")))
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(MessageError::MalformedMessage(format!(
                "needed {len} bytes at offset {}, {} left",
                self.offset,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_pubkey(&mut self) -> Result<Pubkey> {
        let bytes = self.read_bytes(32)?;
        let mut key = [0u8; 32];
        key.copy_from_slice(bytes);
        Ok(Pubkey::new_from_array(key))
    }
}
