use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

use crate::error::{MessageError, Result};
use crate::wire::{CompiledInstruction, MessageHeader};

/// Largest number of keys addressable by a single-byte index
pub const MAX_ADDRESSABLE_KEYS: usize = u8::MAX as usize + 1;

/// Contents of an address lookup table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTableAccount {
    pub key: Pubkey,
    pub addresses: Vec<Pubkey>,
}

/// Keys drained from lookup tables, in extraction order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedAddresses {
    pub writable: Vec<Pubkey>,
    pub readonly: Vec<Pubkey>,
}

impl FromIterator<LoadedAddresses> for LoadedAddresses {
    fn from_iter<T: IntoIterator<Item = LoadedAddresses>>(iter: T) -> Self {
        let (writable, readonly): (Vec<Vec<Pubkey>>, Vec<Vec<Pubkey>>) = iter
            .into_iter()
            .map(|loaded| (loaded.writable, loaded.readonly))
            .unzip();
        LoadedAddresses {
            writable: writable.into_iter().flatten().collect(),
            readonly: readonly.into_iter().flatten().collect(),
        }
    }
}

impl LoadedAddresses {
    pub fn len(&self) -> usize {
        self.writable.len() + self.readonly.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flat view over the three key segments of a message: static keys,
/// lookup-writable keys, lookup-readonly keys.
pub struct MessageAccountKeys<'a> {
    static_keys: &'a [Pubkey],
    loaded_addresses: Option<&'a LoadedAddresses>,
}

impl<'a> MessageAccountKeys<'a> {
    pub fn new(static_keys: &'a [Pubkey], loaded_addresses: Option<&'a LoadedAddresses>) -> Self {
        Self {
            static_keys,
            loaded_addresses,
        }
    }

    fn segments(&self) -> [&'a [Pubkey]; 3] {
        match self.loaded_addresses {
            Some(loaded) => [
                self.static_keys,
                loaded.writable.as_slice(),
                loaded.readonly.as_slice(),
            ],
            None => [self.static_keys, &[], &[]],
        }
    }

    pub fn static_len(&self) -> usize {
        self.static_keys.len()
    }

    pub fn len(&self) -> usize {
        self.segments().iter().map(|segment| segment.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, mut index: usize) -> Option<&'a Pubkey> {
        for segment in self.segments() {
            if index < segment.len() {
                return Some(&segment[index]);
            }
            index -= segment.len();
        }
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Pubkey> {
        self.segments().into_iter().flatten()
    }

    /// Role of the key at a flat index, given the message header.
    fn account_meta(&self, header: &MessageHeader, index: u8) -> Result<AccountMeta> {
        let index_usize = index as usize;
        let pubkey = *self
            .get(index_usize)
            .ok_or(MessageError::InvalidAccountIndex(index))?;

        let static_len = self.static_len();
        let (is_signer, is_writable) = if index_usize < static_len {
            (
                header.is_signer_index(index_usize),
                header.is_static_writable_index(index_usize),
            )
        } else {
            let writable_len = self
                .loaded_addresses
                .map(|loaded| loaded.writable.len())
                .unwrap_or_default();
            (false, index_usize - static_len < writable_len)
        };

        Ok(AccountMeta {
            pubkey,
            is_signer,
            is_writable,
        })
    }

    /// Resolves program ids and account metas of `instructions` to flat indexes.
    pub fn try_compile_instructions(
        &self,
        instructions: &[Instruction],
    ) -> Result<Vec<CompiledInstruction>> {
        if self.len() > MAX_ADDRESSABLE_KEYS {
            return Err(MessageError::AccountIndexOverflow);
        }

        let mut index_map = HashMap::with_capacity(self.len());
        for (index, key) in self.iter().enumerate() {
            // First occurrence wins.
            index_map.entry(key).or_insert(index as u8);
        }

        let lookup = |key: &Pubkey| -> Result<u8> {
            index_map
                .get(key)
                .copied()
                .ok_or(MessageError::UnknownAccountKey(*key))
        };

        instructions
            .iter()
            .map(|ix| {
                let account_indexes = ix
                    .accounts
                    .iter()
                    .map(|meta| lookup(&meta.pubkey))
                    .collect::<Result<Vec<u8>>>()?;
                Ok(CompiledInstruction {
                    program_id_index: lookup(&ix.program_id)?,
                    account_indexes,
                    data: ix.data.clone(),
                })
            })
            .collect()
    }

    /// Inverse of [`Self::try_compile_instructions`].
    pub fn decompile_instructions(
        &self,
        header: &MessageHeader,
        instructions: &[CompiledInstruction],
    ) -> Result<Vec<Instruction>> {
        instructions
            .iter()
            .map(|ix| {
                let program_id = *self
                    .get(ix.program_id_index as usize)
                    .ok_or(MessageError::InvalidAccountIndex(ix.program_id_index))?;
                let accounts = ix
                    .account_indexes
                    .iter()
                    .map(|index| self.account_meta(header, *index))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Instruction {
                    program_id,
                    accounts,
                    data: ix.data.clone(),
                })
            })
            .collect()
    }
}
