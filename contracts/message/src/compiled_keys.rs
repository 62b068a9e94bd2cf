use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

use crate::account_keys::{LoadedAddresses, LookupTableAccount, MAX_ADDRESSABLE_KEYS};
use crate::error::{MessageError, Result};
use crate::wire::{MessageAddressTableLookup, MessageHeader};

/// Signer and writability flags accumulated for one address.
///
/// `is_invoked` is never set while compiling: wallet instructions reach
/// their programs through the vault CPI, so program ids are ordinary
/// accounts and may be loaded from a lookup table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyMeta {
    pub is_signer: bool,
    pub is_writable: bool,
    pub is_invoked: bool,
}

#[derive(Debug, Clone)]
struct KeySlot {
    address: Pubkey,
    meta: KeyMeta,
    active: bool,
}

/// Keys referenced by a set of instructions, in first-seen order.
///
/// Slots drained into a lookup table are deactivated rather than removed,
/// so iteration order stays stable across extraction passes.
#[derive(Debug, Clone)]
pub struct CompiledKeys {
    payer: Pubkey,
    slots: Vec<KeySlot>,
    index: HashMap<Pubkey, usize>,
}

impl CompiledKeys {
    pub fn compile(instructions: &[Instruction], payer: Pubkey) -> Self {
        let mut keys = Self {
            payer,
            slots: Vec::new(),
            index: HashMap::new(),
        };

        let payer_meta = keys.entry(payer);
        payer_meta.is_signer = true;
        payer_meta.is_writable = true;

        for ix in instructions {
            keys.entry(ix.program_id);
            for account_meta in &ix.accounts {
                let meta = keys.entry(account_meta.pubkey);
                meta.is_signer |= account_meta.is_signer;
                meta.is_writable |= account_meta.is_writable;
            }
        }

        keys
    }

    fn entry(&mut self, address: Pubkey) -> &mut KeyMeta {
        let slot = *self.index.entry(address).or_insert_with(|| {
            self.slots.push(KeySlot {
                address,
                meta: KeyMeta::default(),
                active: true,
            });
            self.slots.len() - 1
        });
        &mut self.slots[slot].meta
    }

    pub fn payer(&self) -> &Pubkey {
        &self.payer
    }

    /// Metadata of a key still to be emitted as a static key.
    pub fn get(&self, address: &Pubkey) -> Option<KeyMeta> {
        self.index
            .get(address)
            .map(|slot| &self.slots[*slot])
            .filter(|slot| slot.active)
            .map(|slot| slot.meta)
    }

    pub fn len(&self) -> usize {
        self.active().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn active(&self) -> impl Iterator<Item = &KeySlot> {
        self.slots.iter().filter(|slot| slot.active)
    }

    fn bucket(&self, is_signer: bool, is_writable: bool) -> Vec<Pubkey> {
        self.active()
            .filter(|slot| slot.meta.is_signer == is_signer && slot.meta.is_writable == is_writable)
            .map(|slot| slot.address)
            .collect()
    }

    /// Header and static keys ordered writable signers, readonly signers,
    /// writable non-signers, readonly non-signers.
    pub fn get_message_components(&self) -> Result<(MessageHeader, Vec<Pubkey>)> {
        if self.len() > MAX_ADDRESSABLE_KEYS {
            return Err(MessageError::TooManyAccounts);
        }

        let writable_signers = self.bucket(true, true);
        let readonly_signers = self.bucket(true, false);
        let writable_non_signers = self.bucket(false, true);
        let readonly_non_signers = self.bucket(false, false);

        match writable_signers.first() {
            None => return Err(MessageError::NoWritableSigner),
            Some(first) if *first != self.payer => return Err(MessageError::PayerNotFirst),
            Some(_) => {},
        }

        let to_u8 = |len: usize| u8::try_from(len).map_err(|_| MessageError::TooManyAccounts);
        let header = MessageHeader {
            num_signers: to_u8(writable_signers.len() + readonly_signers.len())?,
            num_writable_signers: to_u8(writable_signers.len())?,
            num_writable_non_signers: to_u8(writable_non_signers.len())?,
        };

        let static_keys = writable_signers
            .into_iter()
            .chain(readonly_signers)
            .chain(writable_non_signers)
            .chain(readonly_non_signers)
            .collect();

        Ok((header, static_keys))
    }

    /// Moves non-signer, non-invoked keys found in `table` out of the static
    /// key set. Returns `None` when no key matched.
    pub fn try_extract_table_lookup(
        &mut self,
        table: &LookupTableAccount,
    ) -> Result<Option<(MessageAddressTableLookup, LoadedAddresses)>> {
        let (writable_indexes, writable_slots) = self.try_find_keys_in_table(table, true)?;
        let (readonly_indexes, readonly_slots) = self.try_find_keys_in_table(table, false)?;

        if writable_indexes.is_empty() && readonly_indexes.is_empty() {
            return Ok(None);
        }

        let writable = self.drain_slots(&writable_slots);
        let readonly = self.drain_slots(&readonly_slots);
        Ok(Some((
            MessageAddressTableLookup {
                account_key: table.key,
                writable_indexes,
                readonly_indexes,
            },
            LoadedAddresses { writable, readonly },
        )))
    }

    /// Table indexes and slot positions of the drainable keys in `table`.
    fn try_find_keys_in_table(
        &self,
        table: &LookupTableAccount,
        is_writable: bool,
    ) -> Result<(Vec<u8>, Vec<usize>)> {
        let mut indexes = Vec::new();
        let mut slots = Vec::new();

        for (slot_index, slot) in self.slots.iter().enumerate() {
            let eligible = slot.active
                && !slot.meta.is_signer
                && !slot.meta.is_invoked
                && slot.meta.is_writable == is_writable;
            if !eligible {
                continue;
            }
            let Some(position) = table.addresses.iter().position(|key| *key == slot.address)
            else {
                continue;
            };
            let index = u8::try_from(position).map_err(|_| MessageError::LookupIndexOverflow)?;
            indexes.push(index);
            slots.push(slot_index);
        }

        Ok((indexes, slots))
    }

    fn drain_slots(&mut self, slot_indexes: &[usize]) -> Vec<Pubkey> {
        slot_indexes
            .iter()
            .filter_map(|&slot_index| {
                self.slots.get_mut(slot_index).map(|slot| {
                    slot.active = false;
                    slot.address
                })
            })
            .collect()
    }
}
