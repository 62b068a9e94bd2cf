use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;

use crate::discriminator::AccountDiscriminator;
use crate::error::{InterfaceError, Result};

/// Seed prefix shared by every multi-wallet PDA
pub const SEED_MULTI_WALLET: &[u8] = b"multi_wallet";
/// Seed suffix of the vault PDA
pub const SEED_VAULT: &[u8] = b"vault";
/// Seed prefix of compressed settings addresses
pub const SEED_SETTINGS: &[u8] = b"settings";

pub const SECP256R1_PUBKEY_LEN: usize = 33;

/// Compressed secp256r1 public key (0x02/0x03 prefix + X coordinate)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, BorshSerialize, BorshDeserialize)]
pub struct Secp256r1Pubkey(pub [u8; SECP256R1_PUBKEY_LEN]);

impl Secp256r1Pubkey {
    pub fn to_bytes(&self) -> [u8; SECP256R1_PUBKEY_LEN] {
        self.0
    }
}

impl From<[u8; SECP256R1_PUBKEY_LEN]> for Secp256r1Pubkey {
    fn from(bytes: [u8; SECP256R1_PUBKEY_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Secp256r1Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Secp256r1Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Secp256r1Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secp256r1Pubkey({self})")
    }
}

/// Key type tag stored in front of every member key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KeyType {
    Ed25519 = 0,
    Secp256r1 = 1,
}

impl TryFrom<u8> for KeyType {
    type Error = InterfaceError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(KeyType::Ed25519),
            1 => Ok(KeyType::Secp256r1),
            other => Err(InterfaceError::UnknownKeyType(other)),
        }
    }
}

/// Member key as stored on-chain. Ed25519 keys occupy the first 32 bytes
/// with a trailing zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub struct MemberKey {
    pub key_type: u8,
    pub key: [u8; SECP256R1_PUBKEY_LEN],
}

impl MemberKey {
    pub fn ed25519(pubkey: &Pubkey) -> Self {
        let mut key = [0u8; SECP256R1_PUBKEY_LEN];
        key[..32].copy_from_slice(pubkey.as_ref());
        Self {
            key_type: KeyType::Ed25519 as u8,
            key,
        }
    }

    pub fn secp256r1(pubkey: &Secp256r1Pubkey) -> Self {
        Self {
            key_type: KeyType::Secp256r1 as u8,
            key: pubkey.0,
        }
    }

    pub fn kind(&self) -> Result<KeyType> {
        KeyType::try_from(self.key_type)
    }
}

/// Permission bits of a member
pub mod permission {
    pub const INITIATE: u8 = 1 << 0;
    pub const VOTE: u8 = 1 << 1;
    pub const EXECUTE: u8 = 1 << 2;
    pub const IS_DELEGATE: u8 = 1 << 3;
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Member {
    pub pubkey: MemberKey,
    pub permissions: u8,
}

impl Member {
    pub fn has(&self, permission: u8) -> bool {
        self.permissions & permission == permission
    }
}

/// Wallet settings, stored either in a plain PDA or as a compressed account.
///
/// PDA Seeds: ["multi_wallet", index.to_le_bytes()]
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Settings {
    pub index: u128,
    pub members: Vec<Member>,
    pub threshold: u8,
    pub multi_wallet_bump: u8,
    pub bump: u8,
}

impl Settings {
    /// Decodes a plain settings account (Anchor discriminator + borsh body).
    /// Trailing bytes from account over-allocation are ignored.
    pub fn from_account_data(data: &[u8]) -> Result<Self> {
        let mut body = AccountDiscriminator::Settings.strip(data)?;
        Self::deserialize(&mut body).map_err(|source| InterfaceError::Decode {
            layout: "Settings",
            source,
        })
    }

    /// Decodes the data of a compressed settings account, which carries its
    /// discriminator outside the data bytes.
    pub fn from_compressed_data(mut data: &[u8]) -> Result<Self> {
        Self::deserialize(&mut data).map_err(|source| InterfaceError::Decode {
            layout: "Settings",
            source,
        })
    }

    pub fn to_account_data(&self) -> Result<Vec<u8>> {
        let mut data = AccountDiscriminator::Settings.discriminator().to_vec();
        self.serialize(&mut data).map_err(|source| InterfaceError::Encode {
            layout: "Settings",
            source,
        })?;
        Ok(data)
    }

    pub fn find_member(&self, key: &MemberKey) -> Option<&Member> {
        self.members.iter().find(|member| member.pubkey == *key)
    }
}
