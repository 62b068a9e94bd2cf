use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

/// Multi-wallet program id
pub const ID: Pubkey = pubkey!("reviR1xysEChySVSWGa43a6oJ2boJYTJhwRZCZwyHnR");

pub const SYSTEM_PROGRAM_ID: Pubkey = pubkey!("11111111111111111111111111111111");
pub const COMPUTE_BUDGET_PROGRAM_ID: Pubkey = pubkey!("ComputeBudget111111111111111111111111111111");
pub const MEMO_PROGRAM_ID: Pubkey = pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");
pub const SECP256R1_PROGRAM_ID: Pubkey = pubkey!("Secp256r1SigVerify1111111111111111111111111");

pub const INSTRUCTIONS_SYSVAR_ID: Pubkey = pubkey!("Sysvar1nstructions1111111111111111111111111");
pub const SLOT_HASHES_SYSVAR_ID: Pubkey = pubkey!("SysvarS1otHashes111111111111111111111111111");
pub const TOKEN_PROGRAM_ID: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
pub const TOKEN_2022_PROGRAM_ID: Pubkey = pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// Light Protocol programs used by compressed settings
pub const LIGHT_SYSTEM_PROGRAM_ID: Pubkey = pubkey!("SySTEM1eSU2p4BGQfQpimFEWWSC1XDFeun3Nqzz3rT7");
pub const ACCOUNT_COMPRESSION_PROGRAM_ID: Pubkey =
    pubkey!("compr6CUsB5m2jS4Y3831ztGSTnDpnKJTKS95d64XVq");
pub const NOOP_PROGRAM_ID: Pubkey = pubkey!("noopb9bkMVfRPU8AsbpTUg8AQkHtKwMYZiFUjNRtMmV");

/// Address merkle tree holding compressed settings addresses
pub const ADDRESS_TREE: Pubkey = pubkey!("amt2kaJA14v3urZbZvnc5v2np8jqvc4Z8zDep5wbtzx");

/// Returns true when a top-level instruction for `program_id` may appear in a
/// transaction the Transaction Manager co-signs.
///
/// `multi_wallet_program` is passed explicitly so deployments on other
/// addresses (devnet, tests) share the same whitelist.
pub fn is_whitelisted_program(program_id: &Pubkey, multi_wallet_program: &Pubkey) -> bool {
    program_id == multi_wallet_program
        || *program_id == SYSTEM_PROGRAM_ID
        || *program_id == COMPUTE_BUDGET_PROGRAM_ID
        || *program_id == SECP256R1_PROGRAM_ID
        || *program_id == MEMO_PROGRAM_ID
}
