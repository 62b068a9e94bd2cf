use revibase_interface::instruction::TransactionBufferCreateArgs;
use revibase_message::WrappedTransactionMessage;
use sha2::{Digest, Sha256};
use solana_sdk::instruction::Instruction;

use crate::error::{Result, TransactionManagerError};
use crate::lookup::LookupResolver;

/// Rejects a buffer whose bytes do not hash to the declared final hash.
pub fn check_buffer_hash(args: &TransactionBufferCreateArgs) -> Result<()> {
    let hash: [u8; 32] = Sha256::digest(&args.buffer).into();
    if hash != args.final_buffer_hash {
        tracing::warn!(
            buffer_index = args.buffer_index,
            len = args.buffer.len(),
            final_size = args.final_buffer_size,
            "transaction buffer hash mismatch"
        );
        return Err(TransactionManagerError::BufferHashMismatch);
    }
    Ok(())
}

/// Instructions carried by a buffered wrapped transaction message.
pub async fn buffered_instructions(
    lookup: &LookupResolver,
    buffer: &[u8],
) -> Result<Vec<Instruction>> {
    let message = WrappedTransactionMessage::decode(buffer)?;
    let tables: Vec<_> = message
        .address_table_lookups
        .iter()
        .map(|lookup| lookup.account_key)
        .collect();
    let contents = lookup.resolve(&tables).await?;
    Ok(message.decompile(&contents)?)
}
