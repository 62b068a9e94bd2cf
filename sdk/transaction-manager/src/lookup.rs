use futures::future::join_all;
use revibase_interface::lookup_table::{PINNED_LOOKUP_TABLE, PINNED_LOOKUP_TABLE_ADDRESSES};
use solana_sdk::address_lookup_table::state::AddressLookupTable;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::connection::SolConnection;
use crate::error::{Result, TransactionManagerError};

/// Resolves address lookup table contents.
///
/// The project's pinned table is answered from the local copy and never
/// fetched.
pub struct LookupResolver {
    connection: Arc<dyn SolConnection>,
}

impl LookupResolver {
    pub fn new(connection: Arc<dyn SolConnection>) -> Self {
        Self { connection }
    }

    /// Contents of every table in `tables`, fetched concurrently.
    pub async fn resolve(&self, tables: &[Pubkey]) -> Result<HashMap<Pubkey, Vec<Pubkey>>> {
        let mut unique = tables.to_vec();
        unique.sort();
        unique.dedup();

        let fetched = join_all(unique.iter().map(|table| self.resolve_one(table))).await;
        unique
            .into_iter()
            .zip(fetched)
            .map(|(table, addresses)| Ok((table, addresses?)))
            .collect()
    }

    async fn resolve_one(&self, table: &Pubkey) -> Result<Vec<Pubkey>> {
        if *table == PINNED_LOOKUP_TABLE {
            tracing::trace!(%table, "using pinned lookup table");
            return Ok(PINNED_LOOKUP_TABLE_ADDRESSES.to_vec());
        }

        let account = self
            .connection
            .get_account(table)
            .await
            .map_err(|e| TransactionManagerError::Connection(e.to_string()))?
            .ok_or(TransactionManagerError::LookupTableNotFound(*table))?;
        let lookup_table = AddressLookupTable::deserialize(&account.data).map_err(|e| {
            TransactionManagerError::MalformedInstruction(format!(
                "lookup table {table} is not decodable: {e}"
            ))
        })?;
        tracing::debug!(%table, len = lookup_table.addresses.len(), "resolved lookup table");
        Ok(lookup_table.addresses.to_vec())
    }
}
