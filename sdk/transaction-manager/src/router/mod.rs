//! Multi-wallet instruction routing.
//!
//! Every top-level instruction of a transaction must target a whitelisted
//! program. Multi-wallet instructions are classified by discriminator and
//! processed concurrently into a [`ProcessingResult`] each.

pub mod buffer;
pub mod execute_sync;
pub mod parse;

use futures::future::join_all;
use revibase_interface::instruction::CompressedSettingsRef;
use revibase_interface::{is_whitelisted_program, Secp256r1VerifyArgs};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

use crate::error::{Result, TransactionManagerError};
use crate::lookup::LookupResolver;
use crate::settings::SettingsResolver;
use crate::signers::{extract_signed_messages, instruction_signers, SignedMessage};
use crate::types::ProcessingResult;
use buffer::{buffered_instructions, check_buffer_hash};
use execute_sync::decompile_sync_message;
pub use parse::ParsedInstruction;

/// Transaction-wide inputs shared by every processor
struct RouteContext<'a> {
    fee_payer: &'a Pubkey,
    signed_messages: &'a [SignedMessage],
}

pub struct InstructionRouter {
    program_id: Pubkey,
    lookup: Arc<LookupResolver>,
    settings: Arc<SettingsResolver>,
}

fn account_at(ix: &Instruction, index: usize, name: &str) -> Result<Pubkey> {
    ix.accounts.get(index).map(|meta| meta.pubkey).ok_or_else(|| {
        TransactionManagerError::MalformedInstruction(format!(
            "missing {name} account at index {index}"
        ))
    })
}

impl InstructionRouter {
    pub fn new(
        program_id: Pubkey,
        lookup: Arc<LookupResolver>,
        settings: Arc<SettingsResolver>,
    ) -> Self {
        Self {
            program_id,
            lookup,
            settings,
        }
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// Fails on the first instruction whose program is not whitelisted.
    pub fn check_programs(&self, instructions: &[Instruction]) -> Result<()> {
        match instructions
            .iter()
            .find(|ix| !is_whitelisted_program(&ix.program_id, &self.program_id))
        {
            Some(ix) => Err(TransactionManagerError::UnauthorizedProgram(ix.program_id)),
            None => Ok(()),
        }
    }

    /// Processes every multi-wallet instruction of a transaction.
    ///
    /// Results keep the order of the instructions that produced them; no-op
    /// instructions produce none.
    pub async fn route(
        &self,
        instructions: &[Instruction],
        fee_payer: &Pubkey,
    ) -> Result<Vec<ProcessingResult>> {
        self.check_programs(instructions)?;
        let signed_messages = extract_signed_messages(instructions)?;
        let ctx = RouteContext {
            fee_payer,
            signed_messages: &signed_messages,
        };

        let processed = join_all(
            instructions
                .iter()
                .filter(|ix| ix.program_id == self.program_id)
                .map(|ix| self.process(ix, &ctx)),
        )
        .await;

        let mut results = Vec::with_capacity(processed.len());
        for result in processed {
            results.extend(result?);
        }
        Ok(results)
    }

    async fn process(
        &self,
        ix: &Instruction,
        ctx: &RouteContext<'_>,
    ) -> Result<Option<ProcessingResult>> {
        let parsed = ParsedInstruction::parse(&ix.data)?;

        let result = match parsed {
            ParsedInstruction::ChangeConfig(args) => self.wallet_result(
                account_at(ix, 0, "settings")?,
                ix,
                ctx,
                &args.secp256r1_verify_args,
                vec![ix.clone()],
            )?,
            ParsedInstruction::ChangeConfigCompressed(args) => self.wallet_result(
                self.compressed_settings(&args.settings).await?,
                ix,
                ctx,
                &args.secp256r1_verify_args,
                vec![ix.clone()],
            )?,
            ParsedInstruction::TransferIntent(args) => self.wallet_result(
                account_at(ix, 0, "settings")?,
                ix,
                ctx,
                args.secp256r1_verify_args.as_slice(),
                vec![ix.clone()],
            )?,
            ParsedInstruction::TransferIntentCompressed(args) => self.wallet_result(
                self.compressed_settings(&args.settings).await?,
                ix,
                ctx,
                args.secp256r1_verify_args.as_slice(),
                vec![ix.clone()],
            )?,
            ParsedInstruction::TransactionBufferCreate(args) => {
                check_buffer_hash(&args)?;
                let settings = account_at(ix, 0, "settings")?;
                let inner = buffered_instructions(&self.lookup, &args.buffer).await?;
                self.wallet_result(settings, ix, ctx, args.secp256r1_verify_args.as_slice(), inner)?
            },
            ParsedInstruction::TransactionBufferCreateCompressed(args) => {
                check_buffer_hash(&args.create)?;
                let settings = self.compressed_settings(&args.settings).await?;
                let inner = buffered_instructions(&self.lookup, &args.create.buffer).await?;
                self.wallet_result(
                    settings,
                    ix,
                    ctx,
                    args.create.secp256r1_verify_args.as_slice(),
                    inner,
                )?
            },
            ParsedInstruction::TransactionExecuteSync(args) => {
                let inner = decompile_sync_message(ix, &args.transaction_message)?;
                self.wallet_result(
                    account_at(ix, 0, "settings")?,
                    ix,
                    ctx,
                    &args.secp256r1_verify_args,
                    inner,
                )?
            },
            ParsedInstruction::TransactionExecuteSyncCompressed(args) => {
                let inner = decompile_sync_message(ix, &args.transaction_message)?;
                self.wallet_result(
                    self.compressed_settings(&args.settings).await?,
                    ix,
                    ctx,
                    &args.secp256r1_verify_args,
                    inner,
                )?
            },
            ParsedInstruction::CreateUserAccounts(args) => ProcessingResult {
                settings_address: None,
                signers: instruction_signers(
                    ix,
                    ctx.fee_payer,
                    args.secp256r1_verify_args.as_slice(),
                    ctx.signed_messages,
                )?,
                instructions_to_verify: vec![ix.clone()],
            },
            ParsedInstruction::EditTransactionManagerUrl(_) => ProcessingResult {
                settings_address: None,
                signers: instruction_signers(ix, ctx.fee_payer, &[], ctx.signed_messages)?,
                instructions_to_verify: vec![ix.clone()],
            },
            ParsedInstruction::NoOp(kind) => {
                tracing::debug!(instruction = ?kind, "no authorization needed");
                return Ok(None);
            },
            ParsedInstruction::Unrecognized(name) => {
                return Err(TransactionManagerError::UnknownInstruction(name));
            },
        };

        tracing::debug!(
            settings = ?result.settings_address,
            signers = result.signers.len(),
            passkeys = result.passkey_count(),
            inner = result.instructions_to_verify.len(),
            "processed multi-wallet instruction"
        );
        Ok(Some(result))
    }

    /// Wallet identity of a compressed-settings instruction. The wallet
    /// must exist in compressed or plain state.
    async fn compressed_settings(&self, settings: &CompressedSettingsRef) -> Result<Pubkey> {
        Ok(self.settings.resolve(settings.index).await?.settings_address)
    }

    fn wallet_result(
        &self,
        settings: Pubkey,
        ix: &Instruction,
        ctx: &RouteContext<'_>,
        verify_args: &[Secp256r1VerifyArgs],
        instructions_to_verify: Vec<Instruction>,
    ) -> Result<ProcessingResult> {
        Ok(ProcessingResult {
            settings_address: Some(settings),
            signers: instruction_signers(ix, ctx.fee_payer, verify_args, ctx.signed_messages)?,
            instructions_to_verify,
        })
    }
}
