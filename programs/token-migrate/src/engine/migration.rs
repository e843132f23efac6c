use solana_program::{msg, program_error::ProgramError, pubkey::Pubkey};

use crate::{
    error::MigrateError,
    events::MigrateEvent,
    state::{MigrationRecord, TokenMigrator},
    token::FungibleToken,
};

/// Allowance-driven 1:1 migration
pub struct MigrationEngine;

impl MigrationEngine {
    /// Convert the caller's whole input allowance into output tokens.
    ///
    /// `this` is the account the migration acts as: the allowance spender on
    /// both tokens and the custodian of migrated input tokens. `record` is the
    /// caller's own record, zeroed on a first migration. Checks run in
    /// a fixed order so the reported failure is deterministic:
    /// no input allowance, no output allowance, insufficient output
    /// allowance, then self-dealing.
    pub fn migrate<I, O>(
        state: &mut TokenMigrator,
        record: &mut MigrationRecord,
        caller: &Pubkey,
        this: &Pubkey,
        input: &mut I,
        output: &mut O,
    ) -> Result<MigrateEvent, ProgramError>
    where
        I: FungibleToken + ?Sized,
        O: FungibleToken + ?Sized,
    {
        if input.mint() != state.input_token() || output.mint() != state.output_token() {
            return Err(MigrateError::MintMismatch.into());
        }

        let active_manager = state.get_active_manager();

        let input_allowance = input.allowance(caller, this)?;
        if input_allowance == 0 {
            return Err(MigrateError::NoInputAllowance.into());
        }

        let output_allowance = output.allowance(&active_manager, this)?;
        if output_allowance == 0 {
            return Err(MigrateError::NoOutputAllowance.into());
        }

        if input_allowance > output_allowance {
            msg!(
                "Input allowance {} exceeds output allowance {}",
                input_allowance,
                output_allowance
            );
            return Err(MigrateError::OutputAllowanceInsufficient.into());
        }

        if *caller == active_manager {
            return Err(MigrateError::SelfDealingForbidden.into());
        }

        // Overflow is settled before any tokens move
        state
            .ledger()
            .check_record(record, input_allowance, input_allowance)?;

        input.transfer_from(this, caller, this, input_allowance)?;
        output.transfer_from(this, &active_manager, caller, input_allowance)?;

        state
            .ledger_mut()
            .record(caller, record, input_allowance, input_allowance)?;

        msg!("Migrated {} tokens for {}", input_allowance, caller);

        Ok(MigrateEvent::Migrated {
            migrator: *caller,
            migrated_tokens: input_allowance,
            distributed_tokens: input_allowance,
        })
    }
}
