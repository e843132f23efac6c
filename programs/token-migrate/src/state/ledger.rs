use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{msg, program_error::ProgramError, pubkey::Pubkey};

use crate::error::MigrateError;

/// Cumulative amounts moved for one migrator
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationRecord {
    pub migrated_amount: u128,
    pub distributed_amount: u128,
}

impl MigrationRecord {
    pub const LEN: usize = 16 + 16;
}

/// Global totals. Per-migrator records live outside the ledger and are
/// passed in, so the number of migrators is unbounded.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationLedger {
    tokens_migrated: u128,
    tokens_distributed: u128,
}

impl MigrationLedger {
    pub const LEN: usize = 16 + 16;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokens_migrated(&self) -> u128 {
        self.tokens_migrated
    }

    pub fn tokens_distributed(&self) -> u128 {
        self.tokens_distributed
    }

    /// Verify `record` can grow by these amounts without touching state
    pub(crate) fn check_record(
        &self,
        record: &MigrationRecord,
        migrated: u128,
        distributed: u128,
    ) -> Result<(), ProgramError> {
        self.next_totals(record, migrated, distributed).map(|_| ())
    }

    /// Add a completed migration to `record` and the totals. Totals only ever grow.
    pub(crate) fn record(
        &mut self,
        migrator: &Pubkey,
        record: &mut MigrationRecord,
        migrated: u128,
        distributed: u128,
    ) -> Result<(), ProgramError> {
        let (tokens_migrated, tokens_distributed, next) =
            self.next_totals(record, migrated, distributed)?;

        *record = next;
        self.tokens_migrated = tokens_migrated;
        self.tokens_distributed = tokens_distributed;

        msg!(
            "Ledger updated: {} migrated {} (total migrated {}, distributed {})",
            migrator,
            migrated,
            self.tokens_migrated,
            self.tokens_distributed
        );

        Ok(())
    }

    fn next_totals(
        &self,
        record: &MigrationRecord,
        migrated: u128,
        distributed: u128,
    ) -> Result<(u128, u128, MigrationRecord), ProgramError> {
        let next = MigrationRecord {
            migrated_amount: record
                .migrated_amount
                .checked_add(migrated)
                .ok_or(MigrateError::ArithmeticOverflow)?,
            distributed_amount: record
                .distributed_amount
                .checked_add(distributed)
                .ok_or(MigrateError::ArithmeticOverflow)?,
        };
        let tokens_migrated = self
            .tokens_migrated
            .checked_add(migrated)
            .ok_or(MigrateError::ArithmeticOverflow)?;
        let tokens_distributed = self
            .tokens_distributed
            .checked_add(distributed)
            .ok_or(MigrateError::ArithmeticOverflow)?;

        Ok((tokens_migrated, tokens_distributed, next))
    }
}
