use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{msg, program_error::ProgramError, pubkey::Pubkey};

use crate::{
    error::MigrateError,
    events::MigrateEvent,
    state::{RoleKind, RoleRegistry},
};

/// The output manager whose allowance currently funds distributions
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveManagerSelector {
    active: Pubkey,
}

impl ActiveManagerSelector {
    pub const LEN: usize = 32;

    pub fn new(initial: Pubkey) -> Self {
        Self { active: initial }
    }

    pub fn get_active(&self) -> Pubkey {
        self.active
    }

    /// Make `caller` the funding manager. Only output managers qualify.
    pub(crate) fn set_active(
        &mut self,
        output_managers: &RoleRegistry,
        caller: &Pubkey,
    ) -> Result<MigrateEvent, ProgramError> {
        if output_managers.kind() != RoleKind::OutputManager {
            return Err(MigrateError::NotOutputManager.into());
        }
        output_managers.require_member(caller)?;

        self.active = *caller;
        msg!("Active output manager set: {}", caller);

        Ok(MigrateEvent::ActiveOutputManagerSet {
            active_manager: *caller,
        })
    }
}
