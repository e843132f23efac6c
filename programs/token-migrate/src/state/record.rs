use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    msg,
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{error::MigrateError, state::MigrationRecord};

/// One migrator's record, stored at ["record", state, migrator]
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecordAccount {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized flag
    pub is_initialized: bool,

    /// PDA bump
    pub bump: u8,

    /// Migration state this record belongs to
    pub state: Pubkey,

    pub migrator: Pubkey,

    pub record: MigrationRecord,
}

impl MigrationRecordAccount {
    pub const DISCRIMINATOR: [u8; 8] = [77, 73, 71, 82, 95, 82, 69, 67]; // "MIGR_REC"

    pub const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        1 + // bump
        32 + // state
        32 + // migrator
        MigrationRecord::LEN;

    pub fn new(state: Pubkey, migrator: Pubkey, bump: u8) -> Self {
        Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            bump,
            state,
            migrator,
            record: MigrationRecord::default(),
        }
    }

    pub fn unpack_from_slice(data: &[u8]) -> Result<Self, ProgramError> {
        let account = Self::try_from_slice(data).map_err(|_| ProgramError::InvalidAccountData)?;
        account.validate()?;
        Ok(account)
    }

    /// Load the record of `migrator` under `state`
    pub fn load(
        account_info: &AccountInfo,
        program_id: &Pubkey,
        state: &Pubkey,
        migrator: &Pubkey,
    ) -> Result<Self, ProgramError> {
        if account_info.owner != program_id {
            msg!("Record account is not owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }
        let account = Self::unpack_from_slice(&account_info.try_borrow_data()?)?;
        if account.state != *state || account.migrator != *migrator {
            msg!("Record {} belongs to {} under {}", account_info.key, account.migrator, account.state);
            return Err(MigrateError::InvalidRecordAccount.into());
        }
        Ok(account)
    }

    pub fn save(&self, account_info: &AccountInfo) -> Result<(), ProgramError> {
        let mut data = account_info.try_borrow_mut_data()?;
        self.serialize(&mut &mut data[..])?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ProgramError> {
        if self.discriminator != Self::DISCRIMINATOR {
            return Err(ProgramError::InvalidAccountData);
        }
        if !self.is_initialized {
            return Err(MigrateError::AccountNotInitialized.into());
        }
        Ok(())
    }
}
