use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    msg,
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{
    error::MigrateError,
    events::MigrateEvent,
    state::{ActiveManagerSelector, MigrationLedger, RoleKind, RoleRegistry},
};

/// Token pair fixed at construction
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationConfig {
    input_token: Pubkey,
    output_token: Pubkey,
}

impl MigrationConfig {
    pub const LEN: usize = 32 + 32;

    pub fn new(input_token: Pubkey, output_token: Pubkey) -> Result<Self, ProgramError> {
        if input_token == output_token {
            return Err(MigrateError::IdenticalTokens.into());
        }
        Ok(Self {
            input_token,
            output_token,
        })
    }

    pub fn input_token(&self) -> Pubkey {
        self.input_token
    }

    pub fn output_token(&self) -> Pubkey {
        self.output_token
    }
}

/// Migration program state account
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenMigrator {
    /// Account discriminator
    pub discriminator: [u8; 8],

    /// Is initialized flag
    pub is_initialized: bool,

    /// Bump of the ["authority", state] PDA
    pub authority_bump: u8,

    config: MigrationConfig,
    output_managers: RoleRegistry,
    recoverers: RoleRegistry,
    active_manager: ActiveManagerSelector,
    ledger: MigrationLedger,
}

impl TokenMigrator {
    pub const DISCRIMINATOR: [u8; 8] = [84, 79, 75, 95, 77, 73, 71, 82]; // "TOK_MIGR"

    pub const LEN: usize = 8 + // discriminator
        1 + // is_initialized
        1 + // authority_bump
        MigrationConfig::LEN +
        RoleRegistry::LEN * 2 + // output managers, recoverers
        ActiveManagerSelector::LEN +
        MigrationLedger::LEN +
        128; // padding for growth

    /// Fresh state; the deployer holds both roles and is the active manager
    pub fn new(
        deployer: Pubkey,
        input_token: Pubkey,
        output_token: Pubkey,
        authority_bump: u8,
    ) -> Result<Self, ProgramError> {
        Ok(Self {
            discriminator: Self::DISCRIMINATOR,
            is_initialized: true,
            authority_bump,
            config: MigrationConfig::new(input_token, output_token)?,
            output_managers: RoleRegistry::new(RoleKind::OutputManager, deployer),
            recoverers: RoleRegistry::new(RoleKind::Recoverer, deployer),
            active_manager: ActiveManagerSelector::new(deployer),
            ledger: MigrationLedger::new(),
        })
    }

    /// Decode state, tolerating the zeroed tail of the account
    pub fn unpack_from_slice(data: &[u8]) -> Result<Self, ProgramError> {
        let state = Self::deserialize(&mut &data[..])
            .map_err(|_| ProgramError::InvalidAccountData)?;
        state.validate()?;
        Ok(state)
    }

    pub fn load(account_info: &AccountInfo, program_id: &Pubkey) -> Result<Self, ProgramError> {
        if account_info.owner != program_id {
            msg!("State account is not owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }
        let data = account_info.try_borrow_data()?;
        Self::unpack_from_slice(&data)
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
        if self.output_managers.is_empty() || self.recoverers.is_empty() {
            return Err(ProgramError::InvalidAccountData);
        }
        Ok(())
    }

    // Roles

    pub fn add_output_manager(
        &mut self,
        caller: &Pubkey,
        account: Pubkey,
    ) -> Result<MigrateEvent, ProgramError> {
        self.output_managers.add(caller, account)
    }

    pub fn renounce_output_manager(&mut self, caller: &Pubkey) -> Result<MigrateEvent, ProgramError> {
        self.output_managers.renounce(caller)
    }

    pub fn is_output_manager(&self, account: &Pubkey) -> bool {
        self.output_managers.is_member(account)
    }

    pub fn add_recoverer(
        &mut self,
        caller: &Pubkey,
        account: Pubkey,
    ) -> Result<MigrateEvent, ProgramError> {
        self.recoverers.add(caller, account)
    }

    pub fn renounce_recoverer(&mut self, caller: &Pubkey) -> Result<MigrateEvent, ProgramError> {
        self.recoverers.renounce(caller)
    }

    pub fn is_recoverer(&self, account: &Pubkey) -> bool {
        self.recoverers.is_member(account)
    }

    pub fn output_managers(&self) -> &RoleRegistry {
        &self.output_managers
    }

    pub fn recoverers(&self) -> &RoleRegistry {
        &self.recoverers
    }

    // Active manager

    pub fn set_active(&mut self, caller: &Pubkey) -> Result<MigrateEvent, ProgramError> {
        self.active_manager.set_active(&self.output_managers, caller)
    }

    pub fn get_active_manager(&self) -> Pubkey {
        self.active_manager.get_active()
    }

    // Config and ledger views

    pub fn input_token(&self) -> Pubkey {
        self.config.input_token()
    }

    pub fn output_token(&self) -> Pubkey {
        self.config.output_token()
    }

    pub fn tokens_migrated(&self) -> u128 {
        self.ledger.tokens_migrated()
    }

    pub fn tokens_distributed(&self) -> u128 {
        self.ledger.tokens_distributed()
    }

    pub fn ledger(&self) -> &MigrationLedger {
        &self.ledger
    }

    pub(crate) fn ledger_mut(&mut self) -> &mut MigrationLedger {
        &mut self.ledger
    }
}
