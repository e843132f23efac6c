use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{msg, program_error::ProgramError, pubkey::Pubkey};

use crate::{constants::MAX_ROLE_MEMBERS, error::MigrateError, events::MigrateEvent};

/// Roles known to the migration program
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    /// May add managers and select the active funding manager
    OutputManager,
    /// May withdraw non-earmarked balances
    Recoverer,
}

impl RoleKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OutputManager => "OutputManager",
            Self::Recoverer => "Recoverer",
        }
    }

    /// Error raised when a caller lacks this role
    pub fn unauthorized(&self) -> MigrateError {
        match self {
            Self::OutputManager => MigrateError::NotOutputManager,
            Self::Recoverer => MigrateError::NotRecoverer,
        }
    }

    fn added(&self, account: Pubkey) -> MigrateEvent {
        match self {
            Self::OutputManager => MigrateEvent::OutputManagerAdded { account },
            Self::Recoverer => MigrateEvent::RecovererAdded { account },
        }
    }

    fn removed(&self, account: Pubkey) -> MigrateEvent {
        match self {
            Self::OutputManager => MigrateEvent::OutputManagerRemoved { account },
            Self::Recoverer => MigrateEvent::RecovererRemoved { account },
        }
    }
}

/// Set of accounts holding a role. Never empty once constructed.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct RoleRegistry {
    kind: RoleKind,
    members: Vec<Pubkey>,
}

impl RoleRegistry {
    /// Serialized size at full capacity
    pub const LEN: usize = 1 + 4 + 32 * MAX_ROLE_MEMBERS;

    pub fn new(kind: RoleKind, initial_member: Pubkey) -> Self {
        Self {
            kind,
            members: vec![initial_member],
        }
    }

    pub fn kind(&self) -> RoleKind {
        self.kind
    }

    pub fn members(&self) -> &[Pubkey] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_member(&self, account: &Pubkey) -> bool {
        self.members.contains(account)
    }

    pub fn require_member(&self, caller: &Pubkey) -> Result<(), ProgramError> {
        if !self.is_member(caller) {
            msg!("{} is not a {}", caller, self.kind.name());
            return Err(self.kind.unauthorized().into());
        }
        Ok(())
    }

    /// Add `account`; `caller` must already hold the role
    pub fn add(&mut self, caller: &Pubkey, account: Pubkey) -> Result<MigrateEvent, ProgramError> {
        self.require_member(caller)?;

        if self.is_member(&account) {
            return Err(MigrateError::AlreadyMember.into());
        }
        if self.members.len() >= MAX_ROLE_MEMBERS {
            return Err(MigrateError::RoleCapacityExceeded.into());
        }

        self.members.push(account);
        msg!("{} added: {}", self.kind.name(), account);

        Ok(self.kind.added(account))
    }

    /// Remove `account`, refusing to leave the role empty
    pub(crate) fn remove(&mut self, account: &Pubkey) -> Result<MigrateEvent, ProgramError> {
        let index = self
            .members
            .iter()
            .position(|member| member == account)
            .ok_or(MigrateError::NotMember)?;

        if self.members.len() <= 1 {
            msg!("Refusing to remove the last {}", self.kind.name());
            return Err(MigrateError::RoleMinimumMembers.into());
        }

        self.members.swap_remove(index);
        msg!("{} removed: {}", self.kind.name(), account);

        Ok(self.kind.removed(*account))
    }

    /// Caller gives up its own membership
    pub fn renounce(&mut self, caller: &Pubkey) -> Result<MigrateEvent, ProgramError> {
        self.remove(caller)
    }
}
