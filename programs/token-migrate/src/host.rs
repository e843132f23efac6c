//! In-memory host for the migration contract
//!
//! Runs the same state machine as the on-chain processor against
//! [`LedgerToken`] collaborators. Each state-changing call is a transaction:
//! contract and token state are snapshotted first and restored when the call
//! fails, so a failed operation leaves nothing behind.

use std::collections::BTreeMap;

use solana_program::{msg, program_error::ProgramError, pubkey::Pubkey};

use crate::{
    engine::{MigrationEngine, RecoveryEngine},
    error::MigrateError,
    events::MigrateEvent,
    state::{MigrationRecord, TokenMigrator},
    token::{FungibleToken, LedgerToken},
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Tokens {
    input: LedgerToken,
    output: LedgerToken,
    others: BTreeMap<Pubkey, LedgerToken>,
}

impl Tokens {
    fn get(&self, mint: &Pubkey) -> Option<&LedgerToken> {
        if *mint == self.input.mint() {
            Some(&self.input)
        } else if *mint == self.output.mint() {
            Some(&self.output)
        } else {
            self.others.get(mint)
        }
    }

    fn get_mut(&mut self, mint: &Pubkey) -> Option<&mut LedgerToken> {
        if *mint == self.input.mint() {
            Some(&mut self.input)
        } else if *mint == self.output.mint() {
            Some(&mut self.output)
        } else {
            self.others.get_mut(mint)
        }
    }
}

/// Migration contract plus the token ledgers it talks to
#[derive(Debug, Clone)]
pub struct TokenMigrationHost {
    address: Pubkey,
    contract: TokenMigrator,
    records: BTreeMap<Pubkey, MigrationRecord>,
    tokens: Tokens,
    events: Vec<MigrateEvent>,
}

impl TokenMigrationHost {
    /// Deploy at `address`; `deployer` receives both roles
    pub fn deploy(
        address: Pubkey,
        deployer: Pubkey,
        input: LedgerToken,
        output: LedgerToken,
    ) -> Result<Self, ProgramError> {
        let contract = TokenMigrator::new(deployer, input.mint(), output.mint(), 0)?;
        msg!("Migration deployed at {} by {}", address, deployer);

        Ok(Self {
            address,
            contract,
            records: BTreeMap::new(),
            tokens: Tokens {
                input,
                output,
                others: BTreeMap::new(),
            },
            events: Vec::new(),
        })
    }

    /// Account acting as spender and custodian
    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn contract(&self) -> &TokenMigrator {
        &self.contract
    }

    /// Register a token unrelated to the migration (e.g. one sent by mistake)
    pub fn register_token(&mut self, token: LedgerToken) -> Result<(), ProgramError> {
        let mint = token.mint();
        if self.tokens.get(&mint).is_some() {
            return Err(MigrateError::AccountAlreadyInitialized.into());
        }
        self.tokens.others.insert(mint, token);
        Ok(())
    }

    pub fn token(&self, mint: &Pubkey) -> Option<&LedgerToken> {
        self.tokens.get(mint)
    }

    /// Direct token access for account holders (approve, transfer)
    pub fn token_mut(&mut self, mint: &Pubkey) -> Option<&mut LedgerToken> {
        self.tokens.get_mut(mint)
    }

    pub fn input(&mut self) -> &mut LedgerToken {
        &mut self.tokens.input
    }

    pub fn output(&mut self) -> &mut LedgerToken {
        &mut self.tokens.output
    }

    /// Events emitted by successful operations, oldest first
    pub fn events(&self) -> &[MigrateEvent] {
        &self.events
    }

    fn transact<F>(&mut self, operation: F) -> Result<MigrateEvent, ProgramError>
    where
        F: FnOnce(&mut TokenMigrator, &mut Tokens, &Pubkey) -> Result<MigrateEvent, ProgramError>,
    {
        let contract = self.contract.clone();
        let tokens = self.tokens.clone();

        match operation(&mut self.contract, &mut self.tokens, &self.address) {
            Ok(event) => {
                event.emit();
                self.events.push(event.clone());
                Ok(event)
            }
            Err(err) => {
                msg!("Operation reverted: {}", err);
                self.contract = contract;
                self.tokens = tokens;
                Err(err)
            }
        }
    }

    // Roles

    pub fn add_output_manager(&mut self, caller: &Pubkey, account: Pubkey) -> Result<MigrateEvent, ProgramError> {
        self.transact(|contract, _, _| contract.add_output_manager(caller, account))
    }

    pub fn renounce_output_manager(&mut self, caller: &Pubkey) -> Result<MigrateEvent, ProgramError> {
        self.transact(|contract, _, _| contract.renounce_output_manager(caller))
    }

    pub fn is_output_manager(&self, account: &Pubkey) -> bool {
        self.contract.is_output_manager(account)
    }

    pub fn add_recoverer(&mut self, caller: &Pubkey, account: Pubkey) -> Result<MigrateEvent, ProgramError> {
        self.transact(|contract, _, _| contract.add_recoverer(caller, account))
    }

    pub fn renounce_recoverer(&mut self, caller: &Pubkey) -> Result<MigrateEvent, ProgramError> {
        self.transact(|contract, _, _| contract.renounce_recoverer(caller))
    }

    pub fn is_recoverer(&self, account: &Pubkey) -> bool {
        self.contract.is_recoverer(account)
    }

    // Active manager

    pub fn set_active(&mut self, caller: &Pubkey) -> Result<MigrateEvent, ProgramError> {
        self.transact(|contract, _, _| contract.set_active(caller))
    }

    pub fn get_active_manager(&self) -> Pubkey {
        self.contract.get_active_manager()
    }

    // Views

    pub fn input_token(&self) -> Pubkey {
        self.contract.input_token()
    }

    pub fn output_token(&self) -> Pubkey {
        self.contract.output_token()
    }

    pub fn tokens_migrated(&self) -> u128 {
        self.contract.tokens_migrated()
    }

    pub fn tokens_distributed(&self) -> u128 {
        self.contract.tokens_distributed()
    }

    /// Record of `account`, zeroed when it never migrated
    pub fn get_migration_record(&self, account: &Pubkey) -> MigrationRecord {
        self.records.get(account).copied().unwrap_or_default()
    }

    /// Number of distinct accounts that have migrated
    pub fn migrator_count(&self) -> usize {
        self.records.len()
    }

    // Token flows

    pub fn migrate(&mut self, caller: &Pubkey) -> Result<MigrateEvent, ProgramError> {
        let mut record = self.get_migration_record(caller);
        let event = self.transact(|contract, tokens, this| {
            MigrationEngine::migrate(
                contract,
                &mut record,
                caller,
                this,
                &mut tokens.input,
                &mut tokens.output,
            )
        })?;
        self.records.insert(*caller, record);
        Ok(event)
    }

    pub fn recover_erc20(
        &mut self,
        caller: &Pubkey,
        token: &Pubkey,
        amount: u128,
    ) -> Result<MigrateEvent, ProgramError> {
        self.transact(|contract, tokens, this| {
            let ledger = tokens
                .get_mut(token)
                .ok_or(MigrateError::TokenAccountNotFound)?;
            RecoveryEngine::recover(contract, caller, this, ledger, amount)
        })
    }
}
