use std::collections::BTreeMap;

use solana_program::{msg, program_error::ProgramError, pubkey::Pubkey};

use crate::{error::MigrateError, token::FungibleToken};

/// In-memory fungible token with per-(owner, spender) allowances
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerToken {
    mint: Pubkey,
    total_supply: u128,
    balances: BTreeMap<Pubkey, u128>,
    allowances: BTreeMap<(Pubkey, Pubkey), u128>,
}

impl LedgerToken {
    /// New token whose whole supply starts with `holder`
    pub fn new(mint: Pubkey, holder: Pubkey, supply: u128) -> Self {
        let mut balances = BTreeMap::new();
        balances.insert(holder, supply);
        Self {
            mint,
            total_supply: supply,
            balances,
            allowances: BTreeMap::new(),
        }
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Replace the allowance of (`owner`, `spender`)
    pub fn approve(&mut self, owner: &Pubkey, spender: &Pubkey, amount: u128) {
        self.allowances.insert((*owner, *spender), amount);
    }

    fn move_balance(&mut self, from: &Pubkey, to: &Pubkey, amount: u128) -> Result<(), ProgramError> {
        let from_balance = self.balance(from);
        if from_balance < amount {
            msg!("Transfer of {} exceeds balance {} of {}", amount, from_balance, from);
            return Err(MigrateError::InsufficientBalance.into());
        }

        let new_from = from_balance - amount;
        self.balances.insert(*from, new_from);
        let to_balance = self.balance(to);
        let new_to = to_balance
            .checked_add(amount)
            .ok_or(MigrateError::ArithmeticOverflow)?;
        self.balances.insert(*to, new_to);
        Ok(())
    }

    fn balance(&self, owner: &Pubkey) -> u128 {
        self.balances.get(owner).copied().unwrap_or(0)
    }
}

impl FungibleToken for LedgerToken {
    fn mint(&self) -> Pubkey {
        self.mint
    }

    fn balance_of(&self, owner: &Pubkey) -> Result<u128, ProgramError> {
        Ok(self.balance(owner))
    }

    fn allowance(&self, owner: &Pubkey, spender: &Pubkey) -> Result<u128, ProgramError> {
        Ok(self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0))
    }

    fn transfer(&mut self, caller: &Pubkey, to: &Pubkey, amount: u128) -> Result<(), ProgramError> {
        self.move_balance(caller, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u128,
    ) -> Result<(), ProgramError> {
        // Precheck balance so a failed move never burns allowance
        if self.balance(from) < amount {
            return Err(MigrateError::InsufficientBalance.into());
        }

        let current = self.allowance(from, spender)?;
        if current < amount {
            return Err(MigrateError::InsufficientAllowance.into());
        }

        self.move_balance(from, to, amount)?;
        self.allowances.insert((*from, *spender), current - amount);
        Ok(())
    }
}
