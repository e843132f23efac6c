use solana_program::{msg, program_error::ProgramError, pubkey::Pubkey};

use crate::{
    error::MigrateError,
    events::MigrateEvent,
    state::TokenMigrator,
    token::FungibleToken,
};

/// Withdrawal of tokens sent to the migration account by mistake
pub struct RecoveryEngine;

impl RecoveryEngine {
    /// Balance of `token` held by `this` that no migration has earmarked.
    ///
    /// Migrated input tokens share the custody balance with stray transfers;
    /// only the excess over `tokens_migrated` is recoverable.
    pub fn available<T>(state: &TokenMigrator, this: &Pubkey, token: &T) -> Result<u128, ProgramError>
    where
        T: FungibleToken + ?Sized,
    {
        let held = token.balance_of(this)?;
        if token.mint() == state.input_token() {
            Ok(held.saturating_sub(state.tokens_migrated()))
        } else {
            Ok(held)
        }
    }

    pub fn recover<T>(
        state: &TokenMigrator,
        caller: &Pubkey,
        this: &Pubkey,
        token: &mut T,
        amount: u128,
    ) -> Result<MigrateEvent, ProgramError>
    where
        T: FungibleToken + ?Sized,
    {
        state.recoverers().require_member(caller)?;

        let available = Self::available(state, this, token)?;
        if amount > available {
            msg!("Recovery of {} exceeds available {}", amount, available);
            return Err(MigrateError::RecoveryAmountExceedsAvailable.into());
        }

        token.transfer(this, caller, amount)?;
        msg!("Recovered {} of {} to {}", amount, token.mint(), caller);

        Ok(MigrateEvent::TokensRecovered {
            recoverer: *caller,
            token: token.mint(),
            amount,
        })
    }
}
