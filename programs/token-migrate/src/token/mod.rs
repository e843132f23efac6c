//! Fungible token collaborators
//!
//! The migration core only observes (`balance_of`, `allowance`) and directs
//! (`transfer`, `transfer_from`) token state through [`FungibleToken`]. Every
//! call reads live state; nothing is cached between calls.

pub mod ledger_token;
pub mod spl;

pub use ledger_token::*;
pub use spl::*;

use solana_program::{program_error::ProgramError, pubkey::Pubkey};

/// The token calls the engines make, with the acting account made explicit
pub trait FungibleToken {
    /// Token identifier (the mint)
    fn mint(&self) -> Pubkey;

    fn balance_of(&self, owner: &Pubkey) -> Result<u128, ProgramError>;

    /// Amount `spender` may still move out of `owner`'s balance
    fn allowance(&self, owner: &Pubkey, spender: &Pubkey) -> Result<u128, ProgramError>;

    /// Move `amount` from `caller` to `to`
    fn transfer(&mut self, caller: &Pubkey, to: &Pubkey, amount: u128) -> Result<(), ProgramError>;

    /// Move `amount` from `from` to `to` on `spender`'s allowance, decrementing it
    fn transfer_from(
        &mut self,
        spender: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u128,
    ) -> Result<(), ProgramError>;
}
