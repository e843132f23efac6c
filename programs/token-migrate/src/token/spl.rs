//! SPL Token collaborator
//!
//! Maps the allowance model onto SPL delegation: `allowance(owner, spender)`
//! is the owner's `delegated_amount` when `spender` is its delegate. Only the
//! migration authority PDA can act, signing through `invoke_signed`.

use solana_program::{
    account_info::AccountInfo,
    msg,
    program::invoke_signed,
    program_error::ProgramError,
    program_option::COption,
    program_pack::Pack,
    pubkey::Pubkey,
};
use spl_token::{instruction as token_instruction, state::Account as TokenAccount};

use crate::{error::MigrateError, token::FungibleToken};

/// Convert a ledger amount to an SPL amount
pub fn to_token_amount(amount: u128) -> Result<u64, ProgramError> {
    u64::try_from(amount).map_err(|_| MigrateError::AmountOverflow.into())
}

/// One mint's view over the token accounts passed to an instruction
pub struct SplTokenLedger<'a, 'b> {
    mint: Pubkey,
    token_program: &'b AccountInfo<'a>,
    authority: &'b AccountInfo<'a>,
    authority_seeds: &'b [&'b [u8]],
    accounts: Vec<&'b AccountInfo<'a>>,
}

impl<'a, 'b> SplTokenLedger<'a, 'b> {
    pub fn new(
        mint: Pubkey,
        token_program: &'b AccountInfo<'a>,
        authority: &'b AccountInfo<'a>,
        authority_seeds: &'b [&'b [u8]],
        accounts: Vec<&'b AccountInfo<'a>>,
    ) -> Result<Self, ProgramError> {
        if *token_program.key != spl_token::id() {
            msg!("Unexpected token program: {}", token_program.key);
            return Err(ProgramError::IncorrectProgramId);
        }

        Ok(Self {
            mint,
            token_program,
            authority,
            authority_seeds,
            accounts,
        })
    }

    /// Token account of `owner` for this mint, unpacked fresh
    fn find_account(&self, owner: &Pubkey) -> Result<(&'b AccountInfo<'a>, TokenAccount), ProgramError> {
        for info in self.accounts.iter().copied() {
            if info.owner != self.token_program.key {
                continue;
            }
            let data = info.try_borrow_data()?;
            let account = match TokenAccount::unpack(&data) {
                Ok(account) => account,
                Err(_) => continue,
            };
            if account.owner == *owner && account.mint == self.mint {
                return Ok((info, account));
            }
        }

        msg!("No {} token account for {}", self.mint, owner);
        Err(MigrateError::TokenAccountNotFound.into())
    }

    fn require_authority(&self, actor: &Pubkey) -> Result<(), ProgramError> {
        if actor != self.authority.key {
            msg!("Only the migration authority can sign for {}", actor);
            return Err(ProgramError::MissingRequiredSignature);
        }
        Ok(())
    }

    fn signed_transfer(
        &self,
        source: &'b AccountInfo<'a>,
        destination: &'b AccountInfo<'a>,
        amount: u128,
    ) -> Result<(), ProgramError> {
        let instruction = token_instruction::transfer(
            self.token_program.key,
            source.key,
            destination.key,
            self.authority.key,
            &[],
            to_token_amount(amount)?,
        )?;

        invoke_signed(
            &instruction,
            &[
                source.clone(),
                destination.clone(),
                self.authority.clone(),
                self.token_program.clone(),
            ],
            &[self.authority_seeds],
        )
    }
}

impl<'a, 'b> FungibleToken for SplTokenLedger<'a, 'b> {
    fn mint(&self) -> Pubkey {
        self.mint
    }

    fn balance_of(&self, owner: &Pubkey) -> Result<u128, ProgramError> {
        let (_, account) = self.find_account(owner)?;
        Ok(account.amount as u128)
    }

    fn allowance(&self, owner: &Pubkey, spender: &Pubkey) -> Result<u128, ProgramError> {
        let (_, account) = self.find_account(owner)?;
        if account.delegate == COption::Some(*spender) {
            Ok(account.delegated_amount as u128)
        } else {
            Ok(0)
        }
    }

    fn transfer(&mut self, caller: &Pubkey, to: &Pubkey, amount: u128) -> Result<(), ProgramError> {
        self.require_authority(caller)?;
        let (source, _) = self.find_account(caller)?;
        let (destination, _) = self.find_account(to)?;
        self.signed_transfer(source, destination, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u128,
    ) -> Result<(), ProgramError> {
        self.require_authority(spender)?;
        let (source, _) = self.find_account(from)?;
        let (destination, _) = self.find_account(to)?;
        self.signed_transfer(source, destination, amount)
    }
}
