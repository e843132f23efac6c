use num_derive::FromPrimitive;
use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, FromPrimitive, PartialEq, Eq)]
pub enum MigrateError {
    #[error("Invalid instruction")]
    InvalidInstruction = 0,

    #[error("Account not initialized")]
    AccountNotInitialized = 1,

    #[error("Account already initialized")]
    AccountAlreadyInitialized = 2,

    #[error("Invalid migration authority")]
    InvalidAuthority = 3,

    #[error("Input and output token must differ")]
    IdenticalTokens = 4,

    // Authorization
    #[error("OutputManagerRole: caller does not have the OutputManager role")]
    NotOutputManager = 5,

    #[error("RecovererRole: caller does not have the Recoverer role")]
    NotRecoverer = 6,

    // Role invariants
    #[error("Roles: account already has role")]
    AlreadyMember = 7,

    #[error("Roles: account does not have role")]
    NotMember = 8,

    #[error("Roles: there must be at least one account assigned to this role")]
    RoleMinimumMembers = 9,

    #[error("Roles: role member capacity reached")]
    RoleCapacityExceeded = 10,

    // Migration preconditions
    #[error("StandardMigration: no input allowance")]
    NoInputAllowance = 11,

    #[error("StandardMigration: no output allowance")]
    NoOutputAllowance = 12,

    #[error("StandardMigration: output allowance is less than the input allowance")]
    OutputAllowanceInsufficient = 13,

    #[error("TokenMigrate: migrator cannot be the distribution token approval holder")]
    SelfDealingForbidden = 14,

    // Recovery
    #[error("TokenRecover: tokenAmount is greater than the available recovery amount")]
    RecoveryAmountExceedsAvailable = 16,

    // Token collaborators
    #[error("Token: transfer amount exceeds balance")]
    InsufficientBalance = 17,

    #[error("Token: transfer amount exceeds allowance")]
    InsufficientAllowance = 18,

    #[error("Token: no token account for owner")]
    TokenAccountNotFound = 19,

    #[error("Token: mint does not match")]
    MintMismatch = 20,

    #[error("Amount does not fit the token amount type")]
    AmountOverflow = 21,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 22,

    // Account layout
    #[error("Migration record account does not match state and migrator")]
    InvalidRecordAccount = 23,

    #[error("Input vault is not the authority's associated token account")]
    InvalidVault = 24,
}

impl PrintProgramError for MigrateError {
    fn print<E>(&self)
    where
        E: 'static + std::error::Error + DecodeError<E> + PrintProgramError + num_traits::FromPrimitive,
    {
        msg!("MigrateError: {}", self);
    }
}

impl From<MigrateError> for ProgramError {
    fn from(e: MigrateError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for MigrateError {
    fn type_of() -> &'static str {
        "MigrateError"
    }
}
