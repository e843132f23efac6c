use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program, sysvar,
};

use spl_associated_token_account::get_associated_token_address;

use crate::constants::{AUTHORITY_SEED, RECORD_SEED};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum MigrateInstruction {
    /// Create the migration state; the deployer gets both roles and becomes
    /// the active manager
    /// Accounts:
    /// 0. `[signer, writable]` Deployer (payer)
    /// 1. `[signer, writable]` State account
    /// 2. `[]` System program
    /// 3. `[]` Rent sysvar
    Initialize {
        input_token: Pubkey,
        output_token: Pubkey,
    },

    /// Accounts:
    /// 0. `[signer]` Existing output manager
    /// 1. `[writable]` State account
    AddOutputManager { account: Pubkey },

    /// Accounts:
    /// 0. `[signer]` Output manager giving up the role
    /// 1. `[writable]` State account
    RenounceOutputManager,

    /// Accounts:
    /// 0. `[signer]` Existing recoverer
    /// 1. `[writable]` State account
    AddRecoverer { account: Pubkey },

    /// Accounts:
    /// 0. `[signer]` Recoverer giving up the role
    /// 1. `[writable]` State account
    RenounceRecoverer,

    /// Make the signer the active funding manager
    /// Accounts:
    /// 0. `[signer]` Output manager
    /// 1. `[writable]` State account
    SetActive,

    /// Migrate the signer's whole input-token delegation. The migrator's
    /// record PDA is created on first use, paid for by the migrator.
    /// Accounts:
    /// 0. `[signer, writable]` Migrator
    /// 1. `[writable]` State account
    /// 2. `[]` Migration authority PDA
    /// 3. `[writable]` Migration record PDA: ["record", state, migrator]
    /// 4. `[writable]` Migrator input token account (delegate: authority)
    /// 5. `[writable]` Input token vault: the authority's associated token account
    /// 6. `[writable]` Active manager output token account (delegate: authority)
    /// 7. `[writable]` Migrator output token account
    /// 8. `[]` Token program
    /// 9. `[]` System program
    Migrate,

    /// Withdraw non-earmarked tokens held by the authority
    /// Accounts:
    /// 0. `[signer]` Recoverer
    /// 1. `[]` State account
    /// 2. `[]` Migration authority PDA
    /// 3. `[writable]` Source token account (owner: authority; the input vault for the input token)
    /// 4. `[writable]` Recoverer token account
    /// 5. `[]` Token program
    RecoverTokens { amount: u64 },
}

impl MigrateInstruction {
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (&variant, rest) = input
            .split_first()
            .ok_or(ProgramError::InvalidInstructionData)?;

        Ok(match variant {
            0 => {
                let payload = InitializePayload::try_from_slice(rest)?;
                Self::Initialize {
                    input_token: payload.input_token,
                    output_token: payload.output_token,
                }
            }
            1 => Self::AddOutputManager {
                account: AccountPayload::try_from_slice(rest)?.account,
            },
            2 => Self::RenounceOutputManager,
            3 => Self::AddRecoverer {
                account: AccountPayload::try_from_slice(rest)?.account,
            },
            4 => Self::RenounceRecoverer,
            5 => Self::SetActive,
            6 => Self::Migrate,
            7 => Self::RecoverTokens {
                amount: AmountPayload::try_from_slice(rest)?.amount,
            },
            _ => return Err(ProgramError::InvalidInstructionData),
        })
    }

    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        Ok(self.try_to_vec()?)
    }
}

// Payload structs for instructions with data
#[derive(BorshSerialize, BorshDeserialize)]
struct InitializePayload {
    input_token: Pubkey,
    output_token: Pubkey,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct AccountPayload {
    account: Pubkey,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct AmountPayload {
    amount: u64,
}

/// PDA acting as spender, custodian and signer for the migration
pub fn find_authority_address(program_id: &Pubkey, state: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[AUTHORITY_SEED, state.as_ref()], program_id)
}

/// Per-migrator record PDA
pub fn find_record_address(program_id: &Pubkey, state: &Pubkey, migrator: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RECORD_SEED, state.as_ref(), migrator.as_ref()], program_id)
}

/// Custody account for migrated input tokens
pub fn find_vault_address(program_id: &Pubkey, state: &Pubkey, input_token: &Pubkey) -> Pubkey {
    let (authority, _) = find_authority_address(program_id, state);
    get_associated_token_address(&authority, input_token)
}

// Helper functions to create instructions
pub fn initialize(
    program_id: &Pubkey,
    deployer: &Pubkey,
    state: &Pubkey,
    input_token: &Pubkey,
    output_token: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let accounts = vec![
        AccountMeta::new(*deployer, true),
        AccountMeta::new(*state, true),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(sysvar::rent::id(), false),
    ];

    let data = MigrateInstruction::Initialize {
        input_token: *input_token,
        output_token: *output_token,
    }
    .pack()?;

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

fn role_instruction(
    program_id: &Pubkey,
    caller: &Pubkey,
    state: &Pubkey,
    instruction: MigrateInstruction,
) -> Result<Instruction, ProgramError> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*caller, true),
            AccountMeta::new(*state, false),
        ],
        data: instruction.pack()?,
    })
}

pub fn add_output_manager(
    program_id: &Pubkey,
    caller: &Pubkey,
    state: &Pubkey,
    account: &Pubkey,
) -> Result<Instruction, ProgramError> {
    role_instruction(
        program_id,
        caller,
        state,
        MigrateInstruction::AddOutputManager { account: *account },
    )
}

pub fn renounce_output_manager(
    program_id: &Pubkey,
    caller: &Pubkey,
    state: &Pubkey,
) -> Result<Instruction, ProgramError> {
    role_instruction(program_id, caller, state, MigrateInstruction::RenounceOutputManager)
}

pub fn add_recoverer(
    program_id: &Pubkey,
    caller: &Pubkey,
    state: &Pubkey,
    account: &Pubkey,
) -> Result<Instruction, ProgramError> {
    role_instruction(
        program_id,
        caller,
        state,
        MigrateInstruction::AddRecoverer { account: *account },
    )
}

pub fn renounce_recoverer(
    program_id: &Pubkey,
    caller: &Pubkey,
    state: &Pubkey,
) -> Result<Instruction, ProgramError> {
    role_instruction(program_id, caller, state, MigrateInstruction::RenounceRecoverer)
}

pub fn set_active(
    program_id: &Pubkey,
    caller: &Pubkey,
    state: &Pubkey,
) -> Result<Instruction, ProgramError> {
    role_instruction(program_id, caller, state, MigrateInstruction::SetActive)
}

pub fn migrate(
    program_id: &Pubkey,
    migrator: &Pubkey,
    state: &Pubkey,
    input_token: &Pubkey,
    migrator_input_account: &Pubkey,
    manager_output_account: &Pubkey,
    migrator_output_account: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let (authority, _) = find_authority_address(program_id, state);
    let (record, _) = find_record_address(program_id, state, migrator);
    let accounts = vec![
        AccountMeta::new(*migrator, true),
        AccountMeta::new(*state, false),
        AccountMeta::new_readonly(authority, false),
        AccountMeta::new(record, false),
        AccountMeta::new(*migrator_input_account, false),
        AccountMeta::new(find_vault_address(program_id, state, input_token), false),
        AccountMeta::new(*manager_output_account, false),
        AccountMeta::new(*migrator_output_account, false),
        AccountMeta::new_readonly(spl_token::id(), false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: MigrateInstruction::Migrate.pack()?,
    })
}

pub fn recover_tokens(
    program_id: &Pubkey,
    recoverer: &Pubkey,
    state: &Pubkey,
    source: &Pubkey,
    destination: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let (authority, _) = find_authority_address(program_id, state);
    let accounts = vec![
        AccountMeta::new_readonly(*recoverer, true),
        AccountMeta::new_readonly(*state, false),
        AccountMeta::new_readonly(authority, false),
        AccountMeta::new(*source, false),
        AccountMeta::new(*destination, false),
        AccountMeta::new_readonly(spl_token::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: MigrateInstruction::RecoverTokens { amount }.pack()?,
    })
}
