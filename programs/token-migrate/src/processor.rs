use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};
use spl_associated_token_account::get_associated_token_address;

use crate::{
    constants::{AUTHORITY_SEED, RECORD_SEED},
    engine::{MigrationEngine, RecoveryEngine},
    error::MigrateError,
    events::MigrateEvent,
    instruction::{find_authority_address, find_record_address, MigrateInstruction},
    state::{MigrationRecordAccount, TokenMigrator},
    token::SplTokenLedger,
};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = MigrateInstruction::unpack(instruction_data)?;

    match instruction {
        MigrateInstruction::Initialize {
            input_token,
            output_token,
        } => {
            msg!("Instruction: Initialize");
            process_initialize(program_id, accounts, input_token, output_token)
        }

        MigrateInstruction::AddOutputManager { account } => {
            msg!("Instruction: AddOutputManager");
            process_state_update(program_id, accounts, |state, caller| {
                state.add_output_manager(caller, account)
            })
        }

        MigrateInstruction::RenounceOutputManager => {
            msg!("Instruction: RenounceOutputManager");
            process_state_update(program_id, accounts, |state, caller| {
                state.renounce_output_manager(caller)
            })
        }

        MigrateInstruction::AddRecoverer { account } => {
            msg!("Instruction: AddRecoverer");
            process_state_update(program_id, accounts, |state, caller| {
                state.add_recoverer(caller, account)
            })
        }

        MigrateInstruction::RenounceRecoverer => {
            msg!("Instruction: RenounceRecoverer");
            process_state_update(program_id, accounts, |state, caller| {
                state.renounce_recoverer(caller)
            })
        }

        MigrateInstruction::SetActive => {
            msg!("Instruction: SetActive");
            process_state_update(program_id, accounts, |state, caller| state.set_active(caller))
        }

        MigrateInstruction::Migrate => {
            msg!("Instruction: Migrate");
            process_migrate(program_id, accounts)
        }

        MigrateInstruction::RecoverTokens { amount } => {
            msg!("Instruction: RecoverTokens");
            process_recover_tokens(program_id, accounts, amount)
        }
    }
}

/// Create and initialize the migration state account
fn process_initialize(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    input_token: Pubkey,
    output_token: Pubkey,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let deployer_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;
    let rent_sysvar = next_account_info(account_info_iter)?;

    if !deployer_info.is_signer || !state_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    if !state_info.data_is_empty() {
        return Err(MigrateError::AccountAlreadyInitialized.into());
    }

    let (_, authority_bump) = find_authority_address(program_id, state_info.key);
    let state = TokenMigrator::new(*deployer_info.key, input_token, output_token, authority_bump)?;

    let rent = &Rent::from_account_info(rent_sysvar)?;
    let required_lamports = rent.minimum_balance(TokenMigrator::LEN);

    invoke(
        &system_instruction::create_account(
            deployer_info.key,
            state_info.key,
            required_lamports,
            TokenMigrator::LEN as u64,
            program_id,
        ),
        &[
            deployer_info.clone(),
            state_info.clone(),
            system_program.clone(),
        ],
    )?;

    state.save(state_info)?;

    msg!(
        "Migration initialized: {} -> {}, deployer {}",
        input_token,
        output_token,
        deployer_info.key
    );

    Ok(())
}

/// Signer + writable state; applies a role or selector change
fn process_state_update<F>(program_id: &Pubkey, accounts: &[AccountInfo], update: F) -> ProgramResult
where
    F: FnOnce(&mut TokenMigrator, &Pubkey) -> Result<MigrateEvent, ProgramError>,
{
    let account_info_iter = &mut accounts.iter();

    let caller_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;

    if !caller_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let mut state = TokenMigrator::load(state_info, program_id)?;
    let event = update(&mut state, caller_info.key)?;
    state.save(state_info)?;

    event.emit();
    Ok(())
}

/// Check the passed authority against the bump stored in state
fn verify_authority(
    program_id: &Pubkey,
    state_key: &Pubkey,
    state: &TokenMigrator,
    authority_info: &AccountInfo,
) -> ProgramResult {
    let expected = Pubkey::create_program_address(
        &[AUTHORITY_SEED, state_key.as_ref(), &[state.authority_bump]],
        program_id,
    )?;
    if expected != *authority_info.key {
        msg!("Expected authority {}, got {}", expected, authority_info.key);
        return Err(MigrateError::InvalidAuthority.into());
    }
    Ok(())
}

/// Migrated input tokens only ever sit in the authority's associated token account
fn verify_vault(authority: &Pubkey, state: &TokenMigrator, vault_info: &AccountInfo) -> ProgramResult {
    let expected = get_associated_token_address(authority, &state.input_token());
    if expected != *vault_info.key {
        msg!("Expected input vault {}, got {}", expected, vault_info.key);
        return Err(MigrateError::InvalidVault.into());
    }
    Ok(())
}

/// Create the record PDA, also when someone already sent lamports to its address
fn create_record_account<'a>(
    program_id: &Pubkey,
    payer_info: &AccountInfo<'a>,
    record_info: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    seeds: &[&[u8]],
) -> ProgramResult {
    let required_lamports = Rent::get()?.minimum_balance(MigrationRecordAccount::LEN);
    let current_lamports = record_info.lamports();

    if current_lamports == 0 {
        return invoke_signed(
            &system_instruction::create_account(
                payer_info.key,
                record_info.key,
                required_lamports,
                MigrationRecordAccount::LEN as u64,
                program_id,
            ),
            &[payer_info.clone(), record_info.clone(), system_program.clone()],
            &[seeds],
        );
    }

    let shortfall = required_lamports.saturating_sub(current_lamports);
    if shortfall > 0 {
        invoke(
            &system_instruction::transfer(payer_info.key, record_info.key, shortfall),
            &[payer_info.clone(), record_info.clone(), system_program.clone()],
        )?;
    }
    invoke_signed(
        &system_instruction::allocate(record_info.key, MigrationRecordAccount::LEN as u64),
        &[record_info.clone(), system_program.clone()],
        &[seeds],
    )?;
    invoke_signed(
        &system_instruction::assign(record_info.key, program_id),
        &[record_info.clone(), system_program.clone()],
        &[seeds],
    )
}

fn process_migrate(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let migrator_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let authority_info = next_account_info(account_info_iter)?;
    let record_info = next_account_info(account_info_iter)?;
    let migrator_input_info = next_account_info(account_info_iter)?;
    let input_vault_info = next_account_info(account_info_iter)?;
    let manager_output_info = next_account_info(account_info_iter)?;
    let migrator_output_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;
    let system_program = next_account_info(account_info_iter)?;

    if !migrator_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let mut state = TokenMigrator::load(state_info, program_id)?;
    verify_authority(program_id, state_info.key, &state, authority_info)?;
    verify_vault(authority_info.key, &state, input_vault_info)?;

    let (record_key, record_bump) =
        find_record_address(program_id, state_info.key, migrator_info.key);
    if record_key != *record_info.key {
        msg!("Expected record {}, got {}", record_key, record_info.key);
        return Err(MigrateError::InvalidRecordAccount.into());
    }
    let is_new_record = record_info.data_is_empty();
    let mut record_account = if is_new_record {
        MigrationRecordAccount::new(*state_info.key, *migrator_info.key, record_bump)
    } else {
        MigrationRecordAccount::load(record_info, program_id, state_info.key, migrator_info.key)?
    };

    let bump = [state.authority_bump];
    let seeds: &[&[u8]] = &[AUTHORITY_SEED, state_info.key.as_ref(), &bump];

    let mut input = SplTokenLedger::new(
        state.input_token(),
        token_program,
        authority_info,
        seeds,
        vec![migrator_input_info, input_vault_info],
    )?;
    let mut output = SplTokenLedger::new(
        state.output_token(),
        token_program,
        authority_info,
        seeds,
        vec![manager_output_info, migrator_output_info],
    )?;

    let event = MigrationEngine::migrate(
        &mut state,
        &mut record_account.record,
        migrator_info.key,
        authority_info.key,
        &mut input,
        &mut output,
    )?;

    if is_new_record {
        let record_bump = [record_bump];
        create_record_account(
            program_id,
            migrator_info,
            record_info,
            system_program,
            &[
                RECORD_SEED,
                state_info.key.as_ref(),
                migrator_info.key.as_ref(),
                &record_bump,
            ],
        )?;
    }
    record_account.save(record_info)?;
    state.save(state_info)?;

    event.emit();
    Ok(())
}

fn process_recover_tokens(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let recoverer_info = next_account_info(account_info_iter)?;
    let state_info = next_account_info(account_info_iter)?;
    let authority_info = next_account_info(account_info_iter)?;
    let source_info = next_account_info(account_info_iter)?;
    let destination_info = next_account_info(account_info_iter)?;
    let token_program = next_account_info(account_info_iter)?;

    if !recoverer_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let state = TokenMigrator::load(state_info, program_id)?;
    verify_authority(program_id, state_info.key, &state, authority_info)?;

    // The source account decides which token is being recovered
    if source_info.owner != token_program.key {
        return Err(ProgramError::IncorrectProgramId);
    }
    let mint = {
        let data = source_info.try_borrow_data()?;
        <spl_token::state::Account as solana_program::program_pack::Pack>::unpack(&data)?.mint
    };
    if mint == state.input_token() {
        verify_vault(authority_info.key, &state, source_info)?;
    }

    let bump = [state.authority_bump];
    let seeds: &[&[u8]] = &[AUTHORITY_SEED, state_info.key.as_ref(), &bump];

    let mut token = SplTokenLedger::new(
        mint,
        token_program,
        authority_info,
        seeds,
        vec![source_info, destination_info],
    )?;

    let event = RecoveryEngine::recover(
        &state,
        recoverer_info.key,
        authority_info.key,
        &mut token,
        amount as u128,
    )?;

    event.emit();
    Ok(())
}
