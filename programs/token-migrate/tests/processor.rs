use solana_program::{
    instruction::{Instruction, InstructionError},
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction,
};
use solana_program_test::{processor, BanksClient, ProgramTest};
use solana_sdk::{
    signature::{Keypair, Signer},
    transaction::{Transaction, TransactionError},
};
use spl_token::{
    error::TokenError,
    state::{Account as TokenAccount, Mint},
};

use token_migrate::{
    error::MigrateError,
    instruction::{self, find_authority_address, find_record_address, find_vault_address},
    state::{MigrationRecordAccount, TokenMigrator},
};

fn program_test() -> ProgramTest {
    ProgramTest::new(
        "token_migrate",
        token_migrate::id(),
        processor!(token_migrate::processor::process_instruction),
    )
}

async fn send(
    banks_client: &mut BanksClient,
    fee_payer: &Keypair,
    instructions: &[Instruction],
    extra_signers: &[&Keypair],
) -> Result<(), TransactionError> {
    let recent_blockhash = banks_client.get_latest_blockhash().await.unwrap();
    let mut signers = vec![fee_payer];
    signers.extend_from_slice(extra_signers);

    let mut transaction = Transaction::new_with_payer(instructions, Some(&fee_payer.pubkey()));
    transaction.sign(&signers, recent_blockhash);

    banks_client
        .process_transaction(transaction)
        .await
        .map_err(|err| err.unwrap())
}

fn custom(error: MigrateError) -> TransactionError {
    TransactionError::InstructionError(0, InstructionError::Custom(error as u32))
}

async fn load_state(banks_client: &mut BanksClient, state: &Pubkey) -> TokenMigrator {
    let account = banks_client.get_account(*state).await.unwrap().unwrap();
    TokenMigrator::unpack_from_slice(&account.data).unwrap()
}

async fn token_balance(banks_client: &mut BanksClient, account: &Pubkey) -> u64 {
    let account = banks_client.get_account(*account).await.unwrap().unwrap();
    TokenAccount::unpack(&account.data).unwrap().amount
}

async fn create_mint(banks_client: &mut BanksClient, payer: &Keypair) -> Pubkey {
    let mint = Keypair::new();
    let rent = banks_client.get_rent().await.unwrap();

    let instructions = [
        system_instruction::create_account(
            &payer.pubkey(),
            &mint.pubkey(),
            rent.minimum_balance(Mint::LEN),
            Mint::LEN as u64,
            &spl_token::id(),
        ),
        spl_token::instruction::initialize_mint(
            &spl_token::id(),
            &mint.pubkey(),
            &payer.pubkey(),
            None,
            0,
        )
        .unwrap(),
    ];
    send(banks_client, payer, &instructions, &[&mint]).await.unwrap();

    mint.pubkey()
}

async fn create_token_account(
    banks_client: &mut BanksClient,
    payer: &Keypair,
    mint: &Pubkey,
    owner: &Pubkey,
    amount: u64,
) -> Pubkey {
    let account = Keypair::new();
    let rent = banks_client.get_rent().await.unwrap();

    let mut instructions = vec![
        system_instruction::create_account(
            &payer.pubkey(),
            &account.pubkey(),
            rent.minimum_balance(TokenAccount::LEN),
            TokenAccount::LEN as u64,
            &spl_token::id(),
        ),
        spl_token::instruction::initialize_account(&spl_token::id(), &account.pubkey(), mint, owner)
            .unwrap(),
    ];
    if amount > 0 {
        instructions.push(mint_to(payer, mint, &account.pubkey(), amount));
    }
    send(banks_client, payer, &instructions, &[&account]).await.unwrap();

    account.pubkey()
}

fn mint_to(payer: &Keypair, mint: &Pubkey, account: &Pubkey, amount: u64) -> Instruction {
    spl_token::instruction::mint_to(&spl_token::id(), mint, account, &payer.pubkey(), &[], amount)
        .unwrap()
}

fn approve(source: &Pubkey, delegate: &Pubkey, owner: &Pubkey, amount: u64) -> Instruction {
    spl_token::instruction::approve(&spl_token::id(), source, delegate, owner, &[], amount).unwrap()
}

async fn initialize(
    banks_client: &mut BanksClient,
    deployer: &Keypair,
    input_mint: &Pubkey,
    output_mint: &Pubkey,
) -> Pubkey {
    let state = Keypair::new();
    let ix = instruction::initialize(
        &token_migrate::id(),
        &deployer.pubkey(),
        &state.pubkey(),
        input_mint,
        output_mint,
    )
    .unwrap();
    send(banks_client, deployer, &[ix], &[&state]).await.unwrap();

    state.pubkey()
}

/// Deployed migration with real mints, the input vault and a funded manager
struct Migration {
    banks_client: BanksClient,
    payer: Keypair,
    state: Pubkey,
    authority: Pubkey,
    input_mint: Pubkey,
    output_mint: Pubkey,
    vault: Pubkey,
    manager_output: Pubkey,
}

impl Migration {
    async fn start() -> Self {
        let (mut banks_client, payer, _) = program_test().start().await;

        let input_mint = create_mint(&mut banks_client, &payer).await;
        let output_mint = create_mint(&mut banks_client, &payer).await;
        let state = initialize(&mut banks_client, &payer, &input_mint, &output_mint).await;
        let (authority, _) = find_authority_address(&token_migrate::id(), &state);

        let create_vault = spl_associated_token_account::instruction::create_associated_token_account(
            &payer.pubkey(),
            &authority,
            &input_mint,
            &spl_token::id(),
        );
        send(&mut banks_client, &payer, &[create_vault], &[]).await.unwrap();
        let vault = find_vault_address(&token_migrate::id(), &state, &input_mint);

        let manager_output =
            create_token_account(&mut banks_client, &payer, &output_mint, &payer.pubkey(), 1_000).await;

        Self {
            banks_client,
            payer,
            state,
            authority,
            input_mint,
            output_mint,
            vault,
            manager_output,
        }
    }

    /// Funded user with `input` input tokens and an empty output account
    async fn user(&mut self, input: u64) -> (Keypair, Pubkey, Pubkey) {
        let user = Keypair::new();
        let fund = system_instruction::transfer(&self.payer.pubkey(), &user.pubkey(), 1_000_000_000);
        send(&mut self.banks_client, &self.payer, &[fund], &[]).await.unwrap();

        let input_account =
            create_token_account(&mut self.banks_client, &self.payer, &self.input_mint, &user.pubkey(), input)
                .await;
        let output_account =
            create_token_account(&mut self.banks_client, &self.payer, &self.output_mint, &user.pubkey(), 0)
                .await;

        (user, input_account, output_account)
    }

    fn migrate_ix(&self, migrator: &Pubkey, input_account: &Pubkey, output_account: &Pubkey) -> Instruction {
        instruction::migrate(
            &token_migrate::id(),
            migrator,
            &self.state,
            &self.input_mint,
            input_account,
            &self.manager_output,
            output_account,
        )
        .unwrap()
    }

    async fn approve_distribution(&mut self, amount: u64) {
        let ix = approve(&self.manager_output, &self.authority, &self.payer.pubkey(), amount);
        send(&mut self.banks_client, &self.payer, &[ix], &[]).await.unwrap();
    }

    async fn balance(&mut self, account: &Pubkey) -> u64 {
        token_balance(&mut self.banks_client, account).await
    }

    async fn record(&mut self, migrator: &Pubkey) -> Option<MigrationRecordAccount> {
        let (record, _) = find_record_address(&token_migrate::id(), &self.state, migrator);
        self.banks_client
            .get_account(record)
            .await
            .unwrap()
            .map(|account| MigrationRecordAccount::unpack_from_slice(&account.data).unwrap())
    }
}

#[tokio::test]
async fn test_initialize_and_roles() {
    let (mut banks_client, payer, _) = program_test().start().await;
    let program_id = token_migrate::id();
    let input_mint = Pubkey::new_unique();
    let output_mint = Pubkey::new_unique();

    let state = initialize(&mut banks_client, &payer, &input_mint, &output_mint).await;

    let migrator = load_state(&mut banks_client, &state).await;
    assert!(migrator.is_output_manager(&payer.pubkey()));
    assert!(migrator.is_recoverer(&payer.pubkey()));
    assert_eq!(migrator.get_active_manager(), payer.pubkey());
    assert_eq!(migrator.input_token(), input_mint);
    assert_eq!(migrator.output_token(), output_mint);
    assert_eq!(migrator.tokens_migrated(), 0);
    let (_, bump) = find_authority_address(&program_id, &state);
    assert_eq!(migrator.authority_bump, bump);

    // The only manager cannot leave
    let renounce = instruction::renounce_output_manager(&program_id, &payer.pubkey(), &state).unwrap();
    let err = send(&mut banks_client, &payer, &[renounce], &[]).await.unwrap_err();
    assert_eq!(err, custom(MigrateError::RoleMinimumMembers));

    let manager = Keypair::new();
    let add = instruction::add_output_manager(&program_id, &payer.pubkey(), &state, &manager.pubkey())
        .unwrap();
    send(&mut banks_client, &payer, &[add], &[]).await.unwrap();

    // Outsiders cannot grant roles
    let outsider = Keypair::new();
    let add_recoverer =
        instruction::add_recoverer(&program_id, &outsider.pubkey(), &state, &outsider.pubkey()).unwrap();
    let err = send(&mut banks_client, &payer, &[add_recoverer], &[&outsider]).await.unwrap_err();
    assert_eq!(err, custom(MigrateError::NotRecoverer));

    // Manager takes over funding, then the deployer steps down
    let set_active = instruction::set_active(&program_id, &manager.pubkey(), &state).unwrap();
    let renounce = instruction::renounce_output_manager(&program_id, &payer.pubkey(), &state).unwrap();
    send(&mut banks_client, &payer, &[set_active, renounce], &[&manager]).await.unwrap();

    let migrator = load_state(&mut banks_client, &state).await;
    assert!(!migrator.is_output_manager(&payer.pubkey()));
    assert!(migrator.is_output_manager(&manager.pubkey()));
    assert_eq!(migrator.get_active_manager(), manager.pubkey());
}

#[tokio::test]
async fn test_initialize_rejects_identical_tokens() {
    let (mut banks_client, payer, _) = program_test().start().await;
    let mint = Pubkey::new_unique();
    let state = Keypair::new();

    let ix = instruction::initialize(&token_migrate::id(), &payer.pubkey(), &state.pubkey(), &mint, &mint)
        .unwrap();
    let err = send(&mut banks_client, &payer, &[ix], &[&state]).await.unwrap_err();

    assert_eq!(err, custom(MigrateError::IdenticalTokens));
}

#[tokio::test]
async fn test_migrate_and_recover_with_spl_tokens() {
    let mut m = Migration::start().await;
    let program_id = token_migrate::id();
    let (user, user_input, user_output) = m.user(120).await;
    let payer_input =
        create_token_account(&mut m.banks_client, &m.payer, &m.input_mint, &m.payer.pubkey(), 0).await;

    // Nothing delegated yet
    let migrate = m.migrate_ix(&user.pubkey(), &user_input, &user_output);
    let err = send(&mut m.banks_client, &m.payer, &[migrate.clone()], &[&user]).await.unwrap_err();
    assert_eq!(err, custom(MigrateError::NoInputAllowance));
    assert!(m.record(&user.pubkey()).await.is_none());

    let approve_input = approve(&user_input, &m.authority, &user.pubkey(), 100);
    let approve_output = approve(&m.manager_output, &m.authority, &m.payer.pubkey(), 120);
    send(&mut m.banks_client, &m.payer, &[approve_input, approve_output, migrate], &[&user])
        .await
        .unwrap();

    assert_eq!(m.balance(&user_input).await, 20);
    assert_eq!(m.balance(&m.vault.clone()).await, 100);
    assert_eq!(m.balance(&user_output).await, 100);
    assert_eq!(m.balance(&m.manager_output.clone()).await, 900);

    let record = m.record(&user.pubkey()).await.unwrap();
    assert_eq!(record.migrator, user.pubkey());
    assert_eq!(record.state, m.state);
    assert_eq!(record.record.migrated_amount, 100);

    // A returning migrator reuses its record
    let approve_rest = approve(&user_input, &m.authority, &user.pubkey(), 20);
    let migrate = m.migrate_ix(&user.pubkey(), &user_input, &user_output);
    send(&mut m.banks_client, &m.payer, &[approve_rest, migrate], &[&user]).await.unwrap();

    let record = m.record(&user.pubkey()).await.unwrap();
    assert_eq!(record.record.migrated_amount, 120);
    assert_eq!(record.record.distributed_amount, 120);
    let state = load_state(&mut m.banks_client, &m.state).await;
    assert_eq!(state.tokens_migrated(), 120);
    assert_eq!(state.tokens_distributed(), 120);

    // Stray tokens land in the vault next to the migrated ones
    let stray = mint_to(&m.payer, &m.input_mint, &m.vault, 30);
    send(&mut m.banks_client, &m.payer, &[stray], &[]).await.unwrap();

    let too_much =
        instruction::recover_tokens(&program_id, &m.payer.pubkey(), &m.state, &m.vault, &payer_input, 31)
            .unwrap();
    let err = send(&mut m.banks_client, &m.payer, &[too_much], &[]).await.unwrap_err();
    assert_eq!(err, custom(MigrateError::RecoveryAmountExceedsAvailable));

    let recover =
        instruction::recover_tokens(&program_id, &m.payer.pubkey(), &m.state, &m.vault, &payer_input, 30)
            .unwrap();
    send(&mut m.banks_client, &m.payer, &[recover], &[]).await.unwrap();

    assert_eq!(m.balance(&m.vault.clone()).await, 120);
    assert_eq!(m.balance(&payer_input).await, 30);
}

#[tokio::test]
async fn test_input_custody_is_the_vault() {
    let mut m = Migration::start().await;
    let program_id = token_migrate::id();
    let (user, user_input, user_output) = m.user(100).await;
    let side_account =
        create_token_account(&mut m.banks_client, &m.payer, &m.input_mint, &m.authority, 0).await;
    let payer_input =
        create_token_account(&mut m.banks_client, &m.payer, &m.input_mint, &m.payer.pubkey(), 0).await;
    m.approve_distribution(100).await;
    let approve_input = approve(&user_input, &m.authority, &user.pubkey(), 100);
    send(&mut m.banks_client, &m.payer, &[approve_input], &[&user]).await.unwrap();

    // Another authority-owned input account cannot stand in for the vault
    let mut migrate = m.migrate_ix(&user.pubkey(), &user_input, &user_output);
    migrate.accounts[5].pubkey = side_account;
    let err = send(&mut m.banks_client, &m.payer, &[migrate], &[&user]).await.unwrap_err();
    assert_eq!(err, custom(MigrateError::InvalidVault));

    let migrate = m.migrate_ix(&user.pubkey(), &user_input, &user_output);
    send(&mut m.banks_client, &m.payer, &[migrate], &[&user]).await.unwrap();
    assert_eq!(m.balance(&m.vault.clone()).await, 100);

    // Input recovery reads the vault, where the earmarked tokens are
    let stray = mint_to(&m.payer, &m.input_mint, &side_account, 90);
    send(&mut m.banks_client, &m.payer, &[stray], &[]).await.unwrap();
    let from_side =
        instruction::recover_tokens(&program_id, &m.payer.pubkey(), &m.state, &side_account, &payer_input, 90)
            .unwrap();
    let err = send(&mut m.banks_client, &m.payer, &[from_side], &[]).await.unwrap_err();
    assert_eq!(err, custom(MigrateError::InvalidVault));

    let stray = mint_to(&m.payer, &m.input_mint, &m.vault, 90);
    send(&mut m.banks_client, &m.payer, &[stray], &[]).await.unwrap();
    let from_vault =
        instruction::recover_tokens(&program_id, &m.payer.pubkey(), &m.state, &m.vault, &payer_input, 90)
            .unwrap();
    send(&mut m.banks_client, &m.payer, &[from_vault], &[]).await.unwrap();

    assert_eq!(m.balance(&payer_input).await, 90);
    assert_eq!(m.balance(&m.vault.clone()).await, 100);
}

#[tokio::test]
async fn test_migrate_rejects_active_manager() {
    let mut m = Migration::start().await;
    let manager_input =
        create_token_account(&mut m.banks_client, &m.payer, &m.input_mint, &m.payer.pubkey(), 50).await;
    let manager_output = m.manager_output;
    m.approve_distribution(50).await;
    let approve_input = approve(&manager_input, &m.authority, &m.payer.pubkey(), 50);
    send(&mut m.banks_client, &m.payer, &[approve_input], &[]).await.unwrap();

    let migrate = m.migrate_ix(&m.payer.pubkey(), &manager_input, &manager_output);
    let err = send(&mut m.banks_client, &m.payer, &[migrate], &[]).await.unwrap_err();

    assert_eq!(err, custom(MigrateError::SelfDealingForbidden));
    assert_eq!(m.balance(&manager_input).await, 50);
    assert_eq!(m.balance(&manager_output).await, 1_000);
}

#[tokio::test]
async fn test_migrate_requires_covering_output_allowance() {
    let mut m = Migration::start().await;
    let (user, user_input, user_output) = m.user(100).await;
    m.approve_distribution(50).await;
    let approve_input = approve(&user_input, &m.authority, &user.pubkey(), 100);
    send(&mut m.banks_client, &m.payer, &[approve_input], &[&user]).await.unwrap();

    let migrate = m.migrate_ix(&user.pubkey(), &user_input, &user_output);
    let err = send(&mut m.banks_client, &m.payer, &[migrate], &[&user]).await.unwrap_err();

    assert_eq!(err, custom(MigrateError::OutputAllowanceInsufficient));
    assert_eq!(m.balance(&user_input).await, 100);
    assert_eq!(m.balance(&user_output).await, 0);
}

#[tokio::test]
async fn test_over_approval_aborts_whole_migration() {
    let mut m = Migration::start().await;
    let (user, user_input, user_output) = m.user(100).await;
    m.approve_distribution(150).await;
    let approve_input = approve(&user_input, &m.authority, &user.pubkey(), 150);
    send(&mut m.banks_client, &m.payer, &[approve_input], &[&user]).await.unwrap();

    let migrate = m.migrate_ix(&user.pubkey(), &user_input, &user_output);
    let err = send(&mut m.banks_client, &m.payer, &[migrate], &[&user]).await.unwrap_err();

    assert_eq!(
        err,
        TransactionError::InstructionError(0, InstructionError::Custom(TokenError::InsufficientFunds as u32))
    );
    assert_eq!(m.balance(&user_input).await, 100);
    assert_eq!(m.balance(&m.vault.clone()).await, 0);
    assert_eq!(m.balance(&user_output).await, 0);
    assert_eq!(m.balance(&m.manager_output.clone()).await, 1_000);
    assert!(m.record(&user.pubkey()).await.is_none());
    let state = load_state(&mut m.banks_client, &m.state).await;
    assert_eq!(state.tokens_migrated(), 0);
}
