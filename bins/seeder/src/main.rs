//! Ledger seeder for Meridian development and testing.
//!
//! Seeds a demonstration chart of accounts, posts a handful of sample
//! transactions through the posting engine, and logs the resulting balances.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use chrono::Utc;
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meridian_core::ledger::{
    AccountType, CreateTransactionRequest, EntryInput, EntryType, NewAccount,
};
use meridian_engine::{AccountLedger, PostingEngine, TransactionStore};
use meridian_shared::AppConfig;
use meridian_shared::types::TenantId;

const TENANT: &str = "demo-tenant";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meridian=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().map_err(|err| anyhow::anyhow!("config load failed: {err}"))?;

    let accounts = Arc::new(AccountLedger::with_config(config.ledger));
    let transactions = Arc::new(TransactionStore::new());
    let engine = PostingEngine::with_config(accounts.clone(), transactions, config.posting);

    info!("seeding chart of accounts");
    seed_accounts(&accounts)?;

    info!("posting sample transactions");
    seed_transactions(&engine).await?;

    let tenant = TenantId::from(TENANT);
    for account in accounts.list_by_tenant(&tenant).await {
        info!(
            code = %account.code,
            account_type = %account.account_type,
            balance = %account.balance,
            "final balance"
        );
    }
    info!(
        transactions = engine.list_by_tenant(&tenant).len(),
        "seeding complete"
    );

    Ok(())
}

fn seed_accounts(accounts: &AccountLedger) -> anyhow::Result<()> {
    let chart = [
        ("CASH", "Cash on hand", AccountType::Asset),
        ("BANK", "Operating bank account", AccountType::Asset),
        ("LOANS", "Loans payable", AccountType::Liability),
        ("CAPITAL", "Contributed capital", AccountType::Equity),
        ("FEES", "Fee income", AccountType::Revenue),
        ("RENT", "Office rent", AccountType::Expense),
    ];

    for (code, name, account_type) in chart {
        accounts.create_account(NewAccount {
            code: code.to_string(),
            name: name.to_string(),
            account_type,
            tenant_id: TenantId::from(TENANT),
            user_id: None,
            currency: "USD".to_string(),
            description: None,
            metadata: None,
        })?;
    }
    Ok(())
}

async fn seed_transactions(engine: &PostingEngine) -> anyhow::Result<()> {
    let samples = [
        ("Opening capital", "BANK", "CAPITAL", dec!(10000.00)),
        ("Cash drawer float", "CASH", "BANK", dec!(500.00)),
        ("Service fees collected", "BANK", "FEES", dec!(1250.00)),
        ("March rent", "RENT", "BANK", dec!(900.00)),
    ];

    for (description, debit, credit, amount) in samples {
        let posted = engine
            .create_and_post(CreateTransactionRequest {
                tenant_id: TenantId::from(TENANT),
                transaction_date: Utc::now(),
                description: description.to_string(),
                reference_id: None,
                reference_type: None,
                total_amount: amount,
                currency: "USD".to_string(),
                entries: vec![
                    EntryInput {
                        account_code: debit.to_string(),
                        entry_type: EntryType::Debit,
                        amount,
                        description: None,
                    },
                    EntryInput {
                        account_code: credit.to_string(),
                        entry_type: EntryType::Credit,
                        amount,
                        description: None,
                    },
                ],
                metadata: None,
            })
            .await?;
        info!(number = %posted.transaction_number, %description, "posted");
    }
    Ok(())
}
