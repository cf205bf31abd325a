//! Posting engine: the create → validate → post lifecycle.
//!
//! The engine is the only component that decides retry-vs-abort. Validation
//! and the account ledger are deterministic for a given input; conflict
//! errors (duplicate transaction number, per-account contention) are retried
//! here a bounded number of times, everything else aborts the posting with
//! zero visible side effects.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use meridian_core::ledger::{
    AccountSummary, CreateTransactionRequest, LedgerError, ResolvedEntry, Transaction,
    TransactionEntry, TransactionStatus, transaction_number, validate_entries,
};
use meridian_shared::config::PostingConfig;
use meridian_shared::types::{EntryId, TenantId, TransactionId};

use crate::accounts::{AccountLedger, EntryApplication};
use crate::transactions::TransactionStore;

type NumberGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Orchestrates validation, persistence, and balance application.
pub struct PostingEngine {
    accounts: Arc<AccountLedger>,
    transactions: Arc<TransactionStore>,
    config: PostingConfig,
    number_generator: NumberGenerator,
}

impl PostingEngine {
    /// Creates a posting engine with default configuration.
    #[must_use]
    pub fn new(accounts: Arc<AccountLedger>, transactions: Arc<TransactionStore>) -> Self {
        Self::with_config(accounts, transactions, PostingConfig::default())
    }

    /// Creates a posting engine with the given configuration.
    #[must_use]
    pub fn with_config(
        accounts: Arc<AccountLedger>,
        transactions: Arc<TransactionStore>,
        config: PostingConfig,
    ) -> Self {
        Self {
            accounts,
            transactions,
            config,
            number_generator: Arc::new(|| transaction_number(Utc::now())),
        }
    }

    /// Overrides the transaction number generator.
    ///
    /// The store still enforces uniqueness; this hook exists so collision
    /// handling can be exercised deterministically.
    #[must_use]
    pub fn with_number_generator(
        mut self,
        generator: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        self.number_generator = Arc::new(generator);
        self
    }

    /// Validates, persists, and posts a transaction.
    ///
    /// On success the returned record is POSTED, every entry carries its
    /// balance-after snapshot, and every touched account balance reflects
    /// the posting. On failure nothing is visible: no persisted entries, no
    /// balance changes, no lingering PENDING record.
    ///
    /// # Errors
    ///
    /// Validation errors are surfaced verbatim before any write. Account
    /// ledger errors (`AccountNotFound`, `AccountInactive`,
    /// `CurrencyMismatch`) abort the unit of work. `PostingConflict` and
    /// `DuplicateTransactionNumber` are retried internally and only surfaced
    /// once the retry budget is exhausted.
    pub async fn create_and_post(
        &self,
        request: CreateTransactionRequest,
    ) -> Result<Transaction, LedgerError> {
        info!(tenant = %request.tenant_id, "creating transaction");

        // Idempotent linkage: a reference that already posted is returned
        // unchanged instead of being posted twice.
        if let (Some(reference_id), Some(reference_type)) =
            (&request.reference_id, &request.reference_type)
        {
            if let Some(existing) = self
                .transactions
                .find_by_reference(reference_id, reference_type)
            {
                info!(
                    number = %existing.transaction_number,
                    reference_id = %reference_id,
                    "reference already posted, returning existing transaction"
                );
                return Ok(existing);
            }
        }

        let summaries = self.resolve_summaries(&request).await;
        let resolved = validate_entries(&request.entries, |code| summaries.get(code).cloned())?;

        let transaction = self.insert_pending(&request, &resolved)?;
        let applications: Vec<EntryApplication> = resolved
            .iter()
            .map(|entry| EntryApplication {
                account_id: entry.account.id,
                account_code: entry.account.code.clone(),
                entry_type: entry.entry_type,
                amount: entry.amount,
            })
            .collect();

        let balances = match self.apply_with_retry(&request.currency, &applications).await {
            Ok(balances) => balances,
            Err(err) => {
                self.discard(transaction.id);
                return Err(err);
            }
        };

        let posted = self.transactions.mark_posted(transaction.id, &balances)?;
        info!(number = %posted.transaction_number, "transaction posted");
        Ok(posted)
    }

    /// Resolves the read-only account snapshots the validator needs.
    async fn resolve_summaries(
        &self,
        request: &CreateTransactionRequest,
    ) -> HashMap<String, AccountSummary> {
        let mut summaries = HashMap::new();
        for entry in &request.entries {
            if summaries.contains_key(&entry.account_code) {
                continue;
            }
            if let Some(summary) = self.accounts.summarize(&entry.account_code).await {
                summaries.insert(entry.account_code.clone(), summary);
            }
        }
        summaries
    }

    /// Persists the PENDING record, regenerating the transaction number on a
    /// store-level uniqueness collision.
    fn insert_pending(
        &self,
        request: &CreateTransactionRequest,
        resolved: &[ResolvedEntry],
    ) -> Result<Transaction, LedgerError> {
        let mut attempt = 0u32;
        loop {
            let transaction = build_pending(request, resolved, (self.number_generator)());
            match self.transactions.insert_pending(transaction.clone()) {
                Ok(()) => return Ok(transaction),
                Err(LedgerError::DuplicateTransactionNumber(number)) => {
                    attempt += 1;
                    if attempt >= self.config.number_retries {
                        return Err(LedgerError::DuplicateTransactionNumber(number));
                    }
                    warn!(%number, attempt, "transaction number collision, regenerating");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Applies the batch, retrying contention conflicts within the budget.
    async fn apply_with_retry(
        &self,
        currency: &str,
        applications: &[EntryApplication],
    ) -> Result<Vec<Decimal>, LedgerError> {
        let mut attempt = 0u32;
        loop {
            match self.accounts.apply_batch(currency, applications).await {
                Ok(balances) => return Ok(balances),
                Err(err @ LedgerError::PostingConflict { .. }) => {
                    attempt += 1;
                    if attempt >= self.config.conflict_retries {
                        return Err(err);
                    }
                    warn!(attempt, "posting conflict, backing off and retrying");
                    tokio::time::sleep(Duration::from_millis(self.config.conflict_backoff_ms))
                        .await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Discards an aborted PENDING record so no partial state stays visible.
    fn discard(&self, id: TransactionId) {
        if let Err(err) = self.transactions.discard_pending(id) {
            error!(transaction = %id, %err, "failed to discard aborted pending transaction");
        }
    }

    /// Returns the transaction with the given ID.
    pub fn get_transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.transactions.get(id)
    }

    /// Returns all transactions of a tenant, most recent first.
    #[must_use]
    pub fn list_by_tenant(&self, tenant_id: &TenantId) -> Vec<Transaction> {
        self.transactions.list_by_tenant(tenant_id)
    }

    /// Returns a tenant's transactions within the date range (inclusive).
    #[must_use]
    pub fn list_by_date_range(
        &self,
        tenant_id: &TenantId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<Transaction> {
        self.transactions.list_by_date_range(tenant_id, start, end)
    }

    /// Returns the current balance of the account with the given code.
    pub async fn get_account_balance(&self, code: &str) -> Result<Decimal, LedgerError> {
        self.accounts.get_balance(code).await
    }
}

/// Builds the PENDING record from a validated request.
fn build_pending(
    request: &CreateTransactionRequest,
    resolved: &[ResolvedEntry],
    number: String,
) -> Transaction {
    let id = TransactionId::new();
    let now = Utc::now();
    Transaction {
        id,
        transaction_number: number,
        tenant_id: request.tenant_id.clone(),
        transaction_date: request.transaction_date,
        status: TransactionStatus::Pending,
        description: request.description.clone(),
        reference_id: request.reference_id.clone(),
        reference_type: request.reference_type.clone(),
        currency: request.currency.clone(),
        total_amount: request.total_amount,
        metadata: request.metadata.clone(),
        entries: resolved
            .iter()
            .map(|entry| TransactionEntry {
                id: EntryId::new(),
                transaction_id: id,
                account_id: entry.account.id,
                entry_type: entry.entry_type,
                amount: entry.amount,
                description: entry.description.clone(),
                balance_after: None,
            })
            .collect(),
        created_at: now,
        updated_at: now,
    }
}
