//! Append-only transaction persistence.
//!
//! Transactions are inserted PENDING, flipped to POSTED exactly once, and
//! never mutated afterward. The store is the enforcement point for
//! transaction-number uniqueness; callers regenerate on a duplicate rather
//! than assuming the random suffix is unique.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use tracing::debug;

use meridian_core::ledger::{LedgerError, Transaction, TransactionStatus};
use meridian_shared::types::{TenantId, TransactionId};

/// Append-only store of transactions and their entries.
#[derive(Default)]
pub struct TransactionStore {
    transactions: DashMap<TransactionId, Transaction>,
    numbers: DashMap<String, TransactionId>,
    references: DashMap<(String, String), TransactionId>,
}

impl TransactionStore {
    /// Creates an empty transaction store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Persists a PENDING transaction together with its entries.
    ///
    /// # Errors
    ///
    /// `DuplicateTransactionNumber` if the number is already taken (the
    /// caller must regenerate and retry), `TransactionNotPending` if the
    /// record is not in the PENDING state.
    pub fn insert_pending(&self, transaction: Transaction) -> Result<(), LedgerError> {
        if transaction.status != TransactionStatus::Pending {
            return Err(LedgerError::TransactionNotPending(transaction.id));
        }

        match self.numbers.entry(transaction.transaction_number.clone()) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateTransactionNumber(
                transaction.transaction_number,
            )),
            Entry::Vacant(slot) => {
                slot.insert(transaction.id);
                if let (Some(reference_id), Some(reference_type)) =
                    (&transaction.reference_id, &transaction.reference_type)
                {
                    self.references
                        .entry((reference_id.clone(), reference_type.clone()))
                        .or_insert(transaction.id);
                }
                debug!(
                    number = %transaction.transaction_number,
                    tenant = %transaction.tenant_id,
                    "pending transaction persisted"
                );
                self.transactions.insert(transaction.id, transaction);
                Ok(())
            }
        }
    }

    /// Writes the balance-after snapshots and flips PENDING → POSTED.
    ///
    /// `balances` holds the balance after each entry, in entry order. This
    /// is the only mutation the store permits after insertion; POSTED
    /// records have no update surface at all.
    ///
    /// # Errors
    ///
    /// `TransactionNotFound` or `TransactionNotPending`.
    pub fn mark_posted(
        &self,
        id: TransactionId,
        balances: &[Decimal],
    ) -> Result<Transaction, LedgerError> {
        let mut entry = self
            .transactions
            .get_mut(&id)
            .ok_or(LedgerError::TransactionNotFound(id))?;
        let transaction = entry.value_mut();

        if transaction.status != TransactionStatus::Pending {
            return Err(LedgerError::TransactionNotPending(id));
        }

        for (entry, balance) in transaction.entries.iter_mut().zip(balances) {
            entry.balance_after = Some(*balance);
        }
        transaction.status = TransactionStatus::Posted;
        transaction.updated_at = Utc::now();

        Ok(transaction.clone())
    }

    /// Removes a PENDING record whose posting aborted.
    ///
    /// This is the compensation path of the posting unit of work; it exists
    /// so a failed posting leaves no partial state visible. POSTED records
    /// can never be discarded.
    ///
    /// # Errors
    ///
    /// `TransactionNotFound` or `TransactionNotPending`.
    pub fn discard_pending(&self, id: TransactionId) -> Result<(), LedgerError> {
        let transaction = self
            .transactions
            .get(&id)
            .ok_or(LedgerError::TransactionNotFound(id))?
            .value()
            .clone();

        if transaction.status != TransactionStatus::Pending {
            return Err(LedgerError::TransactionNotPending(id));
        }

        self.transactions.remove(&id);
        self.numbers.remove(&transaction.transaction_number);
        if let (Some(reference_id), Some(reference_type)) =
            (transaction.reference_id, transaction.reference_type)
        {
            self.references
                .remove_if(&(reference_id, reference_type), |_, stored| *stored == id);
        }
        debug!(number = %transaction.transaction_number, "pending transaction discarded");
        Ok(())
    }

    /// Returns the transaction with the given ID.
    pub fn get(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.transactions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    /// Returns the transaction with the given number, if any.
    #[must_use]
    pub fn find_by_number(&self, number: &str) -> Option<Transaction> {
        let id = self.numbers.get(number).map(|entry| *entry.value())?;
        self.transactions.get(&id).map(|entry| entry.value().clone())
    }

    /// Returns the transaction linked to the given external reference, if any.
    #[must_use]
    pub fn find_by_reference(&self, reference_id: &str, reference_type: &str) -> Option<Transaction> {
        let key = (reference_id.to_string(), reference_type.to_string());
        let id = self.references.get(&key).map(|entry| *entry.value())?;
        self.transactions.get(&id).map(|entry| entry.value().clone())
    }

    /// Returns all transactions of a tenant, most recent first.
    #[must_use]
    pub fn list_by_tenant(&self, tenant_id: &TenantId) -> Vec<Transaction> {
        let mut transactions: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|entry| entry.value().tenant_id == *tenant_id)
            .map(|entry| entry.value().clone())
            .collect();
        sort_most_recent_first(&mut transactions);
        transactions
    }

    /// Returns a tenant's transactions within the date range (inclusive),
    /// most recent first.
    #[must_use]
    pub fn list_by_date_range(
        &self,
        tenant_id: &TenantId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<Transaction> {
        let mut transactions: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|entry| {
                let transaction = entry.value();
                transaction.tenant_id == *tenant_id
                    && transaction.transaction_date >= start
                    && transaction.transaction_date <= end
            })
            .map(|entry| entry.value().clone())
            .collect();
        sort_most_recent_first(&mut transactions);
        transactions
    }

    /// Returns a tenant's transactions with the given status, most recent
    /// first.
    #[must_use]
    pub fn list_by_status(
        &self,
        tenant_id: &TenantId,
        status: TransactionStatus,
    ) -> Vec<Transaction> {
        let mut transactions: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|entry| {
                entry.value().tenant_id == *tenant_id && entry.value().status == status
            })
            .map(|entry| entry.value().clone())
            .collect();
        sort_most_recent_first(&mut transactions);
        transactions
    }

    /// Counts a tenant's transactions with the given status.
    #[must_use]
    pub fn count_by_tenant_and_status(
        &self,
        tenant_id: &TenantId,
        status: TransactionStatus,
    ) -> usize {
        self.transactions
            .iter()
            .filter(|entry| {
                entry.value().tenant_id == *tenant_id && entry.value().status == status
            })
            .count()
    }
}

fn sort_most_recent_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| {
        b.transaction_date
            .cmp(&a.transaction_date)
            .then(b.created_at.cmp(&a.created_at))
    });
}
