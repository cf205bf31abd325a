//! Transaction aggregate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use meridian_shared::types::{TenantId, TransactionId};

use super::entry::{EntryType, TransactionEntry};

/// Transaction posting status.
///
/// A transaction is created PENDING and transitions exactly once to POSTED.
/// There are no other transitions; posted records are append-only history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Transaction is persisted but its entries have not been applied yet.
    Pending,
    /// Transaction has been applied to account balances (immutable).
    Posted,
}

impl TransactionStatus {
    /// Returns true if the transaction can still be posted.
    #[must_use]
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true if the transaction is immutable.
    #[must_use]
    pub fn is_immutable(self) -> bool {
        matches!(self, Self::Posted)
    }
}

/// A financial transaction consisting of balanced ledger entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Unique human-readable transaction number.
    pub transaction_number: String,
    /// Tenant this transaction belongs to.
    pub tenant_id: TenantId,
    /// Business date of the transaction (distinct from `created_at`).
    pub transaction_date: DateTime<Utc>,
    /// Current status.
    pub status: TransactionStatus,
    /// Transaction description.
    pub description: String,
    /// Reference to an originating business event (e.g. order ID, payment ID).
    pub reference_id: Option<String>,
    /// Reference type (e.g. "ORDER", "PAYMENT", "TRANSFER").
    pub reference_type: Option<String>,
    /// Currency code (ISO 4217).
    pub currency: String,
    /// Declared total amount of the transaction.
    pub total_amount: Decimal,
    /// Extensibility metadata.
    pub metadata: Option<Value>,
    /// Ordered ledger entries (debits and credits).
    #[serde(default)]
    pub entries: Vec<TransactionEntry>,
    /// When the transaction record was created.
    pub created_at: DateTime<Utc>,
    /// When the transaction record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Sum of all debit entry amounts.
    #[must_use]
    pub fn total_debits(&self) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.entry_type == EntryType::Debit)
            .map(|e| e.amount)
            .sum()
    }

    /// Sum of all credit entry amounts.
    #[must_use]
    pub fn total_credits(&self) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.entry_type == EntryType::Credit)
            .map(|e| e.amount)
            .sum()
    }

    /// Returns true if total debits equal total credits exactly.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debits() == self.total_credits()
    }
}
