//! Transaction entry domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use meridian_shared::types::{AccountId, EntryId, TransactionId};

/// Type of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Debit entry (increases assets/expenses, decreases liabilities/equity/revenue).
    Debit,
    /// Credit entry (decreases assets/expenses, increases liabilities/equity/revenue).
    Credit,
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debit => write!(f, "debit"),
            Self::Credit => write!(f, "credit"),
        }
    }
}

impl std::str::FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            _ => Err(format!("Unknown entry type: {s}")),
        }
    }
}

/// A single debit or credit line within a transaction.
///
/// Entries are exclusively owned by their transaction and immutable once the
/// transaction is posted. The amount is always a positive magnitude; the sign
/// of its balance effect is derived from the entry type and the account
/// classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionEntry {
    /// Unique identifier for this entry.
    pub id: EntryId,
    /// The transaction this entry belongs to.
    pub transaction_id: TransactionId,
    /// The account affected by this entry.
    pub account_id: AccountId,
    /// Whether this is a debit or credit.
    pub entry_type: EntryType,
    /// Amount in the transaction currency (positive magnitude).
    pub amount: Decimal,
    /// Optional description for this line item.
    pub description: Option<String>,
    /// Snapshot of the account balance immediately after this entry was
    /// applied. Written once during posting, never recomputed.
    pub balance_after: Option<Decimal>,
}

impl TransactionEntry {
    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.entry_type {
            EntryType::Debit => self.amount,
            EntryType::Credit => -self.amount,
        }
    }
}
