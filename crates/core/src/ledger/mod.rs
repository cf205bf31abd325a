//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger domain:
//! - Account classifications and the normal-balance rule
//! - Ledger entries (debits and credits)
//! - Transaction aggregates and their posting lifecycle
//! - Business rule validation for proposed entry sets
//! - Transaction number generation
//! - Error types for ledger operations

pub mod account;
pub mod entry;
pub mod error;
pub mod number;
pub mod transaction;
pub mod types;
pub mod validation;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod validation_props;

pub use account::{Account, AccountType, NormalBalance, balance_delta};
pub use entry::{EntryType, TransactionEntry};
pub use error::LedgerError;
pub use number::transaction_number;
pub use transaction::{Transaction, TransactionStatus};
pub use types::{CreateTransactionRequest, EntryInput, NewAccount};
pub use validation::{AccountSummary, ResolvedEntry, validate_entries};
