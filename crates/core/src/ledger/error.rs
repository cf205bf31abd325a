//! Ledger error types for validation, posting, and store errors.

use rust_decimal::Decimal;
use thiserror::Error;

use meridian_shared::types::TransactionId;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Transaction must have at least 2 entries.
    #[error("Transaction must have at least 2 entries")]
    InsufficientEntries,

    /// Entry amount cannot be zero.
    #[error("Entry amount cannot be zero")]
    ZeroAmount,

    /// Entry amount cannot be negative.
    #[error("Entry amount cannot be negative")]
    NegativeAmount,

    /// Transaction is not balanced (debits != credits).
    #[error("Transaction is not balanced. Debits: {debits}, Credits: {credits}")]
    UnbalancedEntries {
        /// Total debit amount.
        debits: Decimal,
        /// Total credit amount.
        credits: Decimal,
    },

    /// Referenced account code does not exist.
    #[error("Unknown account code: {0}")]
    UnknownAccount(String),

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account is inactive and cannot be posted to.
    #[error("Account {0} is inactive")]
    AccountInactive(String),

    /// Entry currency does not match the account currency.
    #[error("Currency mismatch on account {account}: account currency is {expected}, got {actual}")]
    CurrencyMismatch {
        /// The account code.
        account: String,
        /// The account's currency.
        expected: String,
        /// The currency of the attempted posting.
        actual: String,
    },

    /// Account code already exists.
    #[error("Account code already exists: {0}")]
    DuplicateAccountCode(String),

    // ========== Transaction State Errors ==========
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Only pending transactions can be posted.
    #[error("Transaction {0} is not pending; only pending transactions can be posted")]
    TransactionNotPending(TransactionId),

    // ========== Conflict Errors ==========
    /// Transaction number already exists in the store.
    #[error("Transaction number already exists: {0}")]
    DuplicateTransactionNumber(String),

    /// Per-account contention was not resolved within the retry budget.
    #[error("Posting conflict on account {account}, please retry")]
    PostingConflict {
        /// The contended account code.
        account: String,
    },
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientEntries => "INSUFFICIENT_ENTRIES",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::UnbalancedEntries { .. } => "UNBALANCED_ENTRIES",
            Self::UnknownAccount(_) => "UNKNOWN_ACCOUNT",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::DuplicateAccountCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::TransactionNotPending(_) => "TRANSACTION_NOT_PENDING",
            Self::DuplicateTransactionNumber(_) => "DUPLICATE_TRANSACTION_NUMBER",
            Self::PostingConflict { .. } => "POSTING_CONFLICT",
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// Only the posting engine retries, and only conflict errors: a duplicate
    /// transaction number is retried with a fresh number, a posting conflict
    /// with a re-attempted batch. Validation and not-found errors are caller
    /// errors and are never retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DuplicateTransactionNumber(_) | Self::PostingConflict { .. }
        )
    }
}
