//! Business rule validation for proposed transactions.
//!
//! Validation is pure and side-effect-free: it runs before any persistence so
//! the store can never contain an unbalanced transaction, even transiently.
//! Account resolution is the validator's only interaction with the account
//! ledger, and it is read-only, injected as a closure.

use rust_decimal::Decimal;

use meridian_shared::types::AccountId;

use super::account::AccountType;
use super::entry::EntryType;
use super::error::LedgerError;
use super::types::EntryInput;

/// Read-only account snapshot used during validation.
#[derive(Debug, Clone)]
pub struct AccountSummary {
    /// The account ID.
    pub id: AccountId,
    /// The account code.
    pub code: String,
    /// The account classification.
    pub account_type: AccountType,
    /// Whether the account is active.
    pub is_active: bool,
    /// The account's currency code.
    pub currency: String,
}

/// A validated entry with its account resolved.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    /// The resolved account.
    pub account: AccountSummary,
    /// Whether this is a debit or credit.
    pub entry_type: EntryType,
    /// The entry amount (positive magnitude).
    pub amount: Decimal,
    /// Optional memo for this line item.
    pub description: Option<String>,
}

/// Validates a proposed entry set and resolves its account references.
///
/// Checks, in order:
/// 1. at least two entries are present
/// 2. every amount is strictly positive
/// 3. debit and credit totals are exactly equal (`Decimal` equality, zero
///    tolerance)
/// 4. every account code resolves to an existing account
///
/// # Errors
///
/// Returns the first violated rule as a typed [`LedgerError`]; an unbalanced
/// set reports both computed totals for diagnostics.
pub fn validate_entries<R>(
    entries: &[EntryInput],
    resolve: R,
) -> Result<Vec<ResolvedEntry>, LedgerError>
where
    R: Fn(&str) -> Option<AccountSummary>,
{
    if entries.len() < 2 {
        return Err(LedgerError::InsufficientEntries);
    }

    for entry in entries {
        if entry.amount == Decimal::ZERO {
            return Err(LedgerError::ZeroAmount);
        }
        if entry.amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }
    }

    let mut debits = Decimal::ZERO;
    let mut credits = Decimal::ZERO;
    for entry in entries {
        match entry.entry_type {
            EntryType::Debit => debits += entry.amount,
            EntryType::Credit => credits += entry.amount,
        }
    }

    if debits != credits {
        return Err(LedgerError::UnbalancedEntries { debits, credits });
    }

    let mut resolved = Vec::with_capacity(entries.len());
    for entry in entries {
        let account = resolve(&entry.account_code)
            .ok_or_else(|| LedgerError::UnknownAccount(entry.account_code.clone()))?;

        resolved.push(ResolvedEntry {
            account,
            entry_type: entry.entry_type,
            amount: entry.amount,
            description: entry.description.clone(),
        });
    }

    Ok(resolved)
}
