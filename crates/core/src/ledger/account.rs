//! Ledger accounts and the normal-balance rule.
//!
//! Accounts follow double-entry bookkeeping principles:
//! - Assets and Expenses have a DEBIT normal balance
//! - Liabilities, Equity and Revenue have a CREDIT normal balance

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use meridian_shared::types::{AccountId, TenantId, UserId};

use super::entry::EntryType;
use super::types::NewAccount;

/// Account classification based on standard accounting principles.
///
/// The set of classifications is closed; the debit/credit sign rule is a
/// total function over this enum, not a dispatch point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Resources owned, e.g. cash, bank accounts, user wallets.
    Asset,
    /// Obligations owed, e.g. loans payable, accounts payable.
    Liability,
    /// Owner's interest, e.g. capital, retained earnings.
    Equity,
    /// Income earned, e.g. fees, interest income, commissions.
    Revenue,
    /// Costs incurred, e.g. operating expenses, fees paid.
    Expense,
}

/// The direction in which an account classification naturally increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Balance increases on debit entries.
    Debit,
    /// Balance increases on credit entries.
    Credit,
}

impl AccountType {
    /// Returns the classification's natural increase direction.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Returns true if the classification increases on debit entries.
    #[must_use]
    pub const fn is_debit_normal(self) -> bool {
        matches!(self.normal_balance(), NormalBalance::Debit)
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asset => write!(f, "asset"),
            Self::Liability => write!(f, "liability"),
            Self::Equity => write!(f, "equity"),
            Self::Revenue => write!(f, "revenue"),
            Self::Expense => write!(f, "expense"),
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "revenue" => Ok(Self::Revenue),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown account type: {s}")),
        }
    }
}

/// Computes the signed balance effect of one entry on one account.
///
/// Debit-normal accounts gain `amount` on debit and lose it on credit;
/// credit-normal accounts do the inverse. `amount` is a positive magnitude.
#[must_use]
pub fn balance_delta(account_type: AccountType, entry_type: EntryType, amount: Decimal) -> Decimal {
    match (account_type.normal_balance(), entry_type) {
        (NormalBalance::Debit, EntryType::Debit) | (NormalBalance::Credit, EntryType::Credit) => {
            amount
        }
        (NormalBalance::Debit, EntryType::Credit) | (NormalBalance::Credit, EntryType::Debit) => {
            -amount
        }
    }
}

/// A ledger account.
///
/// The balance is the authoritative running sum of all posted entries applied
/// to the account since creation; it is maintained incrementally, never
/// recomputed from history. Accounts are deactivated rather than deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Unique human-readable account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Tenant that owns the account.
    pub tenant_id: TenantId,
    /// Owning user for user-specific accounts (e.g. wallets); `None` for
    /// system accounts.
    pub user_id: Option<UserId>,
    /// Currency code (ISO 4217).
    pub currency: String,
    /// Current balance.
    pub balance: Decimal,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Whether the account accepts postings.
    pub is_active: bool,
    /// Extensibility metadata.
    pub metadata: Option<Value>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new active account with a zero balance.
    #[must_use]
    pub fn create(new: NewAccount, now: DateTime<Utc>) -> Self {
        Self {
            id: AccountId::new(),
            code: new.code,
            name: new.name,
            account_type: new.account_type,
            tenant_id: new.tenant_id,
            user_id: new.user_id,
            currency: new.currency,
            balance: Decimal::ZERO,
            description: new.description,
            is_active: true,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        }
    }
}
