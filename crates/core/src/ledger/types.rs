//! Input types for account creation and transaction posting.
//!
//! These are the request shapes handed to the core by upstream collaborators.
//! The caller identity is assumed pre-authenticated; the tenant is always an
//! explicit parameter, never ambient state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use meridian_shared::types::{TenantId, UserId};

use super::account::AccountType;
use super::entry::EntryType;

/// Input for creating a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Unique account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning user for user-specific accounts; `None` for system accounts.
    pub user_id: Option<UserId>,
    /// Currency code (ISO 4217).
    pub currency: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Extensibility metadata.
    pub metadata: Option<Value>,
}

/// Input for a single entry in a proposed transaction.
#[derive(Debug, Clone)]
pub struct EntryInput {
    /// Code of the account to post to.
    pub account_code: String,
    /// Whether this is a debit or credit entry.
    pub entry_type: EntryType,
    /// The amount (must be a positive magnitude).
    pub amount: Decimal,
    /// Optional memo for this line item.
    pub description: Option<String>,
}

/// Input for creating and posting a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionRequest {
    /// Tenant the transaction belongs to.
    pub tenant_id: TenantId,
    /// Business date of the transaction.
    pub transaction_date: DateTime<Utc>,
    /// Description of the transaction.
    pub description: String,
    /// Reference to the originating business event, for idempotent linkage.
    pub reference_id: Option<String>,
    /// Reference type (e.g. "ORDER", "PAYMENT").
    pub reference_type: Option<String>,
    /// Declared total amount.
    pub total_amount: Decimal,
    /// Currency code (ISO 4217).
    pub currency: String,
    /// The proposed entries (must have at least 2).
    pub entries: Vec<EntryInput>,
    /// Extensibility metadata.
    pub metadata: Option<Value>,
}
