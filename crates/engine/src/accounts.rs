//! Authoritative account store with atomic balance mutation.
//!
//! The account balance is the only mutable shared resource in the ledger
//! core. Every account lives behind its own async mutex; a balance is only
//! ever changed while that mutex is held, which makes per-account
//! serialization an explicit contract instead of a property hoped for from
//! the surrounding storage layer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use meridian_core::ledger::{
    Account, AccountSummary, EntryType, LedgerError, NewAccount, balance_delta,
};
use meridian_shared::config::LedgerConfig;
use meridian_shared::types::{AccountId, TenantId, UserId};

/// One entry of a posting batch, already resolved to its account.
#[derive(Debug, Clone)]
pub struct EntryApplication {
    /// The account to apply to.
    pub account_id: AccountId,
    /// The account's code (used in diagnostics).
    pub account_code: String,
    /// Whether this is a debit or credit.
    pub entry_type: EntryType,
    /// The amount (positive magnitude).
    pub amount: Decimal,
}

/// Mutable account state guarded by the per-account mutex.
#[derive(Debug)]
struct AccountState {
    account: Account,
    /// Monotonically increasing count of entries applied to this account.
    version: i64,
}

/// The authoritative store of accounts and their balances.
pub struct AccountLedger {
    accounts: DashMap<AccountId, Arc<Mutex<AccountState>>>,
    codes: DashMap<String, AccountId>,
    config: LedgerConfig,
}

impl Default for AccountLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountLedger {
    /// Creates an empty account ledger with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    /// Creates an empty account ledger with the given configuration.
    #[must_use]
    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            accounts: DashMap::new(),
            codes: DashMap::new(),
            config,
        }
    }

    /// Creates a new account with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAccountCode` if the code is already taken.
    pub fn create_account(&self, new: NewAccount) -> Result<Account, LedgerError> {
        match self.codes.entry(new.code.clone()) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateAccountCode(new.code)),
            Entry::Vacant(slot) => {
                let account = Account::create(new, Utc::now());
                info!(
                    code = %account.code,
                    account_type = %account.account_type,
                    tenant = %account.tenant_id,
                    "account created"
                );
                slot.insert(account.id);
                self.accounts.insert(
                    account.id,
                    Arc::new(Mutex::new(AccountState {
                        account: account.clone(),
                        version: 0,
                    })),
                );
                Ok(account)
            }
        }
    }

    fn state(&self, id: AccountId) -> Option<Arc<Mutex<AccountState>>> {
        self.accounts.get(&id).map(|entry| entry.value().clone())
    }

    /// Returns the account with the given ID.
    pub async fn get(&self, id: AccountId) -> Result<Account, LedgerError> {
        let state = self
            .state(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))?;
        let guard = state.lock().await;
        Ok(guard.account.clone())
    }

    /// Returns the account with the given code.
    pub async fn get_by_code(&self, code: &str) -> Result<Account, LedgerError> {
        let id = self
            .codes
            .get(code)
            .map(|entry| *entry.value())
            .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))?;
        self.get(id).await
    }

    /// Returns true if an account with the given code exists.
    #[must_use]
    pub fn exists_by_code(&self, code: &str) -> bool {
        self.codes.contains_key(code)
    }

    /// Returns all accounts of a tenant, sorted by code.
    pub async fn list_by_tenant(&self, tenant_id: &TenantId) -> Vec<Account> {
        let states: Vec<_> = self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut accounts = Vec::new();
        for state in states {
            let guard = state.lock().await;
            if guard.account.tenant_id == *tenant_id {
                accounts.push(guard.account.clone());
            }
        }
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        accounts
    }

    /// Returns all accounts owned by a user, sorted by code.
    pub async fn list_by_user(&self, user_id: UserId) -> Vec<Account> {
        let states: Vec<_> = self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut accounts = Vec::new();
        for state in states {
            let guard = state.lock().await;
            if guard.account.user_id == Some(user_id) {
                accounts.push(guard.account.clone());
            }
        }
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        accounts
    }

    /// Deactivates an account. Its balance and history remain immutable.
    pub async fn deactivate(&self, id: AccountId) -> Result<Account, LedgerError> {
        let state = self
            .state(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))?;
        let mut guard = state.lock().await;
        guard.account.is_active = false;
        guard.account.updated_at = Utc::now();
        info!(code = %guard.account.code, "account deactivated");
        Ok(guard.account.clone())
    }

    /// Returns the current balance of the account with the given code.
    pub async fn get_balance(&self, code: &str) -> Result<Decimal, LedgerError> {
        Ok(self.get_by_code(code).await?.balance)
    }

    /// Returns the number of entries applied to the account so far.
    pub async fn account_version(&self, code: &str) -> Result<i64, LedgerError> {
        let id = self
            .codes
            .get(code)
            .map(|entry| *entry.value())
            .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))?;
        let state = self
            .state(id)
            .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))?;
        let guard = state.lock().await;
        Ok(guard.version)
    }

    /// Returns the read-only snapshot the transaction validator works with,
    /// or `None` if the code does not resolve.
    pub async fn summarize(&self, code: &str) -> Option<AccountSummary> {
        let id = self.codes.get(code).map(|entry| *entry.value())?;
        let state = self.state(id)?;
        let guard = state.lock().await;
        Some(AccountSummary {
            id: guard.account.id,
            code: guard.account.code.clone(),
            account_type: guard.account.account_type,
            is_active: guard.account.is_active,
            currency: guard.account.currency.clone(),
        })
    }

    /// Applies a single entry to an account and returns the new balance.
    ///
    /// The mutation happens under the account's exclusive lock: the signed
    /// delta is computed with the normal-balance rule and added to the
    /// balance in one serialized step.
    ///
    /// # Errors
    ///
    /// `ZeroAmount`/`NegativeAmount` for a non-positive amount,
    /// `AccountNotFound`, `AccountInactive`, or `CurrencyMismatch`. None of
    /// these are retried here; they abort the enclosing posting.
    pub async fn apply_entry(
        &self,
        account_id: AccountId,
        entry_type: EntryType,
        amount: Decimal,
        currency: &str,
    ) -> Result<Decimal, LedgerError> {
        if amount == Decimal::ZERO {
            return Err(LedgerError::ZeroAmount);
        }
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }

        let state = self
            .state(account_id)
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;
        let mut guard = state.lock().await;
        check_postable(&guard.account, currency)?;

        Ok(apply_to_state(&mut guard, entry_type, amount))
    }

    /// Applies all entries of one transaction all-or-nothing.
    ///
    /// Per-account exclusivity is acquired for every touched account in
    /// sorted-by-code order (fixed-order acquisition, so concurrent batches
    /// cannot deadlock), with a bounded number of attempts and backoff.
    /// All accounts are checked postable before the first mutation, so a
    /// failed batch leaves every balance untouched. Entries are then applied
    /// in the supplied order and the balance after each one is returned.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` / `AccountInactive` / `CurrencyMismatch` /
    /// `ZeroAmount` / `NegativeAmount` abort the batch before any mutation.
    /// `PostingConflict` is returned when the lock attempts are exhausted;
    /// it is the only recoverable error here.
    pub async fn apply_batch(
        &self,
        currency: &str,
        entries: &[EntryApplication],
    ) -> Result<Vec<Decimal>, LedgerError> {
        for entry in entries {
            if entry.amount == Decimal::ZERO {
                return Err(LedgerError::ZeroAmount);
            }
            if entry.amount < Decimal::ZERO {
                return Err(LedgerError::NegativeAmount);
            }
        }

        // Unique touched accounts, sorted by code for fixed-order locking.
        let mut touched: Vec<(String, AccountId)> = entries
            .iter()
            .map(|entry| (entry.account_code.clone(), entry.account_id))
            .collect();
        touched.sort_by(|a, b| a.0.cmp(&b.0));
        touched.dedup_by_key(|pair| pair.1);

        let mut guards = self.lock_in_order(&touched).await?;

        for (_, id) in &touched {
            check_postable(&guards[id].account, currency)?;
        }

        // All checks passed; apply in the supplied order.
        let mut balances = Vec::with_capacity(entries.len());
        for entry in entries {
            let guard = guards
                .get_mut(&entry.account_id)
                .ok_or_else(|| LedgerError::AccountNotFound(entry.account_code.clone()))?;
            balances.push(apply_to_state(guard, entry.entry_type, entry.amount));
        }

        Ok(balances)
    }

    /// Acquires the mutexes of all touched accounts in the given order.
    async fn lock_in_order(
        &self,
        touched: &[(String, AccountId)],
    ) -> Result<HashMap<AccountId, OwnedMutexGuard<AccountState>>, LedgerError> {
        let mut attempt = 0u32;
        'retry: loop {
            let mut guards = HashMap::with_capacity(touched.len());
            for (code, id) in touched {
                let state = self
                    .state(*id)
                    .ok_or_else(|| LedgerError::AccountNotFound(code.clone()))?;
                match state.try_lock_owned() {
                    Ok(guard) => {
                        guards.insert(*id, guard);
                    }
                    Err(_) => {
                        drop(guards);
                        attempt += 1;
                        if attempt >= self.config.lock_attempts {
                            debug!(account = %code, attempts = attempt, "lock attempts exhausted");
                            return Err(LedgerError::PostingConflict {
                                account: code.clone(),
                            });
                        }
                        tokio::time::sleep(Duration::from_millis(self.config.lock_backoff_ms))
                            .await;
                        continue 'retry;
                    }
                }
            }
            return Ok(guards);
        }
    }
}

/// Checks that an account accepts a posting in the given currency.
fn check_postable(account: &Account, currency: &str) -> Result<(), LedgerError> {
    if !account.is_active {
        return Err(LedgerError::AccountInactive(account.code.clone()));
    }
    if account.currency != currency {
        return Err(LedgerError::CurrencyMismatch {
            account: account.code.clone(),
            expected: account.currency.clone(),
            actual: currency.to_string(),
        });
    }
    Ok(())
}

/// Applies one entry to locked account state and returns the new balance.
fn apply_to_state(state: &mut AccountState, entry_type: EntryType, amount: Decimal) -> Decimal {
    let delta = balance_delta(state.account.account_type, entry_type, amount);
    state.account.balance += delta;
    state.version += 1;
    state.account.updated_at = Utc::now();
    debug!(
        code = %state.account.code,
        %entry_type,
        %amount,
        balance = %state.account.balance,
        version = state.version,
        "entry applied"
    );
    state.account.balance
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::ledger::AccountType;
    use rust_decimal_macros::dec;

    fn new_account(code: &str, account_type: AccountType) -> NewAccount {
        NewAccount {
            code: code.to_string(),
            name: format!("{code} account"),
            account_type,
            tenant_id: TenantId::from("tenant-1"),
            user_id: None,
            currency: "USD".to_string(),
            description: None,
            metadata: None,
        }
    }

    fn application(account: &Account, entry_type: EntryType, amount: Decimal) -> EntryApplication {
        EntryApplication {
            account_id: account.id,
            account_code: account.code.clone(),
            entry_type,
            amount,
        }
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let ledger = AccountLedger::new();
        ledger
            .create_account(new_account("CASH", AccountType::Asset))
            .unwrap();
        let result = ledger.create_account(new_account("CASH", AccountType::Asset));
        assert!(matches!(
            result,
            Err(LedgerError::DuplicateAccountCode(code)) if code == "CASH"
        ));
    }

    #[tokio::test]
    async fn test_apply_entry_follows_normal_balance_rule() {
        let ledger = AccountLedger::new();
        let cash = ledger
            .create_account(new_account("CASH", AccountType::Asset))
            .unwrap();
        let fees = ledger
            .create_account(new_account("FEES", AccountType::Revenue))
            .unwrap();

        // Asset increases on debit
        let balance = ledger
            .apply_entry(cash.id, EntryType::Debit, dec!(500.00), "USD")
            .await
            .unwrap();
        assert_eq!(balance, dec!(500.00));

        // Revenue increases on credit
        let balance = ledger
            .apply_entry(fees.id, EntryType::Credit, dec!(500.00), "USD")
            .await
            .unwrap();
        assert_eq!(balance, dec!(500.00));

        // Asset decreases on credit
        let balance = ledger
            .apply_entry(cash.id, EntryType::Credit, dec!(120.00), "USD")
            .await
            .unwrap();
        assert_eq!(balance, dec!(380.00));
    }

    #[tokio::test]
    async fn test_apply_entry_rejects_bad_input() {
        let ledger = AccountLedger::new();
        let cash = ledger
            .create_account(new_account("CASH", AccountType::Asset))
            .unwrap();

        assert!(matches!(
            ledger
                .apply_entry(cash.id, EntryType::Debit, dec!(0), "USD")
                .await,
            Err(LedgerError::ZeroAmount)
        ));
        assert!(matches!(
            ledger
                .apply_entry(cash.id, EntryType::Debit, dec!(-5), "USD")
                .await,
            Err(LedgerError::NegativeAmount)
        ));
        assert!(matches!(
            ledger
                .apply_entry(cash.id, EntryType::Debit, dec!(10), "EUR")
                .await,
            Err(LedgerError::CurrencyMismatch { .. })
        ));
        assert!(matches!(
            ledger
                .apply_entry(AccountId::new(), EntryType::Debit, dec!(10), "USD")
                .await,
            Err(LedgerError::AccountNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_apply_entry_rejects_inactive_account() {
        let ledger = AccountLedger::new();
        let cash = ledger
            .create_account(new_account("CASH", AccountType::Asset))
            .unwrap();
        ledger.deactivate(cash.id).await.unwrap();

        assert!(matches!(
            ledger
                .apply_entry(cash.id, EntryType::Debit, dec!(10), "USD")
                .await,
            Err(LedgerError::AccountInactive(code)) if code == "CASH"
        ));
        // Balance untouched
        assert_eq!(ledger.get_balance("CASH").await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_version_counts_applied_entries() {
        let ledger = AccountLedger::new();
        let cash = ledger
            .create_account(new_account("CASH", AccountType::Asset))
            .unwrap();
        assert_eq!(ledger.account_version("CASH").await.unwrap(), 0);

        for _ in 0..3 {
            ledger
                .apply_entry(cash.id, EntryType::Debit, dec!(1), "USD")
                .await
                .unwrap();
        }
        assert_eq!(ledger.account_version("CASH").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_batch_applies_in_order_with_running_snapshots() {
        let ledger = AccountLedger::new();
        let cash = ledger
            .create_account(new_account("CASH", AccountType::Asset))
            .unwrap();
        let fees = ledger
            .create_account(new_account("FEES", AccountType::Revenue))
            .unwrap();

        // Two entries hit CASH within one batch; each snapshot reflects the
        // running balance at that point.
        let balances = ledger
            .apply_batch(
                "USD",
                &[
                    application(&cash, EntryType::Debit, dec!(100)),
                    application(&cash, EntryType::Debit, dec!(50)),
                    application(&fees, EntryType::Credit, dec!(150)),
                ],
            )
            .await
            .unwrap();

        assert_eq!(balances, vec![dec!(100), dec!(150), dec!(150)]);
        assert_eq!(ledger.get_balance("CASH").await.unwrap(), dec!(150));
        assert_eq!(ledger.get_balance("FEES").await.unwrap(), dec!(150));
    }

    #[tokio::test]
    async fn test_batch_failure_leaves_no_partial_state() {
        let ledger = AccountLedger::new();
        let cash = ledger
            .create_account(new_account("CASH", AccountType::Asset))
            .unwrap();
        let fees = ledger
            .create_account(new_account("FEES", AccountType::Revenue))
            .unwrap();
        ledger.deactivate(fees.id).await.unwrap();

        let result = ledger
            .apply_batch(
                "USD",
                &[
                    application(&cash, EntryType::Debit, dec!(100)),
                    application(&fees, EntryType::Credit, dec!(100)),
                ],
            )
            .await;

        assert!(matches!(result, Err(LedgerError::AccountInactive(code)) if code == "FEES"));
        assert_eq!(ledger.get_balance("CASH").await.unwrap(), Decimal::ZERO);
        assert_eq!(ledger.account_version("CASH").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_currency_mismatch_aborts_whole_batch() {
        let ledger = AccountLedger::new();
        let cash = ledger
            .create_account(new_account("CASH", AccountType::Asset))
            .unwrap();
        let eur = ledger
            .create_account(NewAccount {
                currency: "EUR".to_string(),
                ..new_account("EURBOX", AccountType::Asset)
            })
            .unwrap();

        let result = ledger
            .apply_batch(
                "USD",
                &[
                    application(&cash, EntryType::Debit, dec!(100)),
                    application(&eur, EntryType::Credit, dec!(100)),
                ],
            )
            .await;

        assert!(matches!(result, Err(LedgerError::CurrencyMismatch { .. })));
        assert_eq!(ledger.get_balance("CASH").await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_contended_lock_surfaces_posting_conflict() {
        let ledger = AccountLedger::with_config(LedgerConfig {
            lock_attempts: 3,
            lock_backoff_ms: 0,
        });
        let cash = ledger
            .create_account(new_account("CASH", AccountType::Asset))
            .unwrap();
        let fees = ledger
            .create_account(new_account("FEES", AccountType::Revenue))
            .unwrap();

        // Hold CASH's lock so the batch can never acquire it.
        let state = ledger.state(cash.id).unwrap();
        let _held = state.lock().await;

        let result = ledger
            .apply_batch(
                "USD",
                &[
                    application(&cash, EntryType::Debit, dec!(100)),
                    application(&fees, EntryType::Credit, dec!(100)),
                ],
            )
            .await;

        assert!(matches!(
            result,
            Err(LedgerError::PostingConflict { account }) if account == "CASH"
        ));
        assert_eq!(ledger.get_balance("FEES").await.unwrap(), Decimal::ZERO);
    }
}
