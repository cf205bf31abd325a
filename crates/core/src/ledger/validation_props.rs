//! Property tests for transaction validation.

use proptest::prelude::*;
use rust_decimal::Decimal;

use meridian_shared::types::AccountId;

use super::account::AccountType;
use super::entry::EntryType;
use super::error::LedgerError;
use super::types::EntryInput;
use super::validation::{AccountSummary, validate_entries};

fn resolver(code: &str) -> Option<AccountSummary> {
    Some(AccountSummary {
        id: AccountId::new(),
        code: code.to_string(),
        account_type: AccountType::Asset,
        is_active: true,
        currency: "USD".to_string(),
    })
}

fn entry(code: &str, entry_type: EntryType, amount: Decimal) -> EntryInput {
    EntryInput {
        account_code: code.to_string(),
        entry_type,
        amount,
        description: None,
    }
}

/// Strategy for positive amounts with two decimal places.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for a list of positive amounts.
fn amounts_strategy(max_len: usize) -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(amount_strategy(), 1..=max_len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Mirroring every debit with an equal credit always validates: the
    /// debit and credit totals are identical by construction.
    #[test]
    fn prop_mirrored_entries_validate(amounts in amounts_strategy(10)) {
        let mut entries = Vec::with_capacity(amounts.len() * 2);
        for (i, amount) in amounts.iter().enumerate() {
            entries.push(entry(&format!("D{i}"), EntryType::Debit, *amount));
            entries.push(entry(&format!("C{i}"), EntryType::Credit, *amount));
        }

        prop_assert!(validate_entries(&entries, resolver).is_ok());
    }

    /// Validation is order-independent: any rotation of a balanced entry
    /// set still validates.
    #[test]
    fn prop_validation_is_order_independent(
        amounts in amounts_strategy(6),
        rotation in 0usize..12,
    ) {
        let mut entries = Vec::with_capacity(amounts.len() * 2);
        for (i, amount) in amounts.iter().enumerate() {
            entries.push(entry(&format!("D{i}"), EntryType::Debit, *amount));
            entries.push(entry(&format!("C{i}"), EntryType::Credit, *amount));
        }
        entries.rotate_left(rotation % entries.len());

        prop_assert!(validate_entries(&entries, resolver).is_ok());
    }

    /// Perturbing exactly one amount of a balanced set breaks exact
    /// equality and is rejected with both computed totals.
    #[test]
    fn prop_perturbed_set_is_rejected(
        amounts in amounts_strategy(6),
        delta in 1i64..1_000i64,
    ) {
        let mut entries = Vec::with_capacity(amounts.len() * 2);
        for (i, amount) in amounts.iter().enumerate() {
            entries.push(entry(&format!("D{i}"), EntryType::Debit, *amount));
            entries.push(entry(&format!("C{i}"), EntryType::Credit, *amount));
        }
        // Skew the first debit by a sub-cent-to-cents amount.
        entries[0].amount += Decimal::new(delta, 2);

        let expected_debits: Decimal =
            amounts.iter().copied().sum::<Decimal>() + Decimal::new(delta, 2);
        let expected_credits: Decimal = amounts.iter().copied().sum();

        match validate_entries(&entries, resolver) {
            Err(LedgerError::UnbalancedEntries { debits, credits }) => {
                prop_assert_eq!(debits, expected_debits);
                prop_assert_eq!(credits, expected_credits);
            }
            other => prop_assert!(false, "expected UnbalancedEntries, got {:?}", other),
        }
    }

    /// A single entry never validates regardless of amount or kind.
    #[test]
    fn prop_single_entry_rejected(
        amount in amount_strategy(),
        is_debit in any::<bool>(),
    ) {
        let entry_type = if is_debit { EntryType::Debit } else { EntryType::Credit };
        let entries = vec![entry("SOLO", entry_type, amount)];

        prop_assert!(matches!(
            validate_entries(&entries, resolver),
            Err(LedgerError::InsufficientEntries)
        ));
    }

    /// Rejected entry sets never reach account resolution: the resolver is
    /// not consulted when a structural check fails.
    #[test]
    fn prop_rejection_happens_before_resolution(amount in amount_strategy()) {
        let entries = vec![entry("ONLY", EntryType::Debit, amount)];
        let panicking_resolver = |_: &str| -> Option<AccountSummary> {
            panic!("resolver must not be called for structurally invalid input")
        };

        prop_assert!(validate_entries(&entries, panicking_resolver).is_err());
    }
}
