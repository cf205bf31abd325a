//! Property tests for the normal-balance rule.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::account::{AccountType, balance_delta};
use super::entry::EntryType;

/// Strategy for positive amounts with two decimal places.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for account classifications.
fn account_type_strategy() -> impl Strategy<Value = AccountType> {
    prop_oneof![
        Just(AccountType::Asset),
        Just(AccountType::Liability),
        Just(AccountType::Equity),
        Just(AccountType::Revenue),
        Just(AccountType::Expense),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Debit and credit effects are exact opposites for every
    /// classification.
    #[test]
    fn prop_debit_and_credit_are_opposites(
        account_type in account_type_strategy(),
        amount in amount_strategy(),
    ) {
        let debit = balance_delta(account_type, EntryType::Debit, amount);
        let credit = balance_delta(account_type, EntryType::Credit, amount);
        prop_assert_eq!(debit, -credit);
    }

    /// The magnitude of the effect always equals the entry amount.
    #[test]
    fn prop_delta_magnitude_equals_amount(
        account_type in account_type_strategy(),
        amount in amount_strategy(),
    ) {
        let delta = balance_delta(account_type, EntryType::Debit, amount);
        prop_assert_eq!(delta.abs(), amount);
    }

    /// An entry in the classification's normal direction always increases
    /// the balance.
    #[test]
    fn prop_normal_direction_increases(
        account_type in account_type_strategy(),
        amount in amount_strategy(),
    ) {
        let increasing = if account_type.is_debit_normal() {
            EntryType::Debit
        } else {
            EntryType::Credit
        };
        prop_assert!(balance_delta(account_type, increasing, amount) > Decimal::ZERO);
    }

    /// Replay invariant: folding a sequence of signed effects yields the
    /// same result as summing them, regardless of grouping.
    #[test]
    fn prop_fold_equals_sum(
        account_type in account_type_strategy(),
        amounts in prop::collection::vec((amount_strategy(), any::<bool>()), 1..20),
    ) {
        let deltas: Vec<Decimal> = amounts
            .iter()
            .map(|(amount, is_debit)| {
                let entry_type = if *is_debit { EntryType::Debit } else { EntryType::Credit };
                balance_delta(account_type, entry_type, *amount)
            })
            .collect();

        let folded = deltas.iter().fold(Decimal::ZERO, |acc, d| acc + *d);
        let summed: Decimal = deltas.iter().copied().sum();
        prop_assert_eq!(folded, summed);
    }
}
