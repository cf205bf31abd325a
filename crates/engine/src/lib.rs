//! Account ledger store and posting engine for Meridian.
//!
//! This crate owns all mutable ledger state:
//! - [`AccountLedger`] - the authoritative account store and the only code
//!   path permitted to mutate a balance
//! - [`TransactionStore`] - append-only transaction persistence with
//!   store-enforced transaction number uniqueness
//! - [`PostingEngine`] - orchestrates the validate → persist → apply → post
//!   lifecycle and owns every retry decision

pub mod accounts;
pub mod posting;
pub mod transactions;

pub use accounts::{AccountLedger, EntryApplication};
pub use posting::PostingEngine;
pub use transactions::TransactionStore;
