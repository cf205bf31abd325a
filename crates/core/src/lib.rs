//! Core domain logic for Meridian.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Double-entry bookkeeping: accounts, transactions, entries,
//!   validation, and the normal-balance rule

pub mod ledger;
