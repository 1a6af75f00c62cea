//! Core business logic for Bizledger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Everything that decides *what* a ledger write must change lives here; the
//! `bizledger-db` crate only executes those decisions inside a transaction.
//!
//! # Modules
//!
//! - `ledger` - Balance protocol, debt engine, payment cascades, period closing

pub mod ledger;
