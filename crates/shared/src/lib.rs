//! Shared types, errors, and configuration for Bizledger.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for the ledger entities
//! - The supported currency allow-list
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, LedgerConfig, PeriodLockScope};
pub use error::{AppError, AppResult};
