//! Household ledger - double-entry bookkeeping from CSV statements
//!
//! This library provides the core functionality for the `ledger` binary:
//! staging journal CSVs and bank statements, checking that every transaction
//! set balances, confirming staged rows into the journal, closing months and
//! reporting.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration, paths and logging setup
//! - `error`: Custom error types
//! - `models`: Core data models (amounts, subject codes, months, entries)
//! - `storage`: SQLite storage layer
//! - `classifier`: Text classifier and override rules for bank statements
//! - `services`: Business logic layer
//! - `reports`: Terminal and CSV reports
//! - `export`: Journal export (CSV, JSON, YAML)
//! - `audit`: Audit logging system
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use ledger::config::{paths::LedgerPaths, settings::Settings};
//! use ledger::storage::Storage;
//!
//! let paths = LedgerPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::new(paths)?;
//! ```

pub mod audit;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;

pub use error::LedgerError;
