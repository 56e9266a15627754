//! Configuration module for the household ledger
//!
//! This module provides configuration management including:
//! - Path resolution for the database, statements and models
//! - User settings persistence
//! - Logger initialisation

pub mod logging;
pub mod paths;
pub mod settings;

pub use paths::LedgerPaths;
pub use settings::{ClassifierSettings, Settings};
