//! Core data models for the household ledger
//!
//! Amounts, subject codes and the chart of accounts, accounting months,
//! statement sources, and the staged/confirmed journal entries.

pub mod bank;
pub mod entry;
pub mod money;
pub mod period;
pub mod subject;

pub use bank::{Bank, Direction};
pub use entry::{JournalEntry, StagedEntry};
pub use money::Money;
pub use period::YearMonth;
pub use subject::{AccountClass, ChartOfAccounts, SubjectCode};
