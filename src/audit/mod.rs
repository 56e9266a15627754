//! Audit trail for the household ledger
//!
//! Every state-changing operation (staging a statement, confirming,
//! closing a month, clearing the staging table, training models) appends a
//! line to `audit.log`:
//!
//! - `AuditEntry`: timestamp, operation, subject, affected row count and
//!   optional details.
//! - `AuditLogger`: writes entries as JSON lines and reads them back.

mod entry;
mod logger;

pub use entry::{AuditEntry, Operation};
pub use logger::AuditLogger;
