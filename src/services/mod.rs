//! Service layer for the household ledger
//!
//! Services hold the ledger workflows on top of the storage layer: staging
//! statements, validating sets, confirming them into the journal and closing
//! months.

pub mod bank_import;
pub mod closing;
pub mod confirm;
pub mod ingest;
pub mod validation;

pub use bank_import::{BankImportService, BankProfile};
pub use closing::{default_close_month, CloseOutcome, ClosingService};
pub use confirm::{ConfirmOutcome, ConfirmPreview, ConfirmReport, ConfirmService};
pub use ingest::{parse_date, IngestService, StageOptions, StageReport};
pub use validation::{validate_sets, UnbalancedSet, ValidationResult, ValidationService};
