//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod export;
pub mod ledger;
pub mod process;
pub mod report;

pub use export::handle_export;
pub use ledger::{handle_audit, handle_close, handle_train};
pub use process::{handle_clean, handle_confirm, handle_process, handle_process_bank};
pub use report::{
    handle_balance_sheet, handle_cashflow, handle_check, handle_status, handle_summary,
    handle_trial, CheckTarget,
};
