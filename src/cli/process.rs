//! CLI commands for staging and confirming
//!
//! `process`, `process-bank`, `confirm` and `clean`: the workflow that moves
//! statement files through the staging table into the journal.

use std::path::Path;

use crate::audit::{AuditEntry, Operation};
use crate::config::settings::Settings;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Bank, ChartOfAccounts};
use crate::reports::{format_validation, TransactionSummaryReport};
use crate::services::{
    BankImportService, ConfirmOutcome, ConfirmService, IngestService, StageOptions, StageReport,
    ValidationService,
};
use crate::storage::Storage;

fn print_stage_report(report: &StageReport) {
    if report.already_staged > 0 {
        println!(
            "Warning: {} rows from {} are already staged.",
            report.already_staged, report.source_file
        );
    }
    if report.skipped_duplicate {
        println!("Skipped {} (already staged, staging not cleared).", report.source_file);
        return;
    }
    if report.cleared > 0 {
        println!("Cleared {} previously staged rows.", report.cleared);
    }
    if report.dropped_rows > 0 {
        println!("Dropped {} rows with an invalid date or subject code.", report.dropped_rows);
    }
    println!("Staged {} rows from {}.", report.staged, report.source_file);
    if let Some(snapshot) = &report.training_snapshot {
        println!("Training snapshot: {}", snapshot.display());
    }
}

/// Validate what was just staged and show the set summary when it balances
fn review_staged(storage: &Storage, settings: &Settings) -> LedgerResult<()> {
    let result = ValidationService::new(storage).validate_staged(settings.balance_tolerance)?;
    println!();
    print!("{}", format_validation("Validation", &result));

    if result.valid {
        println!();
        println!("{}", TransactionSummaryReport::generate(storage)?.format_terminal());
    } else {
        println!();
        println!("Fix the sets above and run 'ledger process' again before confirming.");
    }
    Ok(())
}

/// Handle `process <file>`
pub fn handle_process(
    storage: &Storage,
    settings: &Settings,
    chart: &ChartOfAccounts,
    file: &Path,
    options: StageOptions,
) -> LedgerResult<()> {
    let report = IngestService::new(storage, chart).process(file, options)?;
    print_stage_report(&report);
    if report.skipped_duplicate {
        return Ok(());
    }
    review_staged(storage, settings)
}

/// Handle `process-bank <bank> <file>`
pub fn handle_process_bank(
    storage: &Storage,
    settings: &Settings,
    chart: &ChartOfAccounts,
    bank: Bank,
    file: &Path,
    options: StageOptions,
) -> LedgerResult<()> {
    let report = BankImportService::new(storage, chart, settings).process(bank, file, options)?;
    print_stage_report(&report);
    if report.skipped_duplicate || report.staged == 0 {
        return Ok(());
    }
    review_staged(storage, settings)
}

/// Handle `confirm`
pub fn handle_confirm(storage: &Storage, settings: &Settings) -> LedgerResult<()> {
    match ConfirmService::new(storage).confirm(settings.balance_tolerance)? {
        ConfirmOutcome::Confirmed(report) => {
            println!("Confirmed batch {}", report.batch_id);
            println!("  Replaced: {}", report.replaced);
            println!("  Inserted: {}", report.inserted);
            for file in &report.archived_files {
                println!("  Archived: {}", file);
            }
            Ok(())
        }
        ConfirmOutcome::NothingStaged => {
            println!("Nothing staged. Run 'ledger process <file>' first.");
            Ok(())
        }
        ConfirmOutcome::Rejected(result) => {
            print!("{}", format_validation("Validation", &result));
            Err(LedgerError::Validation(format!(
                "{} unbalanced set(s); nothing was confirmed",
                result.unbalanced.len()
            )))
        }
    }
}

/// Handle `clean`: empty the staging table
pub fn handle_clean(storage: &Storage) -> LedgerResult<()> {
    let removed = storage.staging().clear()?;
    storage.log_audit(&AuditEntry::new(Operation::Clear, "temp_journal", removed))?;
    println!("Removed {} staged rows.", removed);
    Ok(())
}
