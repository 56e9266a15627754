//! CLI commands for closing, training and the audit log

use crate::audit::{AuditEntry, Operation};
use crate::classifier::{train_bank, ModelOutcome};
use crate::config::settings::Settings;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Bank, ChartOfAccounts};
use crate::services::{default_close_month, CloseOutcome, ClosingService};
use crate::storage::Storage;

use super::report::parse_period;

/// Handle `close [YYYY-MM] [--reclose]`
pub fn handle_close(
    storage: &Storage,
    settings: &Settings,
    chart: &ChartOfAccounts,
    period: Option<String>,
    reclose: bool,
) -> LedgerResult<()> {
    let period = parse_period(period.as_deref())?.unwrap_or_else(default_close_month);
    let service = ClosingService::new(storage, chart, settings.retained_earnings_code);

    match service.close(period, reclose)? {
        CloseOutcome::Closed {
            period,
            net_income,
            entries,
            removed,
        } => {
            if removed > 0 {
                println!("Removed {} previous closing entries for {}.", removed, period);
            }
            println!("Closed {} with {} entries.", period, entries.len());
            println!("  Net income: {}", net_income);
            for entry in &entries {
                println!(
                    "  {} {:<20} {:>14} {}",
                    entry.subject_code,
                    entry.subject.as_deref().unwrap_or(""),
                    entry.amount.to_string(),
                    entry.remarks
                );
            }
        }
        CloseOutcome::AlreadyClosed(period) => {
            println!("{} is already closed. Use --reclose to close it again.", period);
        }
        CloseOutcome::NothingToClose(period) => {
            println!("Nothing to close for {}: no income or expense balances.", period);
        }
    }
    Ok(())
}

fn describe(outcome: &ModelOutcome) -> String {
    match outcome {
        ModelOutcome::Trained { samples, classes } => {
            format!("trained on {} samples, {} classes", samples, classes)
        }
        ModelOutcome::InsufficientData { samples } => {
            format!("skipped, only {} samples", samples)
        }
    }
}

fn samples(outcome: &ModelOutcome) -> usize {
    match outcome {
        ModelOutcome::Trained { samples, .. } | ModelOutcome::InsufficientData { samples } => *samples,
    }
}

/// Handle `train <bank>`
pub fn handle_train(storage: &Storage, settings: &Settings, bank: Bank) -> LedgerResult<()> {
    let paths = storage.paths();
    let report = train_bank(&paths.train_dir(), &paths.models_dir(), bank, &settings.classifier)?;

    println!("Training models for {}", bank);
    println!("  subject code: {}", describe(&report.subject_code));
    println!("  remarks:      {}", describe(&report.remarks));

    storage.log_audit(
        &AuditEntry::new(
            Operation::Train,
            bank.as_str(),
            samples(&report.subject_code).max(samples(&report.remarks)),
        )
        .with_details(format!(
            "subject_code: {}; remarks: {}",
            describe(&report.subject_code),
            describe(&report.remarks)
        )),
    )?;

    if report.success() {
        Ok(())
    } else {
        Err(LedgerError::Classifier(format!(
            "no model trained for {}; need at least {} samples",
            bank, settings.classifier.min_training_samples
        )))
    }
}

/// Handle `audit [--count N]`
pub fn handle_audit(storage: &Storage, count: usize) -> LedgerResult<()> {
    let entries = storage.audit().read_recent(count)?;
    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }
    for entry in entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}
