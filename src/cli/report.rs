//! CLI commands for reports
//!
//! Terminal output by default; `--csv <file>` writes the tabular reports to
//! a file instead.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::ValueEnum;

use crate::config::settings::Settings;
use crate::error::{LedgerError, LedgerResult};
use crate::models::YearMonth;
use crate::reports::{
    BalanceSheetReport, CashflowReport, ClosingStatusReport, FinancialStatusReport,
    InspectionReport, MonthlyTrendReport, TransactionSummaryReport, TrialBalanceReport,
};
use crate::storage::Storage;

/// Months shown by the trend sections
const TREND_MONTHS: u32 = 6;

fn create_output(path: &Path) -> LedgerResult<BufWriter<File>> {
    let file = File::create(path).map_err(|e| {
        LedgerError::Export(format!("Failed to create file {}: {}", path.display(), e))
    })?;
    Ok(BufWriter::new(file))
}

pub(crate) fn parse_period(period: Option<&str>) -> LedgerResult<Option<YearMonth>> {
    period
        .map(|p| {
            YearMonth::parse(p).map_err(|e| {
                LedgerError::Validation(format!("Invalid period format: {}. Use YYYY-MM (e.g., 2024-03)", e))
            })
        })
        .transpose()
}

/// Handle `trial [YYYY-MM] [--csv file]`
pub fn handle_trial(storage: &Storage, period: Option<String>, output: Option<PathBuf>) -> LedgerResult<()> {
    let report = TrialBalanceReport::generate(storage, parse_period(period.as_deref())?)?;

    if let Some(path) = output {
        report.export_csv(create_output(&path)?)?;
        println!("Trial balance exported to: {}", path.display());
    } else {
        println!("{}", report.format_terminal());
    }
    Ok(())
}

/// Handle `cashflow [--csv file]`
pub fn handle_cashflow(storage: &Storage, settings: &Settings, output: Option<PathBuf>) -> LedgerResult<()> {
    let report = CashflowReport::generate(storage, &settings.cash_codes)?;

    if let Some(path) = output {
        report.export_csv(create_output(&path)?)?;
        println!("Cashflow exported to: {}", path.display());
    } else {
        println!("{}", report.format_terminal());
    }
    Ok(())
}

/// Handle `summary [--csv file]`
pub fn handle_summary(storage: &Storage, output: Option<PathBuf>) -> LedgerResult<()> {
    let report = TransactionSummaryReport::generate(storage)?;

    if let Some(path) = output {
        report.export_csv(create_output(&path)?)?;
        println!("Transaction summary exported to: {}", path.display());
    } else {
        println!("{}", report.format_terminal());
    }
    Ok(())
}

/// Handle `balance-sheet [--csv file]`
pub fn handle_balance_sheet(storage: &Storage, output: Option<PathBuf>) -> LedgerResult<()> {
    let report = BalanceSheetReport::generate(storage)?;

    if let Some(path) = output {
        report.export_csv(create_output(&path)?)?;
        println!("Balance sheet exported to: {}", path.display());
    } else {
        println!("{}", report.format_terminal());
    }
    Ok(())
}

/// Handle `status`: financial position, trend and closing state
pub fn handle_status(storage: &Storage, settings: &Settings) -> LedgerResult<()> {
    println!(
        "{}",
        FinancialStatusReport::generate(storage, &settings.currency_symbol)?.format_terminal()
    );
    println!(
        "{}",
        MonthlyTrendReport::generate(storage, TREND_MONTHS, YearMonth::current())?.format_terminal()
    );
    println!("{}", ClosingStatusReport::generate(storage)?.format_terminal());
    Ok(())
}

/// What `check` inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CheckTarget {
    /// Row counts and date ranges of both tables
    Summary,
    /// Staged entries that would replace confirmed ones
    Duplicates,
    /// Set balance of staged and confirmed entries
    Balance,
    /// Recently confirmed sets
    Recent,
    /// Staged source files
    Files,
    /// What confirm would do
    Preview,
    /// Monthly trend of the account classes
    Trend,
    /// Closed and unclosed months
    Closing,
    /// Everything above
    All,
}

/// Handle `check <target>`
pub fn handle_check(storage: &Storage, settings: &Settings, target: CheckTarget) -> LedgerResult<()> {
    let report = InspectionReport::new(storage, settings.balance_tolerance);

    let targets = match target {
        CheckTarget::All => vec![
            CheckTarget::Summary,
            CheckTarget::Duplicates,
            CheckTarget::Balance,
            CheckTarget::Recent,
            CheckTarget::Files,
            CheckTarget::Preview,
            CheckTarget::Trend,
            CheckTarget::Closing,
        ],
        single => vec![single],
    };

    for target in targets {
        let section = match target {
            CheckTarget::Summary => report.format_summary()?,
            CheckTarget::Duplicates => report.format_duplicates()?,
            CheckTarget::Balance => report.format_balance()?,
            CheckTarget::Recent => report.format_recent(settings.recent_days, Utc::now())?,
            CheckTarget::Files => report.format_files()?,
            CheckTarget::Preview => report.format_preview()?,
            CheckTarget::Trend => {
                MonthlyTrendReport::generate(storage, TREND_MONTHS, YearMonth::current())?.format_terminal()
            }
            CheckTarget::Closing => ClosingStatusReport::generate(storage)?.format_terminal(),
            CheckTarget::All => continue,
        };
        println!("{}", section);
    }
    Ok(())
}
