//! Reports module for the household ledger
//!
//! Reports over the staging table (cashflow, transaction summary) and the
//! confirmed journal (trial balance, balance sheet, financial status,
//! monthly trend, closing status), plus the inspection checks used before
//! and after confirming. Each report renders for the terminal; tabular ones
//! export to CSV.

pub mod balance_sheet;
pub mod cashflow;
pub mod closing_status;
pub mod financial_status;
pub mod inspection;
pub mod monthly_trend;
pub mod transaction_summary;
pub mod trial_balance;

pub use balance_sheet::{BalanceSheetReport, MonthlyBalance};
pub use cashflow::{CashflowReport, CashflowRow};
pub use closing_status::ClosingStatusReport;
pub use financial_status::{ClassBalance, FinancialStatusReport};
pub use inspection::{format_validation, InspectionReport, TableSummary};
pub use monthly_trend::{MonthlyTrendReport, TrendRow};
pub use transaction_summary::{SetSummary, TransactionSummaryReport};
pub use trial_balance::TrialBalanceReport;

use std::io::Write;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::error::{LedgerError, LedgerResult};

/// Render rows as a plain terminal table
pub(crate) fn render_table<T: Tabled>(rows: &[T]) -> String {
    let mut table = Table::new(rows);
    table.with(Style::psql());
    table.to_string()
}

/// Heading with an underline, as every report starts
pub(crate) fn heading(title: &str, width: usize) -> String {
    format!("{}\n{}\n", title, "=".repeat(width))
}

/// Flush a report's CSV output
pub(crate) fn finish_csv<W: Write>(mut writer: csv::Writer<W>) -> LedgerResult<()> {
    writer
        .flush()
        .map_err(|e| LedgerError::Export(e.to_string()))
}
