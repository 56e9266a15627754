//! Trial Balance Report
//!
//! Per month and account: debit total, credit total and balance from the
//! `trial_balance` view. Balance-sheet accounts carry a running balance,
//! income and expense accounts the month's balance.

use std::io::Write;

use tabled::Tabled;

use super::{finish_csv, heading, render_table};
use crate::error::LedgerResult;
use crate::models::{Money, YearMonth};
use crate::storage::{Storage, TrialBalanceRow};

#[derive(Tabled)]
struct TrialBalanceLine {
    #[tabled(rename = "Month")]
    period: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Debit")]
    debit: String,
    #[tabled(rename = "Credit")]
    credit: String,
    #[tabled(rename = "Balance")]
    balance: String,
}

/// Trial Balance Report
#[derive(Debug, Clone)]
pub struct TrialBalanceReport {
    /// Month filter, `None` for every month
    pub period: Option<YearMonth>,
    pub rows: Vec<TrialBalanceRow>,
}

impl TrialBalanceReport {
    pub fn generate(storage: &Storage, period: Option<YearMonth>) -> LedgerResult<Self> {
        let rows = storage.journal().trial_balance(period)?;
        Ok(Self { period, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Debit and credit totals over all rows
    pub fn totals(&self) -> (Money, Money) {
        self.rows.iter().fold((Money::zero(), Money::zero()), |(d, c), row| {
            (d + row.debit_total, c + row.credit_total)
        })
    }

    pub fn format_terminal(&self) -> String {
        let title = match self.period {
            Some(ym) => format!("Trial Balance {}", ym),
            None => "Trial Balance".to_string(),
        };
        let mut output = heading(&title, 60);

        if self.rows.is_empty() {
            output.push_str("No confirmed entries.\n");
            return output;
        }

        let lines: Vec<TrialBalanceLine> = self
            .rows
            .iter()
            .map(|row| TrialBalanceLine {
                period: row.period.to_string(),
                code: row.subject_code.to_string(),
                subject: row.subject.clone().unwrap_or_default(),
                debit: row.debit_total.to_string(),
                credit: row.credit_total.to_string(),
                balance: row.balance.to_string(),
            })
            .collect();
        output.push_str(&render_table(&lines));
        output.push('\n');

        let (debit, credit) = self.totals();
        output.push_str(&format!("Total debit:  {:>15}\n", debit));
        output.push_str(&format!("Total credit: {:>15}\n", credit));
        output
    }

    pub fn export_csv<W: Write>(&self, writer: W) -> LedgerResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["year", "month", "subject_code", "subject", "debit_total", "credit_total", "balance"])?;
        for row in &self.rows {
            csv.write_record([
                row.period.year.to_string(),
                row.period.month.to_string(),
                row.subject_code.to_string(),
                row.subject.clone().unwrap_or_default(),
                row.debit_total.to_string(),
                row.credit_total.to_string(),
                row.balance.to_string(),
            ])?;
        }
        finish_csv(csv)
    }
}
