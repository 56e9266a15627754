//! Monthly Trend Report
//!
//! Per-month movement of each account class over a trailing window.

use std::collections::BTreeMap;
use std::io::Write;

use tabled::Tabled;

use super::{finish_csv, heading, render_table};
use crate::error::LedgerResult;
use crate::models::{AccountClass, JournalEntry, Money, YearMonth};
use crate::storage::Storage;

/// Class movements of one month
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendRow {
    pub period: YearMonth,
    pub assets: Money,
    pub liabilities: Money,
    pub equity: Money,
    pub income: Money,
    pub expenses: Money,
}

impl TrendRow {
    fn new(period: YearMonth) -> Self {
        Self {
            period,
            assets: Money::zero(),
            liabilities: Money::zero(),
            equity: Money::zero(),
            income: Money::zero(),
            expenses: Money::zero(),
        }
    }

    pub fn net_income(&self) -> Money {
        self.income + self.expenses
    }
}

#[derive(Tabled)]
struct TrendLine {
    #[tabled(rename = "Month")]
    period: YearMonth,
    #[tabled(rename = "Assets")]
    assets: Money,
    #[tabled(rename = "Liabilities")]
    liabilities: Money,
    #[tabled(rename = "Equity")]
    equity: Money,
    #[tabled(rename = "Income")]
    income: Money,
    #[tabled(rename = "Expenses")]
    expenses: Money,
    #[tabled(rename = "Net income")]
    net_income: Money,
}

/// Monthly Trend Report
#[derive(Debug, Clone)]
pub struct MonthlyTrendReport {
    /// First month of the window
    pub since: YearMonth,
    pub rows: Vec<TrendRow>,
}

impl MonthlyTrendReport {
    /// Months from `months` before `current` up to the latest confirmed month
    pub fn generate(storage: &Storage, months: u32, current: YearMonth) -> LedgerResult<Self> {
        Ok(Self::from_entries(&storage.journal().list(None)?, months, current))
    }

    pub fn from_entries(entries: &[JournalEntry], months: u32, current: YearMonth) -> Self {
        let since = current.minus_months(months);
        let mut by_month: BTreeMap<YearMonth, TrendRow> = BTreeMap::new();

        for entry in entries {
            let period = YearMonth {
                year: entry.year,
                month: entry.month,
            };
            if period < since {
                continue;
            }
            let row = by_month
                .entry(period)
                .or_insert_with(|| TrendRow::new(period));
            match entry.subject_code.class() {
                AccountClass::Asset => row.assets += entry.amount,
                AccountClass::Liability => row.liabilities += entry.amount,
                AccountClass::Equity => row.equity += entry.amount,
                AccountClass::Income => row.income += entry.amount,
                AccountClass::Expense => row.expenses += entry.amount,
                AccountClass::Other => {}
            }
        }

        Self {
            since,
            rows: by_month.into_values().collect(),
        }
    }

    pub fn format_terminal(&self) -> String {
        let mut output = heading(&format!("Monthly Trend (since {})", self.since), 70);
        if self.rows.is_empty() {
            output.push_str("No monthly data.\n");
            return output;
        }

        let lines: Vec<TrendLine> = self
            .rows
            .iter()
            .map(|row| TrendLine {
                period: row.period,
                assets: row.assets,
                liabilities: row.liabilities,
                equity: row.equity,
                income: row.income,
                expenses: row.expenses,
                net_income: row.net_income(),
            })
            .collect();
        output.push_str(&render_table(&lines));
        output.push('\n');
        output
    }

    pub fn export_csv<W: Write>(&self, writer: W) -> LedgerResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["month", "assets", "liabilities", "equity", "income", "expenses", "net_income"])?;
        for row in &self.rows {
            csv.write_record([
                row.period.to_string(),
                row.assets.to_string(),
                row.liabilities.to_string(),
                row.equity.to_string(),
                row.income.to_string(),
                row.expenses.to_string(),
                row.net_income().to_string(),
            ])?;
        }
        finish_csv(csv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubjectCode;
    use chrono::NaiveDate;

    fn journal(year: i32, month: u32, code: u32, units: i64) -> JournalEntry {
        JournalEntry {
            date: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
            set_id: "s".to_string(),
            entry_id: format!("{}{}_{}", year, month, code),
            subject_code: SubjectCode::new(code),
            amount: Money::from_units(units),
            remarks: String::new(),
            subject: None,
            year,
            month,
            confirmed_at: None,
            batch_id: None,
        }
    }

    #[test]
    fn test_window_and_net_income() {
        let entries = [
            journal(2023, 9, 500, 999),
            journal(2024, 1, 500, 1000),
            journal(2024, 1, 101, -1000),
            journal(2024, 3, 101, 5000),
            journal(2024, 3, 400, -5000),
        ];
        let report = MonthlyTrendReport::from_entries(&entries, 6, YearMonth::new(2024, 3).unwrap());

        assert_eq!(report.since, YearMonth::new(2023, 9).unwrap());
        assert_eq!(report.rows.len(), 3);

        let report = MonthlyTrendReport::from_entries(&entries, 2, YearMonth::new(2024, 3).unwrap());
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].expenses, Money::from_units(1000));
        assert_eq!(report.rows[0].net_income(), Money::from_units(1000));
        assert_eq!(report.rows[1].income, Money::from_units(-5000));
        assert!(report.format_terminal().contains("2024-03"));
    }
}
