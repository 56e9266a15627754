//! Balance Sheet Report
//!
//! Monthly per-account sums of the confirmed journal with class totals.
//! Sums are for the month itself, not running balances. Liabilities take
//! the 200-399 range and expenses 500-699, so equity is reported as assets
//! minus that total.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use tabled::Tabled;

use super::{finish_csv, heading, render_table};
use crate::error::LedgerResult;
use crate::models::{JournalEntry, Money, SubjectCode, YearMonth};
use crate::storage::Storage;

/// One month of the balance sheet
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyBalance {
    pub period: YearMonth,
    pub by_subject: BTreeMap<SubjectCode, Money>,
    pub total_assets: Money,
    pub total_liabilities: Money,
    pub total_income: Money,
    pub total_expenses: Money,
}

impl MonthlyBalance {
    fn new(period: YearMonth) -> Self {
        Self {
            period,
            by_subject: BTreeMap::new(),
            total_assets: Money::zero(),
            total_liabilities: Money::zero(),
            total_income: Money::zero(),
            total_expenses: Money::zero(),
        }
    }

    fn add(&mut self, code: SubjectCode, amount: Money) {
        *self.by_subject.entry(code).or_default() += amount;
        match code.value() {
            100..=199 => self.total_assets += amount,
            200..=399 => self.total_liabilities += amount,
            400..=499 => self.total_income += amount,
            500..=699 => self.total_expenses += amount,
            _ => {}
        }
    }

    /// Income plus expenses (income is carried negative)
    pub fn net_income(&self) -> Money {
        self.total_income + self.total_expenses
    }

    pub fn total_equity(&self) -> Money {
        self.total_assets - self.total_liabilities
    }

    pub fn subject(&self, code: SubjectCode) -> Money {
        self.by_subject.get(&code).copied().unwrap_or_default()
    }
}

#[derive(Tabled)]
struct SummaryLine {
    #[tabled(rename = "Month")]
    period: YearMonth,
    #[tabled(rename = "Assets")]
    assets: Money,
    #[tabled(rename = "Liabilities")]
    liabilities: Money,
    #[tabled(rename = "Income")]
    income: Money,
    #[tabled(rename = "Expenses")]
    expenses: Money,
    #[tabled(rename = "Net income")]
    net_income: Money,
    #[tabled(rename = "Equity")]
    equity: Money,
}

/// Balance Sheet Report
#[derive(Debug, Clone)]
pub struct BalanceSheetReport {
    pub months: Vec<MonthlyBalance>,
    /// Every account appearing in any month, ascending
    pub subjects: Vec<SubjectCode>,
}

impl BalanceSheetReport {
    pub fn generate(storage: &Storage) -> LedgerResult<Self> {
        Ok(Self::from_entries(&storage.journal().list(None)?))
    }

    pub fn from_entries(entries: &[JournalEntry]) -> Self {
        let mut months: BTreeMap<YearMonth, MonthlyBalance> = BTreeMap::new();
        let mut subjects = BTreeSet::new();
        for entry in entries {
            let period = YearMonth {
                year: entry.year,
                month: entry.month,
            };
            months
                .entry(period)
                .or_insert_with(|| MonthlyBalance::new(period))
                .add(entry.subject_code, entry.amount);
            subjects.insert(entry.subject_code);
        }

        Self {
            months: months.into_values().collect(),
            subjects: subjects.into_iter().collect(),
        }
    }

    pub fn format_terminal(&self) -> String {
        let mut output = heading("Balance Sheet (monthly)", 70);
        if self.months.is_empty() {
            output.push_str("No confirmed entries.\n");
            return output;
        }

        let lines: Vec<SummaryLine> = self
            .months
            .iter()
            .map(|m| SummaryLine {
                period: m.period,
                assets: m.total_assets,
                liabilities: m.total_liabilities,
                income: m.total_income,
                expenses: m.total_expenses,
                net_income: m.net_income(),
                equity: m.total_equity(),
            })
            .collect();
        output.push_str(&render_table(&lines));
        output.push('\n');
        output
    }

    /// One row per month: `YearMonth`, each account code, then the totals
    pub fn export_csv<W: Write>(&self, writer: W) -> LedgerResult<()> {
        let mut csv = csv::Writer::from_writer(writer);

        let mut header = vec!["YearMonth".to_string()];
        header.extend(self.subjects.iter().map(|c| c.to_string()));
        header.extend(
            ["TotalAssets", "TotalLiabilities", "TotalIncome", "TotalExpenses", "NetIncome", "TotalEquity"]
                .iter()
                .map(|s| s.to_string()),
        );
        csv.write_record(&header)?;

        for month in &self.months {
            let mut record = vec![month.period.to_string()];
            record.extend(self.subjects.iter().map(|c| month.subject(*c).to_string()));
            record.extend(
                [
                    month.total_assets,
                    month.total_liabilities,
                    month.total_income,
                    month.total_expenses,
                    month.net_income(),
                    month.total_equity(),
                ]
                .iter()
                .map(|m| m.to_string()),
            );
            csv.write_record(&record)?;
        }
        finish_csv(csv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn journal(month: u32, code: u32, units: i64) -> JournalEntry {
        JournalEntry {
            date: NaiveDate::from_ymd_opt(2024, month, 1).unwrap(),
            set_id: "s".to_string(),
            entry_id: format!("{}_{}_{}", month, code, units),
            subject_code: SubjectCode::new(code),
            amount: Money::from_units(units),
            remarks: String::new(),
            subject: None,
            year: 2024,
            month,
            confirmed_at: None,
            batch_id: None,
        }
    }

    #[test]
    fn test_monthly_totals() {
        let report = BalanceSheetReport::from_entries(&[
            journal(3, 101, 250000),
            journal(3, 400, -250000),
            journal(3, 500, 1850),
            journal(3, 201, -1850),
            journal(4, 101, -1000),
            journal(4, 598, 1000),
        ]);

        assert_eq!(report.months.len(), 2);
        assert_eq!(report.subjects.len(), 5);

        let march = &report.months[0];
        assert_eq!(march.total_assets, Money::from_units(250000));
        assert_eq!(march.total_liabilities, Money::from_units(-1850));
        assert_eq!(march.total_income, Money::from_units(-250000));
        assert_eq!(march.total_expenses, Money::from_units(1850));
        assert_eq!(march.net_income(), Money::from_units(-248150));
        assert_eq!(march.total_equity(), Money::from_units(251850));

        let april = &report.months[1];
        assert_eq!(april.total_assets, Money::from_units(-1000));
        assert_eq!(april.subject(SubjectCode::new(400)), Money::zero());
    }

    #[test]
    fn test_csv_layout() {
        let report = BalanceSheetReport::from_entries(&[journal(3, 101, -500), journal(3, 500, 500)]);
        let mut out = Vec::new();
        report.export_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("YearMonth,101,500,TotalAssets,TotalLiabilities,TotalIncome,TotalExpenses,NetIncome,TotalEquity")
        );
        assert_eq!(
            lines.next(),
            Some("2024-03,-500.00,500.00,-500.00,0.00,0.00,500.00,500.00,-500.00")
        );
    }
}
