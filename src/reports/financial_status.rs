//! Financial Status Report
//!
//! Current balance of every account in the journal, grouped by account
//! class, with equity computed from assets and liabilities next to the
//! equity actually recorded.

use std::collections::BTreeMap;

use crate::error::LedgerResult;
use crate::models::{AccountClass, JournalEntry, Money, SubjectCode};
use crate::storage::Storage;

use super::heading;

/// Balance of one account
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectBalance {
    pub subject_code: SubjectCode,
    pub subject: String,
    pub balance: Money,
}

/// Accounts of one class with their total
#[derive(Debug, Clone, PartialEq)]
pub struct ClassBalance {
    pub class: AccountClass,
    pub total: Money,
    pub subjects: Vec<SubjectBalance>,
}

/// Financial Status Report
#[derive(Debug, Clone)]
pub struct FinancialStatusReport {
    pub classes: Vec<ClassBalance>,
    pub currency_symbol: String,
}

impl FinancialStatusReport {
    pub fn generate(storage: &Storage, currency_symbol: &str) -> LedgerResult<Self> {
        Ok(Self::from_entries(&storage.journal().list(None)?, currency_symbol))
    }

    pub fn from_entries(entries: &[JournalEntry], currency_symbol: &str) -> Self {
        let mut balances: BTreeMap<SubjectCode, (Option<String>, Money)> = BTreeMap::new();
        for entry in entries {
            let slot = balances
                .entry(entry.subject_code)
                .or_insert((None, Money::zero()));
            if slot.0.is_none() {
                slot.0 = entry.subject.clone();
            }
            slot.1 += entry.amount;
        }

        let mut classes: Vec<ClassBalance> = AccountClass::all()
            .into_iter()
            .map(|class| ClassBalance {
                class,
                total: Money::zero(),
                subjects: Vec::new(),
            })
            .collect();

        for (code, (subject, balance)) in balances {
            if balance.is_zero() {
                continue;
            }
            if let Some(group) = classes.iter_mut().find(|c| c.class == code.class()) {
                group.total += balance;
                group.subjects.push(SubjectBalance {
                    subject_code: code,
                    subject: subject.unwrap_or_default(),
                    balance,
                });
            }
        }
        classes.retain(|c| !c.subjects.is_empty());

        Self {
            classes,
            currency_symbol: currency_symbol.to_string(),
        }
    }

    pub fn total(&self, class: AccountClass) -> Money {
        self.classes
            .iter()
            .find(|c| c.class == class)
            .map(|c| c.total)
            .unwrap_or_default()
    }

    /// Assets minus liabilities
    pub fn calculated_equity(&self) -> Money {
        self.total(AccountClass::Asset) - self.total(AccountClass::Liability)
    }

    /// Balance of the equity accounts themselves
    pub fn recorded_equity(&self) -> Money {
        self.total(AccountClass::Equity)
    }

    pub fn net_income(&self) -> Money {
        self.total(AccountClass::Income) + self.total(AccountClass::Expense)
    }

    pub fn format_terminal(&self) -> String {
        let mut output = heading("Financial Status", 50);
        if self.classes.is_empty() {
            output.push_str("No confirmed entries.\n");
            return output;
        }
        let fmt = |m: Money| m.format_with_symbol(&self.currency_symbol);

        output.push_str("Balances by class\n");
        for class in &self.classes {
            output.push_str(&format!("  {:<12} {:>18}\n", class.class, fmt(class.total)));
        }

        output.push_str("\nEquity\n");
        output.push_str(&format!("  {:<28} {:>18}\n", "Calculated (assets - liab.)", fmt(self.calculated_equity())));
        output.push_str(&format!("  {:<28} {:>18}\n", "Recorded (equity accounts)", fmt(self.recorded_equity())));

        output.push_str("\nProfit and loss\n");
        output.push_str(&format!("  {:<12} {:>18}\n", "Income", fmt(self.total(AccountClass::Income))));
        output.push_str(&format!("  {:<12} {:>18}\n", "Expenses", fmt(self.total(AccountClass::Expense))));
        output.push_str(&format!("  {:<12} {:>18}\n", "Net income", fmt(self.net_income())));

        output.push_str("\nBy account\n");
        for class in &self.classes {
            output.push_str(&format!("\n{}\n", class.class.to_string().to_uppercase()));
            for subject in &class.subjects {
                output.push_str(&format!(
                    "  {} {:<24} {:>18}\n",
                    subject.subject_code,
                    subject.subject,
                    fmt(subject.balance)
                ));
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn journal(code: u32, units: i64, subject: &str) -> JournalEntry {
        JournalEntry {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            set_id: "s".to_string(),
            entry_id: format!("{}_{}", code, units),
            subject_code: SubjectCode::new(code),
            amount: Money::from_units(units),
            remarks: String::new(),
            subject: Some(subject.to_string()),
            year: 2024,
            month: 3,
            confirmed_at: None,
            batch_id: None,
        }
    }

    #[test]
    fn test_class_totals_and_equity() {
        let report = FinancialStatusReport::from_entries(
            &[
                journal(101, 100000, "UFJ Bank"),
                journal(300, -90000, "Retained Earnings"),
                journal(201, -5000, "JCB Card"),
                journal(500, 5000, "Food"),
                journal(490, -10000, "Other Income"),
                journal(102, 0, "Cash"),
            ],
            "¥",
        );

        assert_eq!(report.total(AccountClass::Asset), Money::from_units(100000));
        assert_eq!(report.total(AccountClass::Liability), Money::from_units(-5000));
        assert_eq!(report.calculated_equity(), Money::from_units(105000));
        assert_eq!(report.recorded_equity(), Money::from_units(-90000));
        assert_eq!(report.net_income(), Money::from_units(-5000));

        let assets = &report.classes[0];
        assert_eq!(assets.subjects.len(), 1);

        let text = report.format_terminal();
        assert!(text.contains("Net income"));
        assert!(text.contains("UFJ Bank"));
    }

    #[test]
    fn test_empty_journal() {
        let report = FinancialStatusReport::from_entries(&[], "");
        assert!(report.format_terminal().contains("No confirmed entries"));
    }
}
