//! Cashflow Report
//!
//! Staged sets that move money on a cash account, with the net cash change
//! of each set.

use std::collections::BTreeMap;
use std::io::Write;

use chrono::NaiveDate;
use tabled::Tabled;

use super::{finish_csv, heading, render_table};
use crate::error::LedgerResult;
use crate::models::{Money, SubjectCode};
use crate::storage::Storage;

/// Cash movement of one staged set
#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct CashflowRow {
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[tabled(rename = "Set")]
    pub set_id: String,
    #[tabled(rename = "Remarks")]
    pub remarks: String,
    #[tabled(rename = "Cash change")]
    pub cash_change: Money,
}

/// Cashflow Report
#[derive(Debug, Clone)]
pub struct CashflowReport {
    pub rows: Vec<CashflowRow>,
    pub cash_codes: Vec<SubjectCode>,
}

impl CashflowReport {
    /// Group staged rows by (date, set, remarks) and keep groups with a cash change
    pub fn generate(storage: &Storage, cash_codes: &[SubjectCode]) -> LedgerResult<Self> {
        let mut groups: BTreeMap<(NaiveDate, String, String), Money> = BTreeMap::new();
        for entry in storage.staging().list()? {
            let change = if cash_codes.contains(&entry.subject_code) {
                entry.amount
            } else {
                Money::zero()
            };
            *groups
                .entry((entry.date, entry.set_id, entry.remarks))
                .or_default() += change;
        }

        let rows = groups
            .into_iter()
            .filter(|(_, change)| !change.is_zero())
            .map(|((date, set_id, remarks), cash_change)| CashflowRow {
                date,
                set_id,
                remarks,
                cash_change,
            })
            .collect();

        Ok(Self {
            rows,
            cash_codes: cash_codes.to_vec(),
        })
    }

    /// Net cash change over every listed set
    pub fn net_change(&self) -> Money {
        self.rows.iter().map(|r| r.cash_change).sum()
    }

    pub fn format_terminal(&self) -> String {
        let mut output = heading("Cashflow (staged)", 60);
        if self.rows.is_empty() {
            output.push_str("No cash movements staged.\n");
            return output;
        }

        output.push_str(&render_table(&self.rows));
        output.push('\n');
        output.push_str(&format!("Net cash change: {:>15}\n", self.net_change()));
        output
    }

    pub fn export_csv<W: Write>(&self, writer: W) -> LedgerResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["date", "set_id", "remarks", "cash_change"])?;
        for row in &self.rows {
            csv.write_record([
                row.date.to_string(),
                row.set_id.clone(),
                row.remarks.clone(),
                row.cash_change.to_string(),
            ])?;
        }
        finish_csv(csv)
    }
}
