//! Transaction Summary Report
//!
//! Staged rows grouped by date, set and remarks, listing each set's lines
//! as `subject:amount` with the largest amount first.

use std::collections::BTreeMap;
use std::io::Write;

use chrono::NaiveDate;
use tabled::Tabled;

use super::{finish_csv, heading, render_table};
use crate::error::LedgerResult;
use crate::models::StagedEntry;
use crate::storage::Storage;

/// One staged set (split further by remarks)
#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct SetSummary {
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[tabled(rename = "Set")]
    pub set_id: String,
    #[tabled(rename = "Remarks")]
    pub remarks: String,
    #[tabled(rename = "Lines")]
    pub entry_count: usize,
    #[tabled(rename = "Entries")]
    pub entries: String,
}

/// Transaction Summary Report
#[derive(Debug, Clone)]
pub struct TransactionSummaryReport {
    pub sets: Vec<SetSummary>,
}

fn subject_label(entry: &StagedEntry) -> String {
    entry
        .subject
        .clone()
        .unwrap_or_else(|| entry.subject_code.to_string())
}

impl TransactionSummaryReport {
    pub fn generate(storage: &Storage) -> LedgerResult<Self> {
        Ok(Self::from_entries(storage.staging().list()?))
    }

    pub fn from_entries(entries: Vec<StagedEntry>) -> Self {
        let mut groups: BTreeMap<(NaiveDate, String, String), Vec<StagedEntry>> = BTreeMap::new();
        for entry in entries {
            groups
                .entry((entry.date, entry.set_id.clone(), entry.remarks.clone()))
                .or_default()
                .push(entry);
        }

        let sets = groups
            .into_iter()
            .map(|((date, set_id, remarks), mut lines)| {
                lines.sort_by(|a, b| b.amount.cmp(&a.amount));
                let entries = lines
                    .iter()
                    .map(|e| format!("{}:{}", subject_label(e), e.amount))
                    .collect::<Vec<_>>()
                    .join(", ");
                SetSummary {
                    date,
                    set_id,
                    remarks,
                    entry_count: lines.len(),
                    entries,
                }
            })
            .collect();

        Self { sets }
    }

    pub fn format_terminal(&self) -> String {
        let mut output = heading("Transaction Summary (staged)", 60);
        if self.sets.is_empty() {
            output.push_str("Nothing staged.\n");
        } else {
            output.push_str(&render_table(&self.sets));
            output.push('\n');
            output.push_str(&format!("{} set(s)\n", self.sets.len()));
        }
        output
    }

    pub fn export_csv<W: Write>(&self, writer: W) -> LedgerResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["date", "set_id", "remarks", "entry_count", "entries"])?;
        for set in &self.sets {
            csv.write_record([
                set.date.to_string(),
                set.set_id.clone(),
                set.remarks.clone(),
                set.entry_count.to_string(),
                set.entries.clone(),
            ])?;
        }
        finish_csv(csv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, SubjectCode};

    fn staged(set: &str, idx: usize, code: u32, units: i64, remarks: &str, subject: Option<&str>) -> StagedEntry {
        StagedEntry {
            date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            set_id: set.to_string(),
            entry_id: format!("{}_{:03}", set, idx),
            subject_code: SubjectCode::new(code),
            amount: Money::from_units(units),
            remarks: remarks.to_string(),
            subject: subject.map(|s| s.to_string()),
            source_file: "march.csv".to_string(),
        }
    }

    #[test]
    fn test_sets_grouped_and_ordered() {
        let report = TransactionSummaryReport::from_entries(vec![
            staged("20240302_002", 0, 101, -1850, "paypay", Some("UFJ Bank")),
            staged("20240302_002", 1, 500, 1850, "paypay", Some("Food")),
            staged("20240302_001", 0, 500, -850, "shogo", None),
            staged("20240302_001", 1, 530, 850, "shogo", None),
        ]);

        assert_eq!(report.sets.len(), 2);
        assert_eq!(report.sets[0].set_id, "20240302_001");
        assert_eq!(report.sets[0].entries, "530:850.00, 500:-850.00");
        assert_eq!(report.sets[1].entries, "Food:1850.00, UFJ Bank:-1850.00");
        assert_eq!(report.sets[1].entry_count, 2);
        assert!(report.format_terminal().contains("2 set(s)"));
    }

    #[test]
    fn test_empty_summary() {
        let report = TransactionSummaryReport::from_entries(Vec::new());
        assert!(report.format_terminal().contains("Nothing staged"));
    }
}
