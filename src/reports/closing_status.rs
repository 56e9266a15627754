//! Closing Status Report
//!
//! Which months carry closing entries and which months have income or
//! expense activity that has not been closed yet.

use tabled::Tabled;

use super::{heading, render_table};
use crate::error::LedgerResult;
use crate::models::{Money, YearMonth};
use crate::storage::{ClosedMonth, Storage};

#[derive(Tabled)]
struct ClosedLine {
    #[tabled(rename = "Month")]
    period: YearMonth,
    #[tabled(rename = "Close entries")]
    close_entries: i64,
    #[tabled(rename = "Total")]
    total_amount: Money,
}

/// Closing Status Report
#[derive(Debug, Clone)]
pub struct ClosingStatusReport {
    pub closed: Vec<ClosedMonth>,
    pub unclosed: Vec<YearMonth>,
}

impl ClosingStatusReport {
    pub fn generate(storage: &Storage) -> LedgerResult<Self> {
        let journal = storage.journal();
        Ok(Self {
            closed: journal.closed_months()?,
            unclosed: journal.unclosed_months()?,
        })
    }

    pub fn is_closed(&self, period: YearMonth) -> bool {
        self.closed.iter().any(|m| m.period == period)
    }

    pub fn format_terminal(&self) -> String {
        let mut output = heading("Closing Status", 50);

        if self.closed.is_empty() {
            output.push_str("No closed months.\n");
        } else {
            let lines: Vec<ClosedLine> = self
                .closed
                .iter()
                .map(|m| ClosedLine {
                    period: m.period,
                    close_entries: m.close_entries,
                    total_amount: m.total_amount,
                })
                .collect();
            output.push_str(&render_table(&lines));
            output.push('\n');
        }

        if self.unclosed.is_empty() {
            output.push_str("\nEvery month with income or expenses is closed.\n");
        } else {
            output.push_str("\nNot closed yet:\n");
            for period in &self.unclosed {
                output.push_str(&format!("  {}\n", period));
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::LedgerPaths;
    use crate::models::{ChartOfAccounts, JournalEntry, SubjectCode};
    use crate::services::closing::{CloseOutcome, ClosingService};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn book(storage: &Storage, month: u32, code: u32, units: i64, idx: u32) {
        storage
            .journal()
            .insert(&JournalEntry {
                date: NaiveDate::from_ymd_opt(2024, month, 3).unwrap(),
                set_id: format!("2024{:02}03_001", month),
                entry_id: format!("2024{:02}03_001_{:03}", month, idx),
                subject_code: SubjectCode::new(code),
                amount: Money::from_units(units),
                remarks: "test".to_string(),
                subject: None,
                year: 2024,
                month,
                confirmed_at: None,
                batch_id: None,
            })
            .unwrap();
    }

    #[test]
    fn test_closed_and_unclosed_months() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(LedgerPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        book(&storage, 3, 500, 100, 0);
        book(&storage, 3, 101, -100, 1);
        book(&storage, 4, 500, 200, 0);
        book(&storage, 4, 101, -200, 1);

        let chart = ChartOfAccounts::default_chart();
        let march = YearMonth::new(2024, 3).unwrap();
        let outcome = ClosingService::new(&storage, &chart, SubjectCode::new(300))
            .close(march, false)
            .unwrap();
        assert!(matches!(outcome, CloseOutcome::Closed { .. }));

        let report = ClosingStatusReport::generate(&storage).unwrap();
        assert!(report.is_closed(march));
        assert_eq!(report.closed[0].close_entries, 1);
        assert_eq!(report.unclosed, vec![YearMonth::new(2024, 4).unwrap()]);
        assert!(report.format_terminal().contains("Not closed yet"));
    }
}
