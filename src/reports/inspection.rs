//! Inspection checks
//!
//! Quick looks at the staging table and the journal used before and after
//! confirming: table summary, overlapping entry ids, balance checks, recent
//! confirmations, staged files and a preview of what `confirm` will do.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tabled::Tabled;

use super::{heading, render_table};
use crate::error::LedgerResult;
use crate::models::Money;
use crate::services::confirm::ConfirmService;
use crate::services::validation::{ValidationResult, ValidationService};
use crate::storage::Storage;

fn optional_date(date: &Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

fn optional_count(count: &Option<i64>) -> String {
    count.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Size and date range of one table
#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct TableSummary {
    #[tabled(rename = "Table")]
    pub table: &'static str,
    #[tabled(rename = "Rows")]
    pub record_count: i64,
    #[tabled(rename = "Sets")]
    pub unique_sets: i64,
    /// `None` for tables without a source file column
    #[tabled(rename = "Files", display_with = "optional_count")]
    pub source_files: Option<i64>,
    #[tabled(rename = "From", display_with = "optional_date")]
    pub earliest_date: Option<NaiveDate>,
    #[tabled(rename = "To", display_with = "optional_date")]
    pub latest_date: Option<NaiveDate>,
}

#[derive(Tabled)]
struct FileLine {
    #[tabled(rename = "File")]
    source_file: String,
    #[tabled(rename = "Rows")]
    entry_count: i64,
    #[tabled(rename = "From", display_with = "optional_date")]
    earliest_date: Option<NaiveDate>,
    #[tabled(rename = "To", display_with = "optional_date")]
    latest_date: Option<NaiveDate>,
}

#[derive(Tabled)]
struct RecentLine {
    #[tabled(rename = "Confirmed at")]
    confirmed_at: String,
    #[tabled(rename = "Date")]
    date: NaiveDate,
    #[tabled(rename = "Set")]
    set_id: String,
    #[tabled(rename = "Lines")]
    entry_count: i64,
    #[tabled(rename = "Balance")]
    balance: Money,
}

/// Validation outcome with one block per unbalanced set
pub fn format_validation(title: &str, result: &ValidationResult) -> String {
    let mut output = format!("{}: {} ({} sets checked)\n", title, result.message, result.checked_sets);
    for set in &result.unbalanced {
        output.push_str(&format!(
            "  {} {} balance {} ({} lines) [{}]\n    {}\n",
            set.date,
            set.set_id,
            set.balance,
            set.entry_count,
            set.remarks_list.join(", "),
            set.entries.join(", ")
        ));
    }
    output
}

/// Inspection checks over one ledger
pub struct InspectionReport<'a> {
    storage: &'a Storage,
    tolerance: Money,
}

impl<'a> InspectionReport<'a> {
    pub fn new(storage: &'a Storage, tolerance: Money) -> Self {
        Self { storage, tolerance }
    }

    pub fn table_summaries(&self) -> LedgerResult<Vec<TableSummary>> {
        let staged = self.storage.staging().list()?;
        let staged_sets: BTreeSet<&str> = staged.iter().map(|e| e.set_id.as_str()).collect();
        let staged_files: BTreeSet<&str> = staged.iter().map(|e| e.source_file.as_str()).collect();

        let journal = self.storage.journal();
        let (journal_sets, earliest, latest) = journal.span()?;
        let journal_count = journal.count()?;

        Ok(vec![
            TableSummary {
                table: "temp_journal",
                record_count: staged.len() as i64,
                unique_sets: staged_sets.len() as i64,
                source_files: Some(staged_files.len() as i64),
                earliest_date: staged.iter().map(|e| e.date).min(),
                latest_date: staged.iter().map(|e| e.date).max(),
            },
            TableSummary {
                table: "journal_entries",
                record_count: journal_count,
                unique_sets: journal_sets,
                source_files: None,
                earliest_date: earliest,
                latest_date: latest,
            },
        ])
    }

    pub fn format_summary(&self) -> LedgerResult<String> {
        let mut output = heading("Table Summary", 60);
        output.push_str(&render_table(&self.table_summaries()?));
        output.push('\n');
        Ok(output)
    }

    /// Staged entries that will replace confirmed ones versus new entries
    pub fn format_duplicates(&self) -> LedgerResult<String> {
        let mut output = heading("Duplicate Check", 60);
        let overlapping = self.storage.staging().overlapping_entry_ids()?;
        let staged = self.storage.staging().count()?;

        output.push_str(&format!("New entries:       {:>8}\n", staged - overlapping.len() as i64));
        output.push_str(&format!("Replacing entries: {:>8}\n", overlapping.len()));
        if !overlapping.is_empty() {
            output.push_str("\nEntry ids already confirmed:\n");
            for id in &overlapping {
                output.push_str(&format!("  {}\n", id));
            }
        }
        Ok(output)
    }

    /// Balance checks on both tables
    pub fn format_balance(&self) -> LedgerResult<String> {
        let service = ValidationService::new(self.storage);
        let mut output = heading("Balance Check", 60);
        output.push_str(&format_validation(
            "Staged",
            &service.validate_staged(self.tolerance)?,
        ));
        output.push_str(&format_validation(
            "Confirmed",
            &service.validate_confirmed(self.tolerance)?,
        ));
        Ok(output)
    }

    /// Sets confirmed during the `days` days before `now`
    pub fn format_recent(&self, days: i64, now: DateTime<Utc>) -> LedgerResult<String> {
        let mut output = heading(&format!("Confirmed in the last {} days", days), 60);
        let sets = self
            .storage
            .journal()
            .confirmed_since(now - Duration::days(days))?;
        if sets.is_empty() {
            output.push_str("Nothing confirmed.\n");
            return Ok(output);
        }

        let lines: Vec<RecentLine> = sets
            .into_iter()
            .map(|s| RecentLine {
                confirmed_at: s
                    .confirmed_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
                date: s.date,
                set_id: s.set_id,
                entry_count: s.entry_count,
                balance: s.balance,
            })
            .collect();
        output.push_str(&render_table(&lines));
        output.push('\n');
        Ok(output)
    }

    pub fn format_files(&self) -> LedgerResult<String> {
        let mut output = heading("Staged Files", 60);
        let files = self.storage.staging().source_files()?;
        if files.is_empty() {
            output.push_str("Nothing staged.\n");
            return Ok(output);
        }

        let lines: Vec<FileLine> = files
            .into_iter()
            .map(|f| FileLine {
                source_file: f.source_file,
                entry_count: f.entry_count,
                earliest_date: f.earliest_date,
                latest_date: f.latest_date,
            })
            .collect();
        output.push_str(&render_table(&lines));
        output.push('\n');
        Ok(output)
    }

    /// What `confirm` would do right now
    pub fn format_preview(&self) -> LedgerResult<String> {
        let preview = ConfirmService::new(self.storage).preview()?;
        let mut output = heading("Confirm Preview", 60);
        output.push_str("1. delete confirmed entries whose entry id is staged\n");
        output.push_str("2. insert every staged entry with a new batch id\n");
        output.push_str("3. clear the staging table and archive uploaded files\n\n");
        output.push_str(&format!("Entries replaced: {:>8}\n", preview.to_replace));
        output.push_str(&format!("Entries inserted: {:>8}\n", preview.to_insert()));
        Ok(output)
    }
}
