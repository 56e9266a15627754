//! JSON Export functionality
//!
//! Exports the confirmed journal to JSON with a schema version and a small
//! metadata block. Amounts are written in minor units.

use std::collections::BTreeSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{JournalEntry, YearMonth};
use crate::storage::Storage;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Journal export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    /// Month filter applied, if any
    pub period: Option<YearMonth>,

    pub entries: Vec<JournalEntry>,

    pub metadata: ExportMetadata,
}

/// Export metadata for reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub entry_count: usize,
    pub set_count: usize,
    pub earliest_date: Option<String>,
    pub latest_date: Option<String>,
}

impl JournalExport {
    pub fn from_storage(storage: &Storage, period: Option<YearMonth>) -> LedgerResult<Self> {
        Ok(Self::from_entries(storage.journal().list(period)?, period))
    }

    pub fn from_entries(entries: Vec<JournalEntry>, period: Option<YearMonth>) -> Self {
        let sets: BTreeSet<(&chrono::NaiveDate, &str)> =
            entries.iter().map(|e| (&e.date, e.set_id.as_str())).collect();

        let metadata = ExportMetadata {
            entry_count: entries.len(),
            set_count: sets.len(),
            earliest_date: entries.iter().map(|e| e.date).min().map(|d| d.to_string()),
            latest_date: entries.iter().map(|e| e.date).max().map(|d| d.to_string()),
        };

        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            period,
            entries,
            metadata,
        }
    }
}

/// Export the journal to JSON
pub fn export_journal_json<W: Write>(
    storage: &Storage,
    period: Option<YearMonth>,
    writer: &mut W,
    pretty: bool,
) -> LedgerResult<()> {
    let export = JournalExport::from_storage(storage, period)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| LedgerError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, SubjectCode};
    use chrono::NaiveDate;

    fn journal(set: &str, idx: u32, day: u32) -> JournalEntry {
        JournalEntry {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            set_id: set.to_string(),
            entry_id: format!("{}_{:03}", set, idx),
            subject_code: SubjectCode::new(500),
            amount: Money::from_units(100),
            remarks: "lunch".to_string(),
            subject: Some("Food".to_string()),
            year: 2024,
            month: 3,
            confirmed_at: None,
            batch_id: None,
        }
    }

    #[test]
    fn test_metadata() {
        let export = JournalExport::from_entries(
            vec![journal("a", 0, 2), journal("a", 1, 2), journal("b", 0, 9)],
            None,
        );
        assert_eq!(export.metadata.entry_count, 3);
        assert_eq!(export.metadata.set_count, 2);
        assert_eq!(export.metadata.earliest_date.as_deref(), Some("2024-03-02"));
        assert_eq!(export.metadata.latest_date.as_deref(), Some("2024-03-09"));
    }

    #[test]
    fn test_json_shape() {
        let export = JournalExport::from_entries(vec![journal("a", 0, 2)], None);
        let value = serde_json::to_value(&export).unwrap();
        assert_eq!(value["schema_version"], EXPORT_SCHEMA_VERSION);
        assert_eq!(value["entries"][0]["amount"], 10000);
        assert_eq!(value["entries"][0]["subject_code"], 500);
    }
}
