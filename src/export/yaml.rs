//! YAML Export functionality
//!
//! Same content as the JSON export, for reading by eye.

use std::io::Write;

use crate::error::{LedgerError, LedgerResult};
use crate::export::json::JournalExport;
use crate::models::YearMonth;
use crate::storage::Storage;

/// Export the journal to YAML
pub fn export_journal_yaml<W: Write>(
    storage: &Storage,
    period: Option<YearMonth>,
    writer: &mut W,
) -> LedgerResult<()> {
    let export = JournalExport::from_storage(storage, period)?;
    write_yaml(&export, writer)
}

fn write_yaml<W: Write>(export: &JournalExport, writer: &mut W) -> LedgerResult<()> {
    let export_err = |e: std::io::Error| LedgerError::Export(e.to_string());

    writeln!(writer, "# Household ledger journal export").map_err(export_err)?;
    writeln!(writer, "# Generated: {}", export.exported_at).map_err(export_err)?;
    writeln!(writer, "# App Version: {}", export.app_version).map_err(export_err)?;
    writeln!(writer, "# Amounts are in minor units (1/100).").map_err(export_err)?;
    writeln!(writer).map_err(export_err)?;

    serde_yaml::to_writer(writer, export).map_err(|e| LedgerError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JournalEntry, Money, SubjectCode};
    use chrono::NaiveDate;

    #[test]
    fn test_yaml_has_header_and_entries() {
        let export = JournalExport::from_entries(
            vec![JournalEntry {
                date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                set_id: "20240302_001".to_string(),
                entry_id: "20240302_001_000".to_string(),
                subject_code: SubjectCode::new(500),
                amount: Money::from_units(850),
                remarks: "shogo".to_string(),
                subject: None,
                year: 2024,
                month: 3,
                confirmed_at: None,
                batch_id: None,
            }],
            None,
        );

        let mut out = Vec::new();
        write_yaml(&export, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("# Household ledger journal export"));
        assert!(text.contains("20240302_001_000"));
        assert!(text.contains("amount: 85000"));
    }
}
