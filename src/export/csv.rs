//! CSV Export functionality
//!
//! Writes confirmed journal entries in the same column layout the `process`
//! command reads, plus the confirmation columns.

use std::io::Write;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{JournalEntry, YearMonth};
use crate::storage::Storage;

const HEADER: [&str; 10] = [
    "Date",
    "SetID",
    "EntryID",
    "SubjectCode",
    "Subject",
    "Amount",
    "Remarks",
    "YearMonth",
    "ConfirmedAt",
    "BatchID",
];

/// Export confirmed entries to CSV
pub fn export_journal_csv<W: Write>(
    storage: &Storage,
    period: Option<YearMonth>,
    writer: &mut W,
) -> LedgerResult<()> {
    write_entries(&storage.journal().list(period)?, writer)
}

fn write_entries<W: Write>(entries: &[JournalEntry], writer: &mut W) -> LedgerResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;

    for entry in entries {
        let period = YearMonth {
            year: entry.year,
            month: entry.month,
        };
        csv.write_record([
            entry.date.to_string(),
            entry.set_id.clone(),
            entry.entry_id.clone(),
            entry.subject_code.to_string(),
            entry.subject.clone().unwrap_or_default(),
            entry.amount.to_string(),
            entry.remarks.clone(),
            period.to_string(),
            entry
                .confirmed_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            entry.batch_id.clone().unwrap_or_default(),
        ])?;
    }

    csv.flush().map_err(|e| LedgerError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, SubjectCode};
    use chrono::NaiveDate;

    #[test]
    fn test_csv_rows() {
        let entries = vec![JournalEntry {
            date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            set_id: "20240302_002".to_string(),
            entry_id: "20240302_002_000".to_string(),
            subject_code: SubjectCode::new(101),
            amount: Money::from_units(-1850),
            remarks: "paypay, lunch".to_string(),
            subject: Some("UFJ Bank".to_string()),
            year: 2024,
            month: 3,
            confirmed_at: None,
            batch_id: Some("b1".to_string()),
        }];

        let mut out = Vec::new();
        write_entries(&entries, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Date,SetID,EntryID,SubjectCode,Subject,Amount,Remarks,YearMonth,ConfirmedAt,BatchID");
        assert_eq!(
            lines[1],
            "2024-03-02,20240302_002,20240302_002_000,101,UFJ Bank,-1850.00,\"paypay, lunch\",2024-03,,b1"
        );
    }
}
