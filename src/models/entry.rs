//! Journal entry models
//!
//! A journal entry is one signed line of a transaction set. All lines of a
//! set share a `set_id` (`YYYYMMDD_nnn`) and each line has its own
//! `entry_id` (`<set_id>_nnn`). Staged entries live in the staging table
//! until `confirm` moves them into the journal.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::money::Money;
use super::subject::SubjectCode;

/// Remarks marker for opening balances; such sets are not balance-checked
pub const CARRY_OVER_MARKER: &str = "carry over";

/// Remarks of the entries reversing income and expense balances at month end
pub const CLOSE_REMARKS: &str = "close";

/// Remarks of the entry booking the month's net income to retained earnings
pub const LOSS_AND_BENEFIT_REMARKS: &str = "loss and benefit";

/// Whether a remarks text marks a carry-over (case-insensitive)
pub fn is_carry_over(remarks: &str) -> bool {
    remarks.to_lowercase().contains(CARRY_OVER_MARKER)
}

/// Whether a remarks text marks a month-end closing entry
pub fn is_closing(remarks: &str) -> bool {
    remarks == CLOSE_REMARKS || remarks == LOSS_AND_BENEFIT_REMARKS
}

/// Left-pad a set number with zeros to three characters
///
/// Spreadsheet round trips turn "7" into "7.0", so integral floats are
/// reduced to their integer form first.
pub fn pad_set_number(raw: &str) -> String {
    let raw = raw.trim();
    let normalized = match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && raw.contains('.') => {
            format!("{}", v as i64)
        }
        _ => raw.to_string(),
    };
    format!("{:0>3}", normalized)
}

/// Build a set id from the transaction date and a set number
pub fn make_set_id(date: NaiveDate, number: &str) -> String {
    format!("{}_{}", date.format("%Y%m%d"), pad_set_number(number))
}

/// Build an entry id from its set id and position within the set
pub fn make_entry_id(set_id: &str, index: usize) -> String {
    format!("{}_{:03}", set_id, index)
}

/// An entry waiting in the staging table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedEntry {
    pub date: NaiveDate,
    pub set_id: String,
    pub entry_id: String,
    pub subject_code: SubjectCode,
    pub amount: Money,
    pub remarks: String,
    /// Account name from the chart, if the code is known
    pub subject: Option<String>,
    /// File name of the statement the entry came from
    pub source_file: String,
}

impl StagedEntry {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }
}

/// A confirmed journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub date: NaiveDate,
    pub set_id: String,
    pub entry_id: String,
    pub subject_code: SubjectCode,
    pub amount: Money,
    pub remarks: String,
    pub subject: Option<String>,
    pub year: i32,
    pub month: u32,
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Identifies the `confirm` run (or closing) that wrote the entry
    pub batch_id: Option<String>,
}
