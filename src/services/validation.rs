//! Double-entry balance validation
//!
//! Entries are grouped into sets by (set id, date). A set is balanced when
//! the absolute sum of its signed amounts is within the configured
//! tolerance. Carry-over entries (opening balances) are not checked.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::error::LedgerResult;
use crate::models::entry::is_carry_over;
use crate::models::{JournalEntry, Money, StagedEntry};
use crate::storage::Storage;

/// Anything that belongs to a transaction set
pub trait SetMember {
    fn set_id(&self) -> &str;
    fn date(&self) -> NaiveDate;
    fn amount(&self) -> Money;
    fn remarks(&self) -> &str;
    /// Account name, or the code when the name is unknown
    fn subject_label(&self) -> String;
}

impl SetMember for StagedEntry {
    fn set_id(&self) -> &str {
        &self.set_id
    }
    fn date(&self) -> NaiveDate {
        self.date
    }
    fn amount(&self) -> Money {
        self.amount
    }
    fn remarks(&self) -> &str {
        &self.remarks
    }
    fn subject_label(&self) -> String {
        self.subject
            .clone()
            .unwrap_or_else(|| self.subject_code.to_string())
    }
}

impl SetMember for JournalEntry {
    fn set_id(&self) -> &str {
        &self.set_id
    }
    fn date(&self) -> NaiveDate {
        self.date
    }
    fn amount(&self) -> Money {
        self.amount
    }
    fn remarks(&self) -> &str {
        &self.remarks
    }
    fn subject_label(&self) -> String {
        self.subject
            .clone()
            .unwrap_or_else(|| self.subject_code.to_string())
    }
}

/// A set whose debits and credits do not cancel out
#[derive(Debug, Clone, PartialEq)]
pub struct UnbalancedSet {
    pub set_id: String,
    pub date: NaiveDate,
    pub entry_count: usize,
    pub balance: Money,
    /// Distinct remarks of the set
    pub remarks_list: Vec<String>,
    /// `subject:amount`, largest amount first
    pub entries: Vec<String>,
}

/// Outcome of a balance check
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: String,
    /// Number of sets examined (carry-over sets excluded)
    pub checked_sets: usize,
    pub unbalanced: Vec<UnbalancedSet>,
}

impl ValidationResult {
    pub fn balanced_sets(&self) -> usize {
        self.checked_sets - self.unbalanced.len()
    }
}

/// Check every set in `entries`
pub fn validate_sets<E: SetMember>(entries: &[E], tolerance: Money) -> ValidationResult {
    let mut sets: BTreeMap<(NaiveDate, &str), Vec<&E>> = BTreeMap::new();
    for entry in entries.iter().filter(|e| !is_carry_over(e.remarks())) {
        sets.entry((entry.date(), entry.set_id()))
            .or_default()
            .push(entry);
    }

    let checked_sets = sets.len();
    let unbalanced: Vec<UnbalancedSet> = sets
        .into_iter()
        .filter_map(|((date, set_id), members)| {
            let balance: Money = members.iter().map(|e| e.amount()).sum();
            if balance.abs() <= tolerance {
                return None;
            }

            let remarks_list: Vec<String> = members
                .iter()
                .map(|e| e.remarks().to_string())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            let mut sorted = members.clone();
            sorted.sort_by(|a, b| b.amount().cmp(&a.amount()));
            let entries = sorted
                .iter()
                .map(|e| format!("{}:{}", e.subject_label(), e.amount()))
                .collect();

            Some(UnbalancedSet {
                set_id: set_id.to_string(),
                date,
                entry_count: members.len(),
                balance,
                remarks_list,
                entries,
            })
        })
        .collect();

    let (valid, message) = if unbalanced.is_empty() {
        (true, "All sets balanced (carry over excluded)".to_string())
    } else {
        (
            false,
            format!(
                "{} unbalanced set(s) found (carry over excluded)",
                unbalanced.len()
            ),
        )
    };

    ValidationResult {
        valid,
        message,
        checked_sets,
        unbalanced,
    }
}

/// Balance checks against the database
pub struct ValidationService<'a> {
    storage: &'a Storage,
}

impl<'a> ValidationService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Check the staging table
    pub fn validate_staged(&self, tolerance: Money) -> LedgerResult<ValidationResult> {
        let entries = self.storage.staging().list()?;
        let result = validate_sets(&entries, tolerance);
        log::debug!(
            "staging validation: {} sets, {} unbalanced",
            result.checked_sets,
            result.unbalanced.len()
        );
        Ok(result)
    }

    /// Check the confirmed journal
    pub fn validate_confirmed(&self, tolerance: Money) -> LedgerResult<ValidationResult> {
        let entries = self.storage.journal().list(None)?;
        Ok(validate_sets(&entries, tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubjectCode;

    fn entry(set: &str, code: u32, cents: i64, remarks: &str) -> StagedEntry {
        StagedEntry {
            date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            set_id: set.to_string(),
            entry_id: format!("{}_{}", set, code),
            subject_code: SubjectCode::new(code),
            amount: Money::from_cents(cents),
            remarks: remarks.to_string(),
            subject: None,
            source_file: "test.csv".to_string(),
        }
    }

    #[test]
    fn test_balanced_sets_pass() {
        let entries = vec![
            entry("20240302_001", 500, -85000, "shogo"),
            entry("20240302_001", 530, 85000, "shogo"),
            entry("20240302_002", 101, -185000, "paypay"),
            entry("20240302_002", 500, 185000, "paypay"),
        ];

        let result = validate_sets(&entries, Money::from_cents(1));
        assert!(result.valid);
        assert_eq!(result.checked_sets, 2);
        assert_eq!(result.balanced_sets(), 2);
    }

    #[test]
    fn test_unbalanced_set_reported() {
        let entries = vec![
            entry("20240302_001", 500, 100000, "lunch"),
            entry("20240302_001", 101, -90000, "lunch"),
            entry("20240302_001", 102, -5000, "lunch tip"),
        ];

        let result = validate_sets(&entries, Money::from_cents(1));
        assert!(!result.valid);
        assert_eq!(result.unbalanced.len(), 1);

        let set = &result.unbalanced[0];
        assert_eq!(set.balance, Money::from_cents(5000));
        assert_eq!(set.entry_count, 3);
        assert_eq!(set.remarks_list, vec!["lunch", "lunch tip"]);
        assert_eq!(set.entries[0], "500:1000.00");
        assert_eq!(set.entries[2], "101:-900.00");
    }

    #[test]
    fn test_carry_over_excluded() {
        let entries = vec![
            entry("20240301_099", 101, -4488100, "carry over"),
            entry("20240301_099", 100, -2000000, "Carry over"),
        ];

        let result = validate_sets(&entries, Money::from_cents(1));
        assert!(result.valid);
        assert_eq!(result.checked_sets, 0);
    }

    #[test]
    fn test_tolerance_boundary() {
        let within = vec![entry("s", 500, 1, "a")];
        assert!(validate_sets(&within, Money::from_cents(1)).valid);

        let beyond = vec![entry("s", 500, 2, "a")];
        assert!(!validate_sets(&beyond, Money::from_cents(1)).valid);
    }
}
