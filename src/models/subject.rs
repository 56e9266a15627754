//! Subject codes and the chart of accounts
//!
//! A subject code is a three-digit account number whose hundreds digit
//! determines the account class (1xx assets, 2xx liabilities, 3xx equity,
//! 4xx income, 5xx expenses).

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Three-digit account number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectCode(u32);

impl SubjectCode {
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Parse "598", "598.0" or " 101 " (spreadsheet exports turn codes into floats)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u32>() {
            return Some(Self(code));
        }
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
            .map(|v| Self(v as u32))
    }

    pub fn class(&self) -> AccountClass {
        AccountClass::of(*self)
    }

    /// Income and expense accounts, zeroed by the month-end close
    pub fn is_profit_and_loss(&self) -> bool {
        (400..600).contains(&self.0)
    }

    /// Balance-sheet accounts carry their balance across months
    pub fn is_balance_sheet(&self) -> bool {
        self.0 < 400
    }
}

impl fmt::Display for SubjectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{:03}", self.0))
    }
}

impl ToSql for SubjectCode {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(self.0)))
    }
}

impl FromSql for SubjectCode {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(|v| SubjectCode(v as u32))
    }
}

/// Account class derived from the code range
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountClass {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
    Other,
}

impl AccountClass {
    pub fn of(code: SubjectCode) -> Self {
        match code.value() {
            100..=199 => Self::Asset,
            200..=299 => Self::Liability,
            300..=399 => Self::Equity,
            400..=499 => Self::Income,
            500..=599 => Self::Expense,
            _ => Self::Other,
        }
    }

    /// Classes in reporting order
    pub fn all() -> [AccountClass; 6] {
        [
            Self::Asset,
            Self::Liability,
            Self::Equity,
            Self::Income,
            Self::Expense,
            Self::Other,
        ]
    }
}

impl fmt::Display for AccountClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Asset => "Assets",
            Self::Liability => "Liabilities",
            Self::Equity => "Equity",
            Self::Income => "Income",
            Self::Expense => "Expenses",
            Self::Other => "Other",
        };
        f.pad(name)
    }
}

/// On-disk shape of one chart entry: `"Food": { "id": 500 }`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CodeRecord {
    id: u32,
}

/// Mapping from subject code to account name
#[derive(Debug, Clone, Default)]
pub struct ChartOfAccounts {
    names: BTreeMap<SubjectCode, String>,
}

impl ChartOfAccounts {
    /// Load `codes.json`
    pub fn load(path: &Path) -> LedgerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    /// Load `codes.json`, or the default chart when it does not exist yet
    pub fn load_or_default(path: &Path) -> LedgerResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("{} not found, using the default chart", path.display());
            Ok(Self::default_chart())
        }
    }

    pub fn from_json(json: &str) -> LedgerResult<Self> {
        let records: BTreeMap<String, CodeRecord> = serde_json::from_str(json)
            .map_err(|e| LedgerError::Config(format!("Invalid chart of accounts: {}", e)))?;

        let names = records
            .into_iter()
            .map(|(name, record)| (SubjectCode::new(record.id), name))
            .collect();

        Ok(Self { names })
    }

    pub fn to_json(&self) -> LedgerResult<String> {
        let records: BTreeMap<&str, CodeRecord> = self
            .names
            .iter()
            .map(|(code, name)| (name.as_str(), CodeRecord { id: code.value() }))
            .collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    pub fn save(&self, path: &Path) -> LedgerResult<()> {
        std::fs::write(path, self.to_json()?).map_err(|e| {
            LedgerError::Io(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        Self {
            names: pairs
                .into_iter()
                .map(|(code, name)| (SubjectCode::new(code), name.into()))
                .collect(),
        }
    }

    /// A household chart covering the codes the importers and reports use
    pub fn default_chart() -> Self {
        Self::from_pairs([
            (100, "Cash"),
            (101, "UFJ Bank"),
            (102, "Savings Bank"),
            (109, "Electronic Money"),
            (111, "Securities"),
            (130, "Receivables"),
            (200, "Credit Card"),
            (201, "JCB Card"),
            (220, "Loans Payable"),
            (280, "Accrued Expenses"),
            (290, "Other Liabilities"),
            (300, "Retained Earnings"),
            (400, "Salary"),
            (490, "Other Income"),
            (500, "Food"),
            (501, "Dining Out"),
            (511, "Daily Necessities"),
            (513, "Clothing"),
            (521, "Housing"),
            (530, "Utilities"),
            (531, "Telecommunications"),
            (532, "Transportation"),
            (541, "Medical"),
            (542, "Insurance"),
            (550, "Education"),
            (552, "Hobbies"),
            (561, "Social Expenses"),
            (572, "Taxes"),
            (580, "Special Expenses"),
            (581, "Travel"),
            (590, "Fees"),
            (598, "Miscellaneous"),
            (599, "Unclassified"),
            (600, "Extraordinary Loss"),
        ])
    }

    pub fn name(&self, code: SubjectCode) -> Option<&str> {
        self.names.get(&code).map(String::as_str)
    }

    /// Name for display, "Unknown" for codes outside the chart
    pub fn name_or_unknown(&self, code: SubjectCode) -> String {
        self.name(code).unwrap_or("Unknown").to_string()
    }

    pub fn contains(&self, code: SubjectCode) -> bool {
        self.names.contains_key(&code)
    }

    /// All codes in ascending order
    pub fn codes(&self) -> impl Iterator<Item = SubjectCode> + '_ {
        self.names.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_codes() {
        assert_eq!(SubjectCode::parse("598"), Some(SubjectCode::new(598)));
        assert_eq!(SubjectCode::parse("101.0"), Some(SubjectCode::new(101)));
        assert_eq!(SubjectCode::parse(" 200 "), Some(SubjectCode::new(200)));
        assert_eq!(SubjectCode::parse("10.5"), None);
        assert_eq!(SubjectCode::parse("abc"), None);
    }

    #[test]
    fn test_display_pads() {
        assert_eq!(SubjectCode::new(598).to_string(), "598");
        assert_eq!(SubjectCode::new(7).to_string(), "007");
    }

    #[test]
    fn test_account_class_ranges() {
        assert_eq!(SubjectCode::new(101).class(), AccountClass::Asset);
        assert_eq!(SubjectCode::new(201).class(), AccountClass::Liability);
        assert_eq!(SubjectCode::new(300).class(), AccountClass::Equity);
        assert_eq!(SubjectCode::new(490).class(), AccountClass::Income);
        assert_eq!(SubjectCode::new(598).class(), AccountClass::Expense);
        assert_eq!(SubjectCode::new(600).class(), AccountClass::Other);
        assert!(SubjectCode::new(400).is_profit_and_loss());
        assert!(!SubjectCode::new(600).is_profit_and_loss());
        assert!(SubjectCode::new(399).is_balance_sheet());
    }

    #[test]
    fn test_chart_json_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("codes.json");

        let chart = ChartOfAccounts::from_pairs([(100, "Cash"), (500, "Food")]);
        chart.save(&path).unwrap();

        let loaded = ChartOfAccounts::load(&path).unwrap();
        assert_eq!(loaded.name(SubjectCode::new(500)), Some("Food"));
        assert_eq!(loaded.name_or_unknown(SubjectCode::new(999)), "Unknown");
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_chart_reads_named_records() {
        let chart = ChartOfAccounts::from_json(r#"{"Cash": {"id": 100}, "Food": {"id": 500}}"#)
            .unwrap();
        assert_eq!(chart.name(SubjectCode::new(100)), Some("Cash"));
        assert!(chart.contains(SubjectCode::new(500)));
    }

    #[test]
    fn test_default_chart_covers_importer_defaults() {
        let chart = ChartOfAccounts::default_chart();
        for code in [101, 201, 300, 490, 598] {
            assert!(chart.contains(SubjectCode::new(code)), "missing {}", code);
        }
    }
}
