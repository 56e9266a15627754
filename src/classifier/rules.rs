//! Keyword override rules
//!
//! `override_rules.csv` lets the user pin the classification of recurring
//! transactions. Columns: `target_bank` (`ufj`, `jcb` or `all`), `keyword`,
//! `direction` (`in` or `out`) and the optional `new_debit_code`,
//! `new_credit_code` and `new_remarks`. The first rule whose normalised
//! keyword appears in a row's combined text, with a matching direction, wins.

use std::path::Path;

use serde::Deserialize;

use super::text;
use super::Classification;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Bank, Direction, SubjectCode};

const REQUIRED_COLUMNS: [&str; 3] = ["target_bank", "keyword", "direction"];

/// Which statements a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget {
    All,
    Bank(Bank),
}

impl RuleTarget {
    fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "all" => Some(RuleTarget::All),
            "ufj" => Some(RuleTarget::Bank(Bank::Ufj)),
            "jcb" => Some(RuleTarget::Bank(Bank::Jcb)),
            _ => None,
        }
    }

    fn applies_to(&self, bank: Bank) -> bool {
        match self {
            RuleTarget::All => true,
            RuleTarget::Bank(b) => *b == bank,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRule {
    #[serde(default)]
    target_bank: String,
    #[serde(default)]
    keyword: String,
    #[serde(default)]
    direction: String,
    #[serde(default)]
    new_debit_code: Option<String>,
    #[serde(default)]
    new_credit_code: Option<String>,
    #[serde(default)]
    new_remarks: Option<String>,
}

/// A validated override rule
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideRule {
    pub target: RuleTarget,
    pub keyword: String,
    normalized_keyword: String,
    pub direction: Direction,
    pub new_debit_code: Option<String>,
    pub new_credit_code: Option<String>,
    pub new_remarks: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl OverrideRule {
    pub fn new(target: RuleTarget, keyword: &str, direction: Direction) -> Self {
        Self {
            target,
            keyword: keyword.to_string(),
            normalized_keyword: text::normalize(keyword),
            direction,
            new_debit_code: None,
            new_credit_code: None,
            new_remarks: None,
        }
    }

    fn matches(&self, bank: Bank, combined_text: &str, direction: Direction) -> bool {
        self.target.applies_to(bank)
            && self.direction == direction
            && !self.normalized_keyword.is_empty()
            && combined_text.contains(&self.normalized_keyword)
    }

    /// Overwrite the classification with this rule's values
    fn apply(&self, bank: Bank, direction: Direction, classification: &mut Classification) {
        match self.new_debit_code.as_deref() {
            Some(raw) => match SubjectCode::parse(raw) {
                Some(code) => classification.debit = code,
                None => log::warn!("ignoring invalid debit code '{}' in rule '{}'", raw, self.keyword),
            },
            None if direction == Direction::In && bank == Bank::Ufj => {
                classification.debit = bank.own_account();
            }
            None => {}
        }

        match self.new_credit_code.as_deref() {
            Some(raw) => match SubjectCode::parse(raw) {
                Some(code) => classification.credit = code,
                None => log::warn!("ignoring invalid credit code '{}' in rule '{}'", raw, self.keyword),
            },
            None if direction == Direction::Out => {
                classification.credit = bank.own_account();
            }
            None => {}
        }

        if let Some(remarks) = &self.new_remarks {
            classification.remarks = remarks.clone();
        }
    }
}

/// The loaded rule file
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<OverrideRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<OverrideRule>) -> Self {
        Self { rules }
    }

    /// Load rules from a CSV file; a missing file means no rules
    pub fn load(path: &Path) -> LedgerResult<Self> {
        if !path.exists() {
            log::info!("no override rules at {}", path.display());
            return Ok(Self::default());
        }

        log::info!("loading override rules from {}", path.display());
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| LedgerError::Csv(format!("Failed to open {}: {}", path.display(), e)))?;
        Self::from_reader(&mut reader)
    }

    /// Parse and validate rules from a CSV reader
    pub fn from_reader<R: std::io::Read>(reader: &mut csv::Reader<R>) -> LedgerResult<Self> {
        let headers = reader.headers()?.clone();
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .collect();
        if !missing.is_empty() {
            log::error!("override rules are missing required columns: {:?}", missing);
            return Ok(Self::default());
        }

        let mut rules = Vec::new();
        for (idx, record) in reader.deserialize::<RawRule>().enumerate() {
            let raw = record?;
            let line = idx + 2;

            let Some(target) = RuleTarget::parse(&raw.target_bank) else {
                log::warn!("rule on line {}: invalid target_bank '{}'", line, raw.target_bank);
                continue;
            };
            let Some(direction) = Direction::parse_rule(&raw.direction) else {
                log::warn!("rule on line {}: invalid direction '{}'", line, raw.direction);
                continue;
            };
            if raw.keyword.trim().is_empty() {
                log::warn!("rule on line {}: empty keyword, ignored", line);
                continue;
            }

            let mut rule = OverrideRule::new(target, &raw.keyword, direction);
            rule.new_debit_code = non_empty(raw.new_debit_code);
            rule.new_credit_code = non_empty(raw.new_credit_code);
            rule.new_remarks = non_empty(raw.new_remarks);
            rules.push(rule);
        }

        log::info!("loaded {} override rules", rules.len());
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule matching the row
    pub fn find(&self, bank: Bank, combined_text: &str, direction: Direction) -> Option<&OverrideRule> {
        self.rules
            .iter()
            .find(|rule| rule.matches(bank, combined_text, direction))
    }

    /// Apply the first matching rule; returns whether one matched
    pub fn apply(
        &self,
        bank: Bank,
        combined_text: &str,
        direction: Direction,
        classification: &mut Classification,
    ) -> bool {
        match self.find(bank, combined_text, direction) {
            Some(rule) => {
                log::debug!("rule '{}' matched '{}'", rule.keyword, combined_text);
                rule.apply(bank, direction, classification);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_from(csv_text: &str) -> RuleSet {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(csv_text.as_bytes());
        RuleSet::from_reader(&mut reader).unwrap()
    }

    fn default_out() -> Classification {
        Classification {
            debit: SubjectCode::new(598),
            credit: SubjectCode::new(101),
            remarks: "Auto classified".into(),
        }
    }

    #[test]
    fn test_invalid_rows_dropped() {
        let rules = rules_from(
            "target_bank,keyword,direction,new_debit_code,new_credit_code,new_remarks\n\
             ufj,ＡＭＡＺＯＮ,out,530,,amazon\n\
             mizuho,rent,out,540,,rent\n\
             all,rent,sideways,540,,rent\n\
             all,,out,540,,empty\n\
             all,salary,in,,400,salary\n",
        );
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_missing_required_column_gives_no_rules() {
        let rules = rules_from("target_bank,keyword\nufj,amazon\n");
        assert!(rules.is_empty());
    }

    #[test]
    fn test_first_match_wins_and_fallback_credit() {
        let rules = rules_from(
            "target_bank,keyword,direction,new_debit_code,new_credit_code,new_remarks\n\
             ufj,amazon,out,530.0,,amazon\n\
             all,amazon,out,599,,other\n",
        );

        let mut c = Classification {
            credit: SubjectCode::new(999),
            ..default_out()
        };
        assert!(rules.apply(Bank::Ufj, "amazon co jp out", Direction::Out, &mut c));
        assert_eq!(c.debit, SubjectCode::new(530));
        assert_eq!(c.credit, SubjectCode::new(101));
        assert_eq!(c.remarks, "amazon");

        let mut jcb = default_out();
        assert!(rules.apply(Bank::Jcb, "amazon out", Direction::Out, &mut jcb));
        assert_eq!(jcb.debit, SubjectCode::new(599));
        assert_eq!(jcb.credit, SubjectCode::new(201));
    }

    #[test]
    fn test_direction_must_match() {
        let rules = rules_from(
            "target_bank,keyword,direction,new_debit_code,new_credit_code,new_remarks\n\
             all,acme,in,,400,salary\n",
        );

        let mut out = default_out();
        assert!(!rules.apply(Bank::Ufj, "acme out", Direction::Out, &mut out));
        assert_eq!(out, default_out());

        let mut income = Classification {
            debit: SubjectCode::new(598),
            credit: SubjectCode::new(490),
            remarks: "Auto classified".into(),
        };
        assert!(rules.apply(Bank::Ufj, "acme in", Direction::In, &mut income));
        assert_eq!(income.debit, SubjectCode::new(101));
        assert_eq!(income.credit, SubjectCode::new(400));
        assert_eq!(income.remarks, "salary");
    }
}
