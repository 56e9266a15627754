//! Bank and card statement import
//!
//! Statements are classified row by row (models, then override rules),
//! snapshotted for later training and staged as two-line transaction sets.

use std::collections::HashMap;
use std::path::Path;

use chrono::{NaiveDate, Utc};

use super::ingest::{header_index, keep_upload, parse_date, prepare_staging, source_file_name, StageOptions, StageReport};
use crate::audit::{AuditEntry, Operation};
use crate::classifier::text::combined_text;
use crate::classifier::training::write_snapshot;
use crate::classifier::{BankClassifier, Classification, RuleSet, TrainingRecord};
use crate::config::settings::Settings;
use crate::error::{LedgerError, LedgerResult};
use crate::models::entry::make_entry_id;
use crate::models::{Bank, ChartOfAccounts, Direction, Money, StagedEntry, SubjectCode};
use crate::storage::Storage;

/// Column layout of a statement export
#[derive(Debug, Clone, Copy)]
pub struct BankProfile {
    pub bank: Bank,
    date: &'static [&'static str],
    description: &'static [&'static str],
    memo: &'static [&'static str],
    outflow: &'static [&'static str],
    inflow: &'static [&'static str],
    /// Card statements only list spending
    fixed_direction: Option<Direction>,
}

impl BankProfile {
    pub fn for_bank(bank: Bank) -> Self {
        match bank {
            Bank::Ufj => Self {
                bank,
                date: &["取引日", "日付"],
                description: &["摘要"],
                memo: &["摘要内容"],
                outflow: &["支払い金額"],
                inflow: &["預かり金額"],
                fixed_direction: None,
            },
            Bank::Jcb => Self {
                bank,
                date: &["ご利用日", "日付"],
                description: &["ご利用先など", "利用先"],
                memo: &["備考"],
                outflow: &["ご利用金額（円）", "利用金額"],
                inflow: &[],
                fixed_direction: Some(Direction::Out),
            },
        }
    }
}

/// One statement line before classification
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRow {
    /// 1-based data row number in the file
    pub row: usize,
    pub date: NaiveDate,
    pub description: String,
    pub memo: String,
    pub direction: Direction,
    pub amount: Money,
}

/// A statement line with its final accounts
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRow {
    pub statement: StatementRow,
    pub combined_text: String,
    pub classification: Classification,
    pub rule_applied: bool,
}

impl ClassifiedRow {
    fn training_record(&self) -> TrainingRecord {
        TrainingRecord {
            date: self.statement.date.format("%Y-%m-%d").to_string(),
            description: self.statement.description.clone(),
            memo: self.statement.memo.clone(),
            combined_text: self.combined_text.clone(),
            direction: self.statement.direction.as_str().to_string(),
            suggested_debit: self.classification.debit.to_string(),
            suggested_credit: self.classification.credit.to_string(),
            remarks_classified: self.classification.remarks.clone(),
        }
    }
}

fn statement_amount(raw: &str) -> Option<Money> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Money::parse(raw).ok()
}

fn find_column(columns: &HashMap<String, usize>, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|name| columns.get(*name).copied())
}

/// Read statement rows; returns the rows and the number of rows dropped for a bad date
pub fn parse_statement(profile: &BankProfile, content: &str) -> LedgerResult<(Vec<StatementRow>, usize)> {
    let content = content.trim_start_matches('\u{feff}');
    if content.trim().is_empty() {
        return Ok((Vec::new(), 0));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let columns = header_index(reader.headers()?);

    let date_col = find_column(&columns, profile.date).ok_or_else(|| {
        LedgerError::Import(format!(
            "No date column in {} statement (expected one of {})",
            profile.bank,
            profile.date.join(", ")
        ))
    })?;
    let description_col = find_column(&columns, profile.description);
    let memo_col = find_column(&columns, profile.memo);
    let outflow_col = find_column(&columns, profile.outflow);
    let inflow_col = find_column(&columns, profile.inflow);

    let mut rows = Vec::new();
    let mut dropped = 0;
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let field = |col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .unwrap_or("")
                .trim()
                .to_string()
        };

        let raw_date = field(Some(date_col));
        let Some(date) = parse_date(&raw_date) else {
            log::warn!("{} row {}: unparseable date '{}', row dropped", profile.bank, idx + 1, raw_date);
            dropped += 1;
            continue;
        };

        let outflow = statement_amount(&field(outflow_col));
        let inflow = statement_amount(&field(inflow_col));

        let direction = profile.fixed_direction.unwrap_or_else(|| {
            if outflow.map_or(false, |m| m.is_positive()) {
                Direction::Out
            } else if inflow.map_or(false, |m| m.is_positive()) {
                Direction::In
            } else {
                Direction::Unknown
            }
        });

        rows.push(StatementRow {
            row: idx + 1,
            date,
            description: field(description_col),
            memo: field(memo_col),
            direction,
            amount: inflow.or(outflow).unwrap_or_default(),
        });
    }

    Ok((rows, dropped))
}

/// Predict accounts for each row, then let override rules have the last word
pub fn classify_rows(
    classifier: &BankClassifier,
    rules: &RuleSet,
    rows: Vec<StatementRow>,
) -> Vec<ClassifiedRow> {
    let bank = classifier.bank();
    rows.into_iter()
        .map(|statement| {
            let text = combined_text(
                &statement.description,
                &statement.memo,
                statement.direction.as_str(),
            );
            let mut classification = classifier.classify(&text, statement.direction);
            let rule_applied = rules.apply(bank, &text, statement.direction, &mut classification);
            ClassifiedRow {
                statement,
                combined_text: text,
                classification,
                rule_applied,
            }
        })
        .collect()
}

/// Short fingerprint of a statement file name
fn file_tag(source_file: &str) -> String {
    let digest = format!("{:x}", md5::compute(source_file.as_bytes()));
    digest[..8].to_string()
}

/// Set id of a statement row: bank, date, source file and row number
///
/// Re-importing the same file yields the same ids, so `confirm` replaces
/// its rows; rows of another file never share an id.
pub fn bank_set_id(bank: Bank, source_file: &str, date: NaiveDate, row: usize) -> String {
    format!(
        "{}{}_{}_{:04}",
        bank.as_str(),
        date.format("%Y%m%d"),
        file_tag(source_file),
        row
    )
}

/// Turn classified rows into debit/credit pairs; zero-amount rows produce nothing
pub fn to_double_entry(
    bank: Bank,
    rows: &[ClassifiedRow],
    chart: &ChartOfAccounts,
    source_file: &str,
) -> Vec<StagedEntry> {
    let line = |set_id: &str, index: usize, date: NaiveDate, code: SubjectCode, amount: Money, remarks: &str| StagedEntry {
        date,
        set_id: set_id.to_string(),
        entry_id: make_entry_id(set_id, index),
        subject_code: code,
        amount,
        remarks: remarks.to_string(),
        subject: chart.name(code).map(|s| s.to_string()),
        source_file: source_file.to_string(),
    };

    rows.iter()
        .filter(|r| !r.statement.amount.is_zero())
        .flat_map(|r| {
            let s = &r.statement;
            let c = &r.classification;
            let set_id = bank_set_id(bank, source_file, s.date, s.row);
            [
                line(&set_id, 0, s.date, c.debit, s.amount, &c.remarks),
                line(&set_id, 1, s.date, c.credit, -s.amount, &c.remarks),
            ]
        })
        .collect()
}

/// Stages bank and card statements
pub struct BankImportService<'a> {
    storage: &'a Storage,
    chart: &'a ChartOfAccounts,
    settings: &'a Settings,
}

impl<'a> BankImportService<'a> {
    pub fn new(storage: &'a Storage, chart: &'a ChartOfAccounts, settings: &'a Settings) -> Self {
        Self {
            storage,
            chart,
            settings,
        }
    }

    /// Classify and stage a statement file
    pub fn process(&self, bank: Bank, path: &Path, options: StageOptions) -> LedgerResult<StageReport> {
        let source_file = source_file_name(path)?;
        let mut report = prepare_staging(self.storage, &source_file, options)?;
        if report.skipped_duplicate {
            return Ok(report);
        }

        let bytes = std::fs::read(path)
            .map_err(|e| LedgerError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        let content = String::from_utf8(bytes)
            .map_err(|_| LedgerError::Import(format!("{} is not UTF-8 encoded", source_file)))?;

        let profile = BankProfile::for_bank(bank);
        let (rows, dropped) = parse_statement(&profile, &content)?;
        report.dropped_rows = dropped;
        if rows.is_empty() {
            log::warn!("{}: no statement rows", source_file);
            return Ok(report);
        }

        let paths = self.storage.paths();
        let classifier = BankClassifier::load(
            &paths.models_dir(),
            bank,
            self.settings.classifier.confidence_threshold,
        );
        if !classifier.has_models() {
            log::info!("no trained models for {}, using default accounts", bank);
        }
        let rules = RuleSet::load(&paths.rules_file())?;
        let classified = classify_rows(&classifier, &rules, rows);
        let overridden = classified.iter().filter(|r| r.rule_applied).count();
        log::info!(
            "classified {} rows ({} by override rules)",
            classified.len(),
            overridden
        );

        let records: Vec<TrainingRecord> = classified.iter().map(|r| r.training_record()).collect();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        report.training_snapshot = Some(write_snapshot(&paths.train_dir(), bank, &timestamp, &records)?);

        let entries = to_double_entry(bank, &classified, self.chart, &source_file);
        report.staged = self.storage.staging().insert_batch(&entries)?;
        keep_upload(self.storage, path, &source_file)?;
        self.storage.log_audit(
            &AuditEntry::new(Operation::Stage, &source_file, report.staged)
                .with_details(format!("{} statement, {} rows", bank, classified.len())),
        )?;

        log::info!("staged {} rows from {}", report.staged, source_file);
        Ok(report)
    }
}
