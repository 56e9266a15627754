//! Journal CSV ingestion
//!
//! Stages hand-written journal files with the columns `Date`, `SubjectCode`,
//! `Amount`, `Remarks` and optionally `ID` (ignored) and `SetID`. Rows are
//! grouped into sets by date and set number; each row gets an entry id from
//! its position within the set.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::audit::{AuditEntry, Operation};
use crate::error::{LedgerError, LedgerResult};
use crate::models::entry::{make_entry_id, make_set_id};
use crate::models::{ChartOfAccounts, Money, StagedEntry, SubjectCode};
use crate::storage::Storage;

/// Duplicate and clearing behaviour of a staging run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageOptions {
    /// Empty the staging table before staging
    pub clear_staging: bool,
    /// Warn (and, without clearing, skip) when the file is already staged
    pub check_duplicates: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            clear_staging: true,
            check_duplicates: true,
        }
    }
}

/// What a staging run did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageReport {
    pub source_file: String,
    /// Rows written to the staging table
    pub staged: usize,
    /// Rows removed from the staging table beforehand
    pub cleared: usize,
    /// Rows of this file already staged when the run started
    pub already_staged: i64,
    /// The file was already staged and the run did nothing
    pub skipped_duplicate: bool,
    /// Rows dropped because their date or account could not be read
    pub dropped_rows: usize,
    /// Classifier training snapshot written by bank imports
    pub training_snapshot: Option<PathBuf>,
}

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日", "%m/%d/%Y", "%d-%m-%Y",
];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse `YYYYMMDD`, `YYYY-MM-DD` and the other common statement date forms
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
        return NaiveDate::parse_from_str(s, "%Y%m%d").ok();
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
                .map(|dt| dt.date())
        })
}

/// Trailing digits of a remarks text, used as set number when the file has no `SetID`
fn trailing_number(remarks: &str) -> Option<&str> {
    let trimmed = remarks.trim_end();
    let start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(idx, _)| idx)?;
    Some(&trimmed[start..])
}

/// Header lookup tolerant of a UTF-8 BOM and surrounding spaces
pub(crate) fn header_index(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, h)| (h.trim_start_matches('\u{feff}').trim().to_string(), idx))
        .collect()
}

pub(crate) fn source_file_name(path: &Path) -> LedgerResult<String> {
    if !path.exists() {
        return Err(LedgerError::file_not_found(path.display().to_string()));
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .ok_or_else(|| LedgerError::Import(format!("Invalid file name: {}", path.display())))
}

/// Duplicate check and staging-table clearing shared by every import
///
/// The returned report has `skipped_duplicate` set when the file is already
/// staged and must not be staged again.
pub(crate) fn prepare_staging(
    storage: &Storage,
    source_file: &str,
    options: StageOptions,
) -> LedgerResult<StageReport> {
    let mut report = StageReport {
        source_file: source_file.to_string(),
        ..StageReport::default()
    };

    if options.check_duplicates {
        report.already_staged = storage.staging().count_by_source(source_file)?;
        if report.already_staged > 0 {
            log::warn!(
                "'{}' is already staged ({} rows)",
                source_file,
                report.already_staged
            );
            if !options.clear_staging {
                report.skipped_duplicate = true;
                return Ok(report);
            }
        }
    }

    if options.clear_staging {
        report.cleared = storage.staging().clear()?;
        if report.cleared > 0 {
            log::info!("cleared {} staged rows", report.cleared);
            storage.log_audit(&AuditEntry::new(Operation::Clear, "temp_journal", report.cleared))?;
        }
    }

    Ok(report)
}

/// Copy the statement into `data/uploads/` so confirmation can archive it
pub(crate) fn keep_upload(storage: &Storage, path: &Path, source_file: &str) -> LedgerResult<()> {
    let uploads = storage.paths().uploads_dir();
    let target = uploads.join(source_file);
    let already_there = path
        .canonicalize()
        .ok()
        .zip(target.canonicalize().ok())
        .map(|(a, b)| a == b)
        .unwrap_or(false);
    if already_there {
        return Ok(());
    }

    std::fs::copy(path, &target)
        .map_err(|e| LedgerError::Io(format!("Failed to copy {} to uploads: {}", source_file, e)))?;
    log::debug!("copied {} to {}", source_file, uploads.display());
    Ok(())
}

/// Stages journal CSV files
pub struct IngestService<'a> {
    storage: &'a Storage,
    chart: &'a ChartOfAccounts,
}

impl<'a> IngestService<'a> {
    pub fn new(storage: &'a Storage, chart: &'a ChartOfAccounts) -> Self {
        Self { storage, chart }
    }

    /// Stage a journal CSV file
    pub fn process(&self, path: &Path, options: StageOptions) -> LedgerResult<StageReport> {
        let source_file = source_file_name(path)?;
        let mut report = prepare_staging(self.storage, &source_file, options)?;
        if report.skipped_duplicate {
            return Ok(report);
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| LedgerError::Csv(format!("Failed to open {}: {}", path.display(), e)))?;
        let (entries, dropped) = self.parse_reader(&mut reader, &source_file)?;
        report.dropped_rows = dropped;

        report.staged = self.storage.staging().insert_batch(&entries)?;
        keep_upload(self.storage, path, &source_file)?;
        self.storage
            .log_audit(&AuditEntry::new(Operation::Stage, &source_file, report.staged))?;

        log::info!("staged {} rows from {}", report.staged, source_file);
        Ok(report)
    }

    /// Turn CSV records into staged entries; returns the entries and the number of dropped rows
    pub fn parse_reader<R: std::io::Read>(
        &self,
        reader: &mut csv::Reader<R>,
        source_file: &str,
    ) -> LedgerResult<(Vec<StagedEntry>, usize)> {
        let columns = header_index(reader.headers()?);
        let column = |name: &str| -> LedgerResult<usize> {
            columns
                .get(name)
                .copied()
                .ok_or_else(|| LedgerError::Import(format!("Missing column '{}' in {}", name, source_file)))
        };
        let date_col = column("Date")?;
        let code_col = column("SubjectCode")?;
        let amount_col = column("Amount")?;
        let remarks_col = column("Remarks")?;
        let set_col = columns.get("SetID").copied();

        let mut entries = Vec::new();
        let mut dropped = 0;
        let mut set_positions: HashMap<String, usize> = HashMap::new();

        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            let line = idx + 2;
            let field = |col: usize| record.get(col).unwrap_or("").trim();

            let Some(date) = parse_date(field(date_col)) else {
                log::warn!("{} line {}: unparseable date '{}', row dropped", source_file, line, field(date_col));
                dropped += 1;
                continue;
            };
            let Some(subject_code) = SubjectCode::parse(field(code_col)) else {
                log::warn!("{} line {}: invalid subject code '{}', row dropped", source_file, line, field(code_col));
                dropped += 1;
                continue;
            };

            let amount = Money::parse_lenient(field(amount_col));
            let raw_remarks = field(remarks_col);

            let set_number = match set_col {
                Some(col) => field(col).to_string(),
                None => trailing_number(raw_remarks).unwrap_or("000").to_string(),
            };
            let set_id = make_set_id(date, &set_number);

            let position = set_positions.entry(set_id.clone()).or_insert(0);
            let entry_id = make_entry_id(&set_id, *position);
            *position += 1;

            entries.push(StagedEntry {
                date,
                set_id,
                entry_id,
                subject_code,
                amount,
                remarks: raw_remarks.to_lowercase(),
                subject: self.chart.name(subject_code).map(|s| s.to_string()),
                source_file: source_file.to_string(),
            });
        }

        if dropped > 0 {
            log::warn!("{}: {} rows dropped", source_file, dropped);
        }
        Ok((entries, dropped))
    }
}
