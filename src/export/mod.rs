//! Export module for the household ledger
//!
//! Exports the confirmed journal in three formats:
//! - CSV: spreadsheet-compatible, one row per entry
//! - JSON: machine-readable with schema version and metadata
//! - YAML: the JSON content in a human-readable form

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::export_journal_csv;
pub use json::{export_journal_json, JournalExport, EXPORT_SCHEMA_VERSION};
pub use yaml::export_journal_yaml;

use std::io::Write;

use crate::error::LedgerResult;
use crate::models::YearMonth;
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Yaml,
}

/// Write the journal (optionally one month) in the given format
pub fn export_journal<W: Write>(
    storage: &Storage,
    format: ExportFormat,
    period: Option<YearMonth>,
    writer: &mut W,
) -> LedgerResult<()> {
    match format {
        ExportFormat::Csv => export_journal_csv(storage, period, writer),
        ExportFormat::Json => export_journal_json(storage, period, writer, true),
        ExportFormat::Yaml => export_journal_yaml(storage, period, writer),
    }
}
