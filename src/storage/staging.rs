//! Staging table repository
//!
//! Rows imported from statements wait in `temp_journal` until they are
//! validated and confirmed.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

use crate::error::LedgerResult;
use crate::models::StagedEntry;

/// Per-file summary of the staging table
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFileSummary {
    pub source_file: String,
    pub entry_count: i64,
    pub earliest_date: Option<NaiveDate>,
    pub latest_date: Option<NaiveDate>,
}

/// Repository over `temp_journal`
pub struct StagingRepository<'a> {
    conn: &'a Connection,
}

fn staged_from_row(row: &Row<'_>) -> rusqlite::Result<StagedEntry> {
    Ok(StagedEntry {
        date: row.get("date")?,
        set_id: row.get("set_id")?,
        entry_id: row.get("entry_id")?,
        subject_code: row.get("subject_code")?,
        amount: row.get("amount")?,
        remarks: row.get("remarks")?,
        subject: row.get("subject")?,
        source_file: row.get("source_file")?,
    })
}

impl<'a> StagingRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert entries in a single transaction
    pub fn insert_batch(&self, entries: &[StagedEntry]) -> LedgerResult<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO temp_journal
                    (date, set_id, entry_id, subject_code, amount, remarks, subject, year, month, source_file)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for entry in entries {
                stmt.execute(params![
                    entry.date,
                    entry.set_id,
                    entry.entry_id,
                    entry.subject_code,
                    entry.amount,
                    entry.remarks,
                    entry.subject,
                    entry.year(),
                    entry.month(),
                    entry.source_file,
                ])?;
            }
        }
        tx.commit()?;

        log::debug!("staged {} entries", entries.len());
        Ok(entries.len())
    }

    /// All staged entries ordered by date, set and entry
    pub fn list(&self) -> LedgerResult<Vec<StagedEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, set_id, entry_id, subject_code, amount, remarks, subject, source_file
             FROM temp_journal
             ORDER BY date, set_id, entry_id",
        )?;
        let rows = stmt.query_map([], staged_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn count(&self) -> LedgerResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM temp_journal", [], |row| row.get(0))?)
    }

    /// Number of staged rows that came from the given file
    pub fn count_by_source(&self, source_file: &str) -> LedgerResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM temp_journal WHERE source_file = ?1",
            params![source_file],
            |row| row.get(0),
        )?)
    }

    /// Delete every staged row, returning how many were removed
    pub fn clear(&self) -> LedgerResult<usize> {
        Ok(self.conn.execute("DELETE FROM temp_journal", [])?)
    }

    /// Staged rows grouped by source file
    pub fn source_files(&self) -> LedgerResult<Vec<SourceFileSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_file, COUNT(*), MIN(date), MAX(date)
             FROM temp_journal
             GROUP BY source_file
             ORDER BY source_file",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SourceFileSummary {
                source_file: row.get(0)?,
                entry_count: row.get(1)?,
                earliest_date: row.get(2)?,
                latest_date: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Entry ids staged that already exist in the journal
    pub fn overlapping_entry_ids(&self) -> LedgerResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.entry_id
             FROM temp_journal t
             JOIN journal_entries j ON t.entry_id = j.entry_id
             ORDER BY t.date, t.set_id, t.entry_id",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
