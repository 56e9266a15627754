//! Confirmed journal repository
//!
//! Queries over `journal_entries` and the `trial_balance` view, plus the
//! writes used by confirmation and month-end closing.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};

use crate::error::LedgerResult;
use crate::models::entry::{CLOSE_REMARKS, LOSS_AND_BENEFIT_REMARKS};
use crate::models::{JournalEntry, Money, SubjectCode, YearMonth};

/// One row of the `trial_balance` view
#[derive(Debug, Clone, PartialEq)]
pub struct TrialBalanceRow {
    pub period: YearMonth,
    pub subject_code: SubjectCode,
    pub subject: Option<String>,
    pub debit_total: Money,
    pub credit_total: Money,
    pub balance: Money,
}

/// Rows affected by moving the staging table into the journal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfirmCounts {
    pub replaced: usize,
    pub inserted: usize,
}

/// Summary of one confirmed set
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedSet {
    pub date: NaiveDate,
    pub set_id: String,
    pub entry_count: i64,
    pub balance: Money,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Closing entries recorded for one month
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedMonth {
    pub period: YearMonth,
    pub close_entries: i64,
    pub total_amount: Money,
}

/// Repository over `journal_entries`
pub struct JournalRepository<'a> {
    conn: &'a Connection,
}

fn journal_from_row(row: &Row<'_>) -> rusqlite::Result<JournalEntry> {
    Ok(JournalEntry {
        date: row.get("date")?,
        set_id: row.get("set_id")?,
        entry_id: row.get("entry_id")?,
        subject_code: row.get("subject_code")?,
        amount: row.get("amount")?,
        remarks: row.get("remarks")?,
        subject: row.get("subject")?,
        year: row.get("year")?,
        month: row.get("month")?,
        confirmed_at: row.get("confirmed_at")?,
        batch_id: row.get("batch_id")?,
    })
}

fn period_from_row(row: &Row<'_>, year_idx: usize, month_idx: usize) -> rusqlite::Result<YearMonth> {
    Ok(YearMonth {
        year: row.get(year_idx)?,
        month: row.get(month_idx)?,
    })
}

const JOURNAL_COLUMNS: &str = "date, set_id, entry_id, subject_code, amount, remarks, subject, \
     year, month, confirmed_at, batch_id";

impl<'a> JournalRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// All confirmed entries, optionally limited to one month
    pub fn list(&self, period: Option<YearMonth>) -> LedgerResult<Vec<JournalEntry>> {
        let entries = match period {
            Some(ym) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {} FROM journal_entries
                     WHERE year = ?1 AND month = ?2
                     ORDER BY date, set_id, entry_id",
                    JOURNAL_COLUMNS
                ))?;
                let rows = stmt.query_map(params![ym.year, ym.month], journal_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {} FROM journal_entries ORDER BY date, set_id, entry_id",
                    JOURNAL_COLUMNS
                ))?;
                let rows = stmt.query_map([], journal_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(entries)
    }

    pub fn count(&self) -> LedgerResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM journal_entries", [], |row| row.get(0))?)
    }

    pub fn insert(&self, entry: &JournalEntry) -> LedgerResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO journal_entries ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                JOURNAL_COLUMNS
            ),
            params![
                entry.date,
                entry.set_id,
                entry.entry_id,
                entry.subject_code,
                entry.amount,
                entry.remarks,
                entry.subject,
                entry.year,
                entry.month,
                entry.confirmed_at,
                entry.batch_id,
            ],
        )?;
        Ok(())
    }

    /// Number of confirmed entries a confirm run would overwrite
    pub fn count_replaceable(&self) -> LedgerResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM journal_entries
             WHERE entry_id IN (SELECT entry_id FROM temp_journal)",
            [],
            |row| row.get(0),
        )?)
    }

    /// Replace confirmed entries sharing an id with staged ones, then copy
    /// every staged row into the journal.
    ///
    /// Runs inside the caller's transaction; the staging table is left as is.
    pub fn replace_from_staging(
        &self,
        batch_id: &str,
        confirmed_at: DateTime<Utc>,
    ) -> LedgerResult<ConfirmCounts> {
        let replaced = self.conn.execute(
            "DELETE FROM journal_entries WHERE entry_id IN (SELECT entry_id FROM temp_journal)",
            [],
        )?;
        let inserted = self.conn.execute(
            &format!(
                "INSERT INTO journal_entries ({})
                 SELECT date, set_id, entry_id, subject_code, amount, remarks, subject,
                        year, month, ?1, ?2
                 FROM temp_journal",
                JOURNAL_COLUMNS
            ),
            params![confirmed_at, batch_id],
        )?;
        Ok(ConfirmCounts { replaced, inserted })
    }

    /// Whether month-end `close` entries exist for the month
    pub fn has_closing_entries(&self, period: YearMonth) -> LedgerResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM journal_entries WHERE remarks = ?1 AND year = ?2 AND month = ?3",
            params![CLOSE_REMARKS, period.year, period.month],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Delete the month's `close` and `loss and benefit` entries
    pub fn delete_closing_entries(&self, period: YearMonth) -> LedgerResult<usize> {
        Ok(self.conn.execute(
            "DELETE FROM journal_entries
             WHERE remarks IN (?1, ?2) AND year = ?3 AND month = ?4",
            params![CLOSE_REMARKS, LOSS_AND_BENEFIT_REMARKS, period.year, period.month],
        )?)
    }

    /// Non-zero income and expense balances of a month, closing rows excluded
    pub fn profit_and_loss_balances(
        &self,
        period: YearMonth,
    ) -> LedgerResult<Vec<(SubjectCode, Money)>> {
        let mut stmt = self.conn.prepare(
            "SELECT subject_code, SUM(amount)
             FROM journal_entries
             WHERE subject_code >= 400 AND subject_code < 600
               AND year = ?1 AND month = ?2
               AND remarks NOT IN (?3, ?4)
             GROUP BY subject_code
             HAVING SUM(amount) != 0
             ORDER BY subject_code",
        )?;
        let rows = stmt.query_map(
            params![period.year, period.month, CLOSE_REMARKS, LOSS_AND_BENEFIT_REMARKS],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Months that carry `close` entries
    pub fn closed_months(&self) -> LedgerResult<Vec<ClosedMonth>> {
        let mut stmt = self.conn.prepare(
            "SELECT year, month, COUNT(*), SUM(amount)
             FROM journal_entries
             WHERE remarks = ?1
             GROUP BY year, month
             ORDER BY year, month",
        )?;
        let rows = stmt.query_map(params![CLOSE_REMARKS], |row| {
            Ok(ClosedMonth {
                period: period_from_row(row, 0, 1)?,
                close_entries: row.get(2)?,
                total_amount: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Months with income or expense activity but no `close` entries
    pub fn unclosed_months(&self) -> LedgerResult<Vec<YearMonth>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT year, month
             FROM journal_entries
             WHERE remarks != ?1
               AND subject_code BETWEEN 400 AND 599
               AND (year * 100 + month) NOT IN (
                   SELECT DISTINCT year * 100 + month FROM journal_entries WHERE remarks = ?1
               )
             ORDER BY year, month",
        )?;
        let rows = stmt.query_map(params![CLOSE_REMARKS], |row| period_from_row(row, 0, 1))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Rows of the `trial_balance` view, optionally for one month
    pub fn trial_balance(&self, period: Option<YearMonth>) -> LedgerResult<Vec<TrialBalanceRow>> {
        let map_row = |row: &Row<'_>| -> rusqlite::Result<TrialBalanceRow> {
            Ok(TrialBalanceRow {
                period: period_from_row(row, 0, 1)?,
                subject_code: row.get(2)?,
                subject: row.get(3)?,
                debit_total: row.get(4)?,
                credit_total: row.get(5)?,
                balance: row.get(6)?,
            })
        };

        let sql = "SELECT year, month, subject_code, subject, debit_total, credit_total, balance
                   FROM trial_balance";
        let rows = match period {
            Some(ym) => {
                let mut stmt = self.conn.prepare(&format!(
                    "{} WHERE year = ?1 AND month = ?2 ORDER BY subject_code",
                    sql
                ))?;
                let rows = stmt.query_map(params![ym.year, ym.month], map_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("{} ORDER BY year, month, subject_code", sql))?;
                let rows = stmt.query_map([], map_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    }

    /// Sets confirmed at or after `since`, most recent first
    pub fn confirmed_since(&self, since: DateTime<Utc>) -> LedgerResult<Vec<ConfirmedSet>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, set_id, COUNT(*), SUM(amount), MAX(confirmed_at)
             FROM journal_entries
             WHERE confirmed_at >= ?1
             GROUP BY date, set_id
             ORDER BY MAX(confirmed_at) DESC, date, set_id",
        )?;
        let rows = stmt.query_map(params![since], |row| {
            Ok(ConfirmedSet {
                date: row.get(0)?,
                set_id: row.get(1)?,
                entry_count: row.get(2)?,
                balance: row.get(3)?,
                confirmed_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Earliest and latest confirmed dates plus distinct set count
    pub fn span(&self) -> LedgerResult<(i64, Option<NaiveDate>, Option<NaiveDate>)> {
        Ok(self.conn.query_row(
            "SELECT COUNT(DISTINCT set_id), MIN(date), MAX(date) FROM journal_entries",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::init_tables;
    use chrono::Datelike;

    fn entry(date: (i32, u32, u32), set: &str, idx: u32, code: u32, cents: i64, remarks: &str) -> JournalEntry {
        let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        JournalEntry {
            date,
            set_id: set.to_string(),
            entry_id: format!("{}_{:03}", set, idx),
            subject_code: SubjectCode::new(code),
            amount: Money::from_cents(cents),
            remarks: remarks.to_string(),
            subject: None,
            year: date.year(),
            month: date.month(),
            confirmed_at: Some(Utc::now()),
            batch_id: Some("b1".to_string()),
        }
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_tables(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_list_by_month() {
        let conn = setup();
        let repo = JournalRepository::new(&conn);
        repo.insert(&entry((2024, 3, 2), "a", 0, 101, -1000, "food")).unwrap();
        repo.insert(&entry((2024, 3, 2), "a", 1, 500, 1000, "food")).unwrap();
        repo.insert(&entry((2024, 4, 2), "b", 0, 101, -10, "fee")).unwrap();

        let march = repo.list(Some(YearMonth::new(2024, 3).unwrap())).unwrap();
        assert_eq!(march.len(), 2);
        assert_eq!(march[0].batch_id.as_deref(), Some("b1"));
        assert!(march[0].confirmed_at.is_some());
        assert_eq!(repo.list(None).unwrap().len(), 3);
        assert_eq!(repo.count().unwrap(), 3);
    }

    #[test]
    fn test_profit_and_loss_balances_skip_zero_and_closing() {
        let conn = setup();
        let repo = JournalRepository::new(&conn);
        let ym = YearMonth::new(2024, 3).unwrap();

        repo.insert(&entry((2024, 3, 2), "a", 0, 500, 1000, "food")).unwrap();
        repo.insert(&entry((2024, 3, 3), "b", 0, 530, 200, "bus")).unwrap();
        repo.insert(&entry((2024, 3, 4), "c", 0, 530, -200, "refund")).unwrap();
        repo.insert(&entry((2024, 3, 31), "z", 0, 500, -1000, "close")).unwrap();

        let balances = repo.profit_and_loss_balances(ym).unwrap();
        assert_eq!(balances, vec![(SubjectCode::new(500), Money::from_cents(1000))]);
        assert!(repo.has_closing_entries(ym).unwrap());
        assert_eq!(repo.delete_closing_entries(ym).unwrap(), 1);
        assert!(!repo.has_closing_entries(ym).unwrap());
    }

    #[test]
    fn test_closing_status_queries() {
        let conn = setup();
        let repo = JournalRepository::new(&conn);
        repo.insert(&entry((2024, 3, 2), "a", 0, 500, 1000, "food")).unwrap();
        repo.insert(&entry((2024, 3, 31), "z", 0, 500, -1000, "close")).unwrap();
        repo.insert(&entry((2024, 4, 2), "b", 0, 500, 300, "food")).unwrap();

        let closed = repo.closed_months().unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].period, YearMonth::new(2024, 3).unwrap());
        assert_eq!(closed[0].close_entries, 1);

        assert_eq!(repo.unclosed_months().unwrap(), vec![YearMonth::new(2024, 4).unwrap()]);
    }
}
