//! Database schema
//!
//! Creates the staging table, the journal table and the reporting views.
//! Safe to run repeatedly; older journals get missing columns added.

use rusqlite::Connection;

use crate::error::LedgerResult;

const TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS temp_journal (
    date         TEXT    NOT NULL,
    set_id       TEXT    NOT NULL,
    entry_id     TEXT    NOT NULL,
    subject_code INTEGER NOT NULL,
    amount       INTEGER NOT NULL,
    remarks      TEXT    NOT NULL DEFAULT '',
    subject      TEXT,
    year         INTEGER NOT NULL,
    month        INTEGER NOT NULL,
    source_file  TEXT    NOT NULL,
    created_at   TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS journal_entries (
    date         TEXT    NOT NULL,
    set_id       TEXT    NOT NULL,
    entry_id     TEXT    PRIMARY KEY,
    subject_code INTEGER NOT NULL,
    amount       INTEGER NOT NULL,
    remarks      TEXT    NOT NULL DEFAULT '',
    subject      TEXT,
    year         INTEGER NOT NULL,
    month        INTEGER NOT NULL
);
"#;

const VIEWS: &str = r#"
DROP VIEW IF EXISTS account_balances;
CREATE VIEW account_balances AS
SELECT
    subject_code,
    subject,
    SUM(amount) AS balance,
    year,
    month
FROM journal_entries
GROUP BY subject_code, subject, year, month
ORDER BY year, month, subject_code;

DROP VIEW IF EXISTS transaction_sets;
CREATE VIEW transaction_sets AS
SELECT
    date,
    set_id,
    remarks,
    COUNT(*) AS entry_count,
    SUM(amount) AS balance_check,
    group_concat(
        COALESCE(subject, subject_code) || ':' || printf('%.2f', amount / 100.0), ', '
        ORDER BY amount DESC
    ) AS entries
FROM journal_entries
GROUP BY date, set_id, remarks
ORDER BY date, set_id;

DROP VIEW IF EXISTS trial_balance;
CREATE VIEW trial_balance AS
WITH monthly_balances AS (
    SELECT
        year,
        month,
        subject_code,
        subject,
        SUM(CASE WHEN amount > 0 THEN amount ELSE 0 END) AS debit_total,
        SUM(CASE WHEN amount < 0 THEN -amount ELSE 0 END) AS credit_total,
        SUM(amount) AS monthly_balance
    FROM journal_entries
    WHERE remarks NOT IN ('close', 'loss and benefit')
    GROUP BY year, month, subject_code, subject
)
SELECT
    m.year,
    m.month,
    m.subject_code,
    m.subject,
    m.debit_total,
    m.credit_total,
    CASE
        WHEN m.subject_code < 400 THEN
            SUM(m.monthly_balance) OVER (PARTITION BY m.subject_code ORDER BY m.year, m.month)
        ELSE
            m.monthly_balance
    END AS balance
FROM monthly_balances m
ORDER BY m.year, m.month, m.subject_code;
"#;

/// Create tables and views
pub fn init_tables(conn: &Connection) -> LedgerResult<()> {
    conn.execute_batch(TABLES)?;
    add_column_if_missing(conn, "journal_entries", "confirmed_at", "TEXT")?;
    add_column_if_missing(conn, "journal_entries", "batch_id", "TEXT")?;
    conn.execute_batch(VIEWS)?;
    log::info!("database tables and views are in place");
    Ok(())
}

/// Whether both ledger tables exist
pub fn tables_exist(conn: &Connection) -> LedgerResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('temp_journal', 'journal_entries')",
        [],
        |row| row.get(0),
    )?;
    Ok(count == 2)
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> LedgerResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    sql_type: &str,
) -> LedgerResult<()> {
    if column_exists(conn, table, column)? {
        log::debug!("{}.{} already present", table, column);
        return Ok(());
    }
    conn.execute_batch(&format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        table, column, sql_type
    ))?;
    log::info!("added column {}.{}", table, column);
    Ok(())
}
