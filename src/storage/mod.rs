//! Storage layer for the household ledger
//!
//! A single SQLite database holds the staging table, the confirmed journal
//! and the reporting views. Repositories borrow the connection; services
//! that need several writes to succeed together open a transaction on it.

pub mod journal;
pub mod schema;
pub mod staging;

pub use journal::{ClosedMonth, ConfirmCounts, ConfirmedSet, JournalRepository, TrialBalanceRow};
pub use staging::{SourceFileSummary, StagingRepository};

use rusqlite::Connection;

use crate::audit::{AuditEntry, AuditLogger};
use crate::config::paths::LedgerPaths;
use crate::error::LedgerResult;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: LedgerPaths,
    conn: Connection,
    audit: AuditLogger,
}

impl Storage {
    /// Open (creating if needed) the database and make sure the schema exists
    pub fn new(paths: LedgerPaths) -> LedgerResult<Self> {
        paths.ensure_directories()?;

        let db_file = paths.database_file();
        log::debug!("opening database {}", db_file.display());
        let conn = Connection::open(&db_file)?;

        let audit = AuditLogger::new(paths.audit_log());
        let storage = Self { paths, conn, audit };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &LedgerPaths {
        &self.paths
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn staging(&self) -> StagingRepository<'_> {
        StagingRepository::new(&self.conn)
    }

    pub fn journal(&self) -> JournalRepository<'_> {
        JournalRepository::new(&self.conn)
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Append an entry to the audit log
    pub fn log_audit(&self, entry: &AuditEntry) -> LedgerResult<()> {
        log::debug!("audit: {} {} ({} rows)", entry.operation, entry.subject, entry.rows);
        self.audit.log(entry)
    }

    /// Create tables and views (idempotent)
    pub fn init_tables(&self) -> LedgerResult<()> {
        schema::init_tables(&self.conn)
    }

    /// Run a trivial query to prove the database answers
    pub fn test_connection(&self) -> bool {
        match self.conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)) {
            Ok(_) => true,
            Err(e) => {
                log::error!("database connection test failed: {}", e);
                false
            }
        }
    }

    /// Check if the ledger has been initialized (settings written)
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }
}
