//! Audit entry data structures
//!
//! Defines the ledger operations that are audited and the entry format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State-changing ledger operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Statement rows written to the staging table
    Stage,
    /// Staged rows moved into the journal
    Confirm,
    /// Month-end closing entries written
    Close,
    /// Closing entries of a month replaced
    Reclose,
    /// Staging table emptied
    Clear,
    /// Classifier models trained
    Train,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Stage => write!(f, "STAGE"),
            Operation::Confirm => write!(f, "CONFIRM"),
            Operation::Close => write!(f, "CLOSE"),
            Operation::Reclose => write!(f, "RECLOSE"),
            Operation::Clear => write!(f, "CLEAR"),
            Operation::Train => write!(f, "TRAIN"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    /// What was acted on: a file name, a month, a bank or a batch id
    pub subject: String,

    /// Number of rows written or removed
    pub rows: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AuditEntry {
    pub fn new(operation: Operation, subject: impl Into<String>, rows: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            subject: subject.into(),
            rows,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} ({} rows)",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.subject,
            self.rows
        );

        if let Some(details) = &self.details {
            output.push_str(&format!("\n  {}", details));
        }

        output
    }
}
