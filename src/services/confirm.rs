//! Confirmation: moving the staging table into the journal

use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use super::validation::{ValidationResult, ValidationService};
use crate::audit::{AuditEntry, Operation};
use crate::error::{LedgerError, LedgerResult};
use crate::models::Money;
use crate::storage::Storage;

/// What a confirm run did
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmReport {
    pub batch_id: String,
    pub replaced: usize,
    pub inserted: usize,
    /// Statement files archived from `data/uploads/`
    pub archived_files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    Confirmed(ConfirmReport),
    /// Unbalanced sets; nothing was changed
    Rejected(ValidationResult),
    NothingStaged,
}

/// Rows a confirm run would touch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfirmPreview {
    /// Confirmed rows that share an entry id with a staged row
    pub to_replace: i64,
    pub staged: i64,
}

impl ConfirmPreview {
    pub fn to_insert(&self) -> i64 {
        self.staged - self.to_replace
    }
}

pub struct ConfirmService<'a> {
    storage: &'a Storage,
}

impl<'a> ConfirmService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn preview(&self) -> LedgerResult<ConfirmPreview> {
        Ok(ConfirmPreview {
            to_replace: self.storage.journal().count_replaceable()?,
            staged: self.storage.staging().count()?,
        })
    }

    /// Validate the staging table and, when balanced, move it into the journal
    pub fn confirm(&self, tolerance: Money) -> LedgerResult<ConfirmOutcome> {
        if self.storage.staging().count()? == 0 {
            return Ok(ConfirmOutcome::NothingStaged);
        }

        let validation = ValidationService::new(self.storage).validate_staged(tolerance)?;
        if !validation.valid {
            log::warn!("confirm rejected: {}", validation.message);
            return Ok(ConfirmOutcome::Rejected(validation));
        }

        let batch_id = Uuid::new_v4().to_string();
        let conn = self.storage.connection();
        let tx = conn.unchecked_transaction()?;
        let counts = self
            .storage
            .journal()
            .replace_from_staging(&batch_id, Utc::now())?;
        self.storage.staging().clear()?;
        tx.commit()?;

        log::info!(
            "batch {}: {} replaced, {} inserted",
            batch_id,
            counts.replaced,
            counts.inserted
        );

        let archived_files = self.archive_uploads()?;

        self.storage.log_audit(
            &AuditEntry::new(Operation::Confirm, &batch_id, counts.inserted)
                .with_details(format!("{} replaced", counts.replaced)),
        )?;

        Ok(ConfirmOutcome::Confirmed(ConfirmReport {
            batch_id,
            replaced: counts.replaced,
            inserted: counts.inserted,
            archived_files,
        }))
    }

    /// Move `*.csv` from the uploads directory to the confirmed directory
    fn archive_uploads(&self) -> LedgerResult<Vec<String>> {
        let paths = self.storage.paths();
        let uploads = paths.uploads_dir();
        let confirmed = paths.confirmed_dir();
        if !uploads.exists() {
            return Ok(Vec::new());
        }
        std::fs::create_dir_all(&confirmed)
            .map_err(|e| LedgerError::Io(format!("Failed to create {}: {}", confirmed.display(), e)))?;

        let mut moved = Vec::new();
        let entries = std::fs::read_dir(&uploads)
            .map_err(|e| LedgerError::Io(format!("Failed to read {}: {}", uploads.display(), e)))?;
        for entry in entries {
            let path = entry?.path();
            if !is_csv(&path) {
                continue;
            }
            let Some(name) = path.file_name() else {
                continue;
            };
            std::fs::rename(&path, confirmed.join(name))
                .map_err(|e| LedgerError::Io(format!("Failed to move {}: {}", path.display(), e)))?;
            moved.push(name.to_string_lossy().to_string());
        }

        moved.sort();
        if !moved.is_empty() {
            log::info!("archived {} file(s) to {}", moved.len(), confirmed.display());
        }
        Ok(moved)
    }
}

fn is_csv(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::LedgerPaths;
    use crate::models::{ChartOfAccounts, SubjectCode};
    use crate::services::ingest::{IngestService, StageOptions};
    use tempfile::TempDir;

    const BALANCED: &str = "Date,SubjectCode,Amount,Remarks,SetID\n\
        2024-03-02,500,850,shogo,1\n\
        2024-03-02,530,-850,shogo,1\n";

    const UNBALANCED: &str = "Date,SubjectCode,Amount,Remarks,SetID\n\
        2024-03-02,500,1000,lunch,1\n\
        2024-03-02,101,-900,lunch,1\n";

    fn setup() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        (temp_dir, Storage::new(paths).unwrap())
    }

    fn stage(temp: &TempDir, storage: &Storage, name: &str, contents: &str) {
        let chart = ChartOfAccounts::default_chart();
        let path = temp.path().join(name);
        std::fs::write(&path, contents).unwrap();
        IngestService::new(storage, &chart)
            .process(&path, StageOptions::default())
            .unwrap();
    }

    #[test]
    fn test_confirm_moves_rows_and_files() {
        let (temp, storage) = setup();
        stage(&temp, &storage, "march.csv", BALANCED);

        let outcome = ConfirmService::new(&storage)
            .confirm(Money::from_cents(1))
            .unwrap();
        let ConfirmOutcome::Confirmed(report) = outcome else {
            panic!("expected confirmation, got {:?}", outcome);
        };

        assert_eq!(report.inserted, 2);
        assert_eq!(report.replaced, 0);
        assert_eq!(report.archived_files, vec!["march.csv"]);
        assert_eq!(storage.staging().count().unwrap(), 0);
        assert_eq!(storage.journal().count().unwrap(), 2);
        assert!(storage.paths().confirmed_dir().join("march.csv").exists());
        assert!(!storage.paths().uploads_dir().join("march.csv").exists());

        let confirmed = storage.journal().list(None).unwrap();
        assert!(confirmed.iter().all(|e| e.batch_id.as_deref() == Some(report.batch_id.as_str())));
        assert!(confirmed.iter().all(|e| e.confirmed_at.is_some()));
    }

    #[test]
    fn test_reconfirm_replaces_same_entry_ids() {
        let (temp, storage) = setup();
        let service = ConfirmService::new(&storage);
        stage(&temp, &storage, "march.csv", BALANCED);
        service.confirm(Money::from_cents(1)).unwrap();

        stage(&temp, &storage, "march.csv", BALANCED);
        let preview = service.preview().unwrap();
        assert_eq!(preview.to_replace, 2);
        assert_eq!(preview.to_insert(), 0);

        let ConfirmOutcome::Confirmed(report) = service.confirm(Money::from_cents(1)).unwrap() else {
            panic!("expected confirmation");
        };
        assert_eq!(report.replaced, 2);
        assert_eq!(storage.journal().count().unwrap(), 2);
        let total: Money = storage.journal().list(None).unwrap().iter().map(|e| e.amount).sum();
        assert!(total.is_zero());
        assert!(storage
            .journal()
            .list(None)
            .unwrap()
            .iter()
            .any(|e| e.subject_code == SubjectCode::new(530)));
    }

    #[test]
    fn test_unbalanced_staging_rejected() {
        let (temp, storage) = setup();
        stage(&temp, &storage, "bad.csv", UNBALANCED);

        let outcome = ConfirmService::new(&storage)
            .confirm(Money::from_cents(1))
            .unwrap();
        let ConfirmOutcome::Rejected(result) = outcome else {
            panic!("expected rejection");
        };

        assert_eq!(result.unbalanced.len(), 1);
        assert_eq!(storage.staging().count().unwrap(), 2);
        assert_eq!(storage.journal().count().unwrap(), 0);
        assert!(storage.paths().uploads_dir().join("bad.csv").exists());
    }

    #[test]
    fn test_nothing_staged() {
        let (_temp, storage) = setup();
        assert_eq!(
            ConfirmService::new(&storage).confirm(Money::from_cents(1)).unwrap(),
            ConfirmOutcome::NothingStaged
        );
    }
}
