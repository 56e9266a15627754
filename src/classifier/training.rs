//! Training snapshots and model training
//!
//! Every `process-bank` run writes the classified rows to
//! `data/train/<bank>_processed_<timestamp>.csv`. After the user corrects
//! those files by hand, `train <bank>` fits the account-pair and remarks
//! models from all of them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::naive_bayes::TextClassifier;
use super::predictor::{model_path, pair_label, parse_pair_label, ModelTarget};
use super::text;
use crate::config::settings::ClassifierSettings;
use crate::error::{LedgerError, LedgerResult};
use crate::models::Bank;

/// One classified statement row as stored in a training snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    #[serde(default)]
    pub date: String,
    #[serde(default, alias = "abstruct")]
    pub description: String,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub combined_text: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub suggested_debit: String,
    #[serde(default)]
    pub suggested_credit: String,
    #[serde(default)]
    pub remarks_classified: String,
}

impl TrainingRecord {
    /// Text the models learn from; rebuilt from the parts for older snapshots
    fn training_text(&self) -> String {
        if self.combined_text.trim().is_empty() {
            text::combined_text(&self.description, &self.memo, &self.direction)
        } else {
            text::normalize(&self.combined_text)
        }
    }

    fn label(&self, target: ModelTarget) -> Option<String> {
        match target {
            ModelTarget::SubjectCode => {
                let raw = format!("{}_{}", self.suggested_debit.trim(), self.suggested_credit.trim());
                parse_pair_label(&raw).map(|(debit, credit)| pair_label(debit, credit))
            }
            ModelTarget::Remarks => {
                let remarks = self.remarks_classified.trim();
                (!remarks.is_empty()).then(|| remarks.to_string())
            }
        }
    }
}

/// File name prefix of a bank's snapshots
fn snapshot_prefix(bank: Bank) -> String {
    format!("{}_processed_", bank.as_str())
}

/// Write a snapshot of classified rows; returns the file written
pub fn write_snapshot(
    train_dir: &Path,
    bank: Bank,
    timestamp: &str,
    records: &[TrainingRecord],
) -> LedgerResult<PathBuf> {
    std::fs::create_dir_all(train_dir)
        .map_err(|e| LedgerError::Io(format!("Failed to create {}: {}", train_dir.display(), e)))?;

    let path = train_dir.join(format!("{}{}.csv", snapshot_prefix(bank), timestamp));
    let mut writer = csv::Writer::from_path(&path)
        .map_err(|e| LedgerError::Csv(format!("Failed to create {}: {}", path.display(), e)))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .flush()
        .map_err(|e| LedgerError::Io(format!("Failed to write {}: {}", path.display(), e)))?;

    log::info!("training snapshot {} ({} rows)", path.display(), records.len());
    Ok(path)
}

/// Snapshot files of a bank, sorted by name
pub fn snapshot_files(train_dir: &Path, bank: Bank) -> LedgerResult<Vec<PathBuf>> {
    if !train_dir.exists() {
        return Ok(Vec::new());
    }

    let prefix = snapshot_prefix(bank);
    let mut files: Vec<PathBuf> = std::fs::read_dir(train_dir)
        .map_err(|e| LedgerError::Io(format!("Failed to read {}: {}", train_dir.display(), e)))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(&prefix) && n.ends_with(".csv"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn read_snapshot(path: &Path) -> LedgerResult<Vec<TrainingRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| LedgerError::Csv(format!("Failed to open {}: {}", path.display(), e)))?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/// (text, label) pairs for one model from every snapshot of the bank
///
/// Unreadable snapshots are logged and skipped.
pub fn load_examples(
    train_dir: &Path,
    bank: Bank,
    target: ModelTarget,
) -> LedgerResult<(Vec<String>, Vec<String>)> {
    let mut texts = Vec::new();
    let mut labels = Vec::new();

    for path in snapshot_files(train_dir, bank)? {
        let records = match read_snapshot(&path) {
            Ok(records) => records,
            Err(e) => {
                log::error!("skipping training file {}: {}", path.display(), e);
                continue;
            }
        };

        for record in records {
            let text = record.training_text();
            if text.is_empty() {
                continue;
            }
            if let Some(label) = record.label(target) {
                texts.push(text);
                labels.push(label);
            }
        }
    }

    Ok((texts, labels))
}

/// Outcome of training one model
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutcome {
    Trained { samples: usize, classes: usize },
    InsufficientData { samples: usize },
}

/// Outcome of `train <bank>`
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub bank: Bank,
    pub subject_code: ModelOutcome,
    pub remarks: ModelOutcome,
}

impl TrainingReport {
    /// At least one model was trained
    pub fn success(&self) -> bool {
        [&self.subject_code, &self.remarks]
            .iter()
            .any(|o| matches!(o, ModelOutcome::Trained { .. }))
    }
}

fn train_target(
    train_dir: &Path,
    models_dir: &Path,
    bank: Bank,
    target: ModelTarget,
    settings: &ClassifierSettings,
) -> LedgerResult<ModelOutcome> {
    let (texts, labels) = load_examples(train_dir, bank, target)?;
    if texts.len() < settings.min_training_samples {
        log::warn!(
            "not enough {} training data for {}: {} samples (need {})",
            target.as_str(),
            bank,
            texts.len(),
            settings.min_training_samples
        );
        return Ok(ModelOutcome::InsufficientData {
            samples: texts.len(),
        });
    }

    let model = TextClassifier::fit(&texts, &labels, settings.max_features)?;
    std::fs::create_dir_all(models_dir)
        .map_err(|e| LedgerError::Io(format!("Failed to create {}: {}", models_dir.display(), e)))?;
    model.save(&model_path(models_dir, bank, target))?;

    log::info!(
        "trained {} model for {} ({} samples, {} classes)",
        target.as_str(),
        bank,
        texts.len(),
        model.labels().len()
    );
    Ok(ModelOutcome::Trained {
        samples: texts.len(),
        classes: model.labels().len(),
    })
}

/// Train both models of a bank from its snapshots
pub fn train_bank(
    train_dir: &Path,
    models_dir: &Path,
    bank: Bank,
    settings: &ClassifierSettings,
) -> LedgerResult<TrainingReport> {
    Ok(TrainingReport {
        bank,
        subject_code: train_target(train_dir, models_dir, bank, ModelTarget::SubjectCode, settings)?,
        remarks: train_target(train_dir, models_dir, bank, ModelTarget::Remarks, settings)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(description: &str, direction: &str, debit: &str, credit: &str, remarks: &str) -> TrainingRecord {
        TrainingRecord {
            date: "2024-03-02".into(),
            description: description.into(),
            memo: String::new(),
            combined_text: text::combined_text(description, "", direction),
            direction: direction.into(),
            suggested_debit: debit.into(),
            suggested_credit: credit.into(),
            remarks_classified: remarks.into(),
        }
    }

    fn sample_records() -> Vec<TrainingRecord> {
        let mut records = Vec::new();
        for i in 0..6 {
            records.push(record(&format!("Seven Eleven shop{}", i), "out", "500", "101", "conveni"));
            records.push(record(&format!("ACME salary m{}", i), "in", "101", "400", "salary"));
        }
        records
    }

    #[test]
    fn test_snapshot_roundtrip_and_examples() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_snapshot(temp_dir.path(), Bank::Ufj, "20240302_101500", &sample_records()).unwrap();
        assert!(path.ends_with("ufj_processed_20240302_101500.csv"));

        let (texts, labels) = load_examples(temp_dir.path(), Bank::Ufj, ModelTarget::SubjectCode).unwrap();
        assert_eq!(texts.len(), 12);
        assert!(labels.contains(&"500_101".to_string()));

        let (jcb_texts, _) = load_examples(temp_dir.path(), Bank::Jcb, ModelTarget::Remarks).unwrap();
        assert!(jcb_texts.is_empty());
    }

    #[test]
    fn test_legacy_snapshot_columns() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("jcb_processed_old.csv"),
            "date,abstruct,memo,direction,suggested_debit,suggested_credit,remarks_classified\n\
             2024-03-02,ＡＭＡＺＯＮ,,out,530.0,201,amazon\n\
             2024-03-03,,,out,,,\n",
        )
        .unwrap();

        let (texts, labels) = load_examples(temp_dir.path(), Bank::Jcb, ModelTarget::SubjectCode).unwrap();
        assert_eq!(texts, vec!["amazon out".to_string()]);
        assert_eq!(labels, vec!["530_201".to_string()]);
    }

    #[test]
    fn test_train_bank_requires_minimum_samples() {
        let temp_dir = TempDir::new().unwrap();
        let train_dir = temp_dir.path().join("train");
        let models_dir = temp_dir.path().join("models");
        let settings = ClassifierSettings::default();

        write_snapshot(&train_dir, Bank::Ufj, "a", &sample_records()[..4]).unwrap();
        let report = train_bank(&train_dir, &models_dir, Bank::Ufj, &settings).unwrap();
        assert!(!report.success());
        assert_eq!(report.remarks, ModelOutcome::InsufficientData { samples: 4 });

        write_snapshot(&train_dir, Bank::Ufj, "b", &sample_records()).unwrap();
        let report = train_bank(&train_dir, &models_dir, Bank::Ufj, &settings).unwrap();
        assert!(report.success());
        assert_eq!(report.subject_code, ModelOutcome::Trained { samples: 16, classes: 2 });
        assert!(model_path(&models_dir, Bank::Ufj, ModelTarget::Remarks).exists());
    }
}
