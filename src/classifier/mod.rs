//! Statement row classification
//!
//! Bank and card rows are turned into journal entries by predicting a
//! debit/credit account pair and a remarks text from the row description.
//! Predictions come from per-bank TF-IDF + naive Bayes models, fall back to
//! bank defaults when not confident, and can be overridden by keyword rules.

pub mod naive_bayes;
pub mod predictor;
pub mod rules;
pub mod text;
pub mod training;

pub use naive_bayes::{Prediction, TextClassifier};
pub use predictor::{BankClassifier, ModelTarget};
pub use rules::{OverrideRule, RuleSet, RuleTarget};
pub use training::{train_bank, ModelOutcome, TrainingRecord, TrainingReport};

use crate::models::SubjectCode;

/// Final accounts and remarks for one statement row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub debit: SubjectCode,
    pub credit: SubjectCode,
    pub remarks: String,
}
