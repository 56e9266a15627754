//! Per-bank prediction of account pairs and remarks

use std::path::{Path, PathBuf};

use super::naive_bayes::{Prediction, TextClassifier};
use super::Classification;
use crate::models::{Bank, Direction, SubjectCode};

/// What a model predicts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTarget {
    /// `<debit>_<credit>` account pair
    SubjectCode,
    Remarks,
}

impl ModelTarget {
    pub fn all() -> [ModelTarget; 2] {
        [ModelTarget::SubjectCode, ModelTarget::Remarks]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTarget::SubjectCode => "subject_code",
            ModelTarget::Remarks => "remarks",
        }
    }
}

/// `models/<bank>_<target>.json`
pub fn model_path(models_dir: &Path, bank: Bank, target: ModelTarget) -> PathBuf {
    models_dir.join(format!("{}_{}.json", bank.as_str(), target.as_str()))
}

/// Split a `<debit>_<credit>` label
pub fn parse_pair_label(label: &str) -> Option<(SubjectCode, SubjectCode)> {
    let (debit, credit) = label.split_once('_')?;
    Some((SubjectCode::parse(debit)?, SubjectCode::parse(credit)?))
}

/// Build a `<debit>_<credit>` label
pub fn pair_label(debit: SubjectCode, credit: SubjectCode) -> String {
    format!("{}_{}", debit, credit)
}

/// The models of one bank plus the confidence a prediction needs
pub struct BankClassifier {
    bank: Bank,
    subject_model: Option<TextClassifier>,
    remarks_model: Option<TextClassifier>,
    confidence_threshold: f64,
}

fn load_model(models_dir: &Path, bank: Bank, target: ModelTarget) -> Option<TextClassifier> {
    let path = model_path(models_dir, bank, target);
    if !path.exists() {
        log::debug!("no {} model for {}", target.as_str(), bank);
        return None;
    }
    match TextClassifier::load(&path) {
        Ok(model) => {
            log::info!(
                "loaded {} model for {} ({} samples)",
                target.as_str(),
                bank,
                model.sample_count()
            );
            Some(model)
        }
        Err(e) => {
            log::error!("failed to load {}: {}", path.display(), e);
            None
        }
    }
}

impl BankClassifier {
    /// Load whatever models exist for the bank; missing models fall back to defaults
    pub fn load(models_dir: &Path, bank: Bank, confidence_threshold: f64) -> Self {
        Self {
            bank,
            subject_model: load_model(models_dir, bank, ModelTarget::SubjectCode),
            remarks_model: load_model(models_dir, bank, ModelTarget::Remarks),
            confidence_threshold,
        }
    }

    /// A classifier without models (defaults only)
    pub fn untrained(bank: Bank, confidence_threshold: f64) -> Self {
        Self {
            bank,
            subject_model: None,
            remarks_model: None,
            confidence_threshold,
        }
    }

    pub fn with_models(
        mut self,
        subject_model: Option<TextClassifier>,
        remarks_model: Option<TextClassifier>,
    ) -> Self {
        self.subject_model = subject_model;
        self.remarks_model = remarks_model;
        self
    }

    pub fn bank(&self) -> Bank {
        self.bank
    }

    pub fn has_models(&self) -> bool {
        self.subject_model.is_some() || self.remarks_model.is_some()
    }

    fn confident(&self, model: Option<&TextClassifier>, text: &str) -> Option<Prediction> {
        model
            .and_then(|m| m.predict(text))
            .filter(|p| p.probability > self.confidence_threshold)
    }

    /// Predict the account pair and remarks for a row
    pub fn classify(&self, combined_text: &str, direction: Direction) -> Classification {
        let text = combined_text.trim();

        let (debit, credit) = self
            .confident(self.subject_model.as_ref(), text)
            .and_then(|p| parse_pair_label(&p.label))
            .unwrap_or_else(|| self.bank.default_pair(direction));

        let remarks = self
            .confident(self.remarks_model.as_ref(), text)
            .map(|p| p.label)
            .unwrap_or_else(|| self.bank.default_remarks().to_string());

        Classification {
            debit,
            credit,
            remarks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training() -> (Vec<String>, Vec<String>, Vec<String>) {
        let rows = [
            ("seven eleven out", "500_101", "conveni"),
            ("seven eleven tokyo out", "500_101", "conveni"),
            ("seven eleven shibuya out", "500_101", "conveni"),
            ("acme salary in", "101_400", "salary"),
            ("acme salary corp in", "101_400", "salary"),
            ("acme salary bonus in", "101_400", "salary"),
        ];
        (
            rows.iter().map(|r| r.0.to_string()).collect(),
            rows.iter().map(|r| r.1.to_string()).collect(),
            rows.iter().map(|r| r.2.to_string()).collect(),
        )
    }

    #[test]
    fn test_defaults_without_models() {
        let ufj = BankClassifier::untrained(Bank::Ufj, 0.5);
        let c = ufj.classify("anything in", Direction::In);
        assert_eq!(c.debit, SubjectCode::new(101));
        assert_eq!(c.credit, SubjectCode::new(490));
        assert_eq!(c.remarks, "Auto classified");

        let jcb = BankClassifier::untrained(Bank::Jcb, 0.5);
        assert_eq!(jcb.classify("x out", Direction::Out).remarks, "JCB Auto classified");
    }

    #[test]
    fn test_confident_prediction_used() {
        let (texts, pairs, remarks) = training();
        let classifier = BankClassifier::untrained(Bank::Ufj, 0.5).with_models(
            Some(TextClassifier::fit(&texts, &pairs, 1000).unwrap()),
            Some(TextClassifier::fit(&texts, &remarks, 1000).unwrap()),
        );

        let c = classifier.classify("seven eleven out", Direction::Out);
        assert_eq!(c.debit, SubjectCode::new(500));
        assert_eq!(c.credit, SubjectCode::new(101));
        assert_eq!(c.remarks, "conveni");
    }

    #[test]
    fn test_threshold_rejects_prediction() {
        let (texts, pairs, _) = training();
        let classifier = BankClassifier::untrained(Bank::Ufj, 1.0)
            .with_models(Some(TextClassifier::fit(&texts, &pairs, 1000).unwrap()), None);

        let c = classifier.classify("seven eleven out", Direction::Out);
        assert_eq!(c.debit, SubjectCode::new(598));
    }

    #[test]
    fn test_pair_labels() {
        assert_eq!(
            parse_pair_label("598_101"),
            Some((SubjectCode::new(598), SubjectCode::new(101)))
        );
        assert_eq!(parse_pair_label("598.0_101.0"), Some((SubjectCode::new(598), SubjectCode::new(101))));
        assert_eq!(parse_pair_label("598"), None);
        assert_eq!(pair_label(SubjectCode::new(101), SubjectCode::new(490)), "101_490");
    }

    #[test]
    fn test_inconsistent_model_file_falls_back_to_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let (texts, pairs, _) = training();
        let path = model_path(temp_dir.path(), Bank::Ufj, ModelTarget::SubjectCode);
        TextClassifier::fit(&texts, &pairs, 1000).unwrap().save(&path).unwrap();

        let mut json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        json["idf"] = serde_json::json!([1.0]);
        std::fs::write(&path, json.to_string()).unwrap();

        let classifier = BankClassifier::load(temp_dir.path(), Bank::Ufj, 0.5);
        assert!(!classifier.has_models());
        let c = classifier.classify("seven eleven out", Direction::Out);
        assert_eq!(c.debit, SubjectCode::new(598));
        assert_eq!(c.credit, SubjectCode::new(101));
    }
}
