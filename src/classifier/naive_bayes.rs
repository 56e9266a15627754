//! TF-IDF features feeding a multinomial naive Bayes model
//!
//! Terms are unigrams and bigrams from [`text::terms`]. The vocabulary keeps
//! the `max_features` most frequent terms of the training corpus; document
//! vectors use smoothed idf (`ln((1 + n) / (1 + df)) + 1`) and are
//! l2-normalised. The model uses additive smoothing with alpha = 1.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::text;
use crate::error::{LedgerError, LedgerResult};

const ALPHA: f64 = 1.0;

/// Most likely label for a text
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub probability: f64,
}

/// A trained text classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextClassifier {
    /// term -> feature index
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    /// Sorted class labels
    labels: Vec<String>,
    class_log_prior: Vec<f64>,
    /// `[class][feature]`
    feature_log_prob: Vec<Vec<f64>>,
    sample_count: usize,
    trained_at: DateTime<Utc>,
}

impl TextClassifier {
    /// Fit on parallel slices of texts and labels
    pub fn fit(texts: &[String], labels: &[String], max_features: usize) -> LedgerResult<Self> {
        if texts.len() != labels.len() {
            return Err(LedgerError::Classifier(format!(
                "{} texts but {} labels",
                texts.len(),
                labels.len()
            )));
        }
        if texts.is_empty() {
            return Err(LedgerError::Classifier("No training samples".into()));
        }

        let documents: Vec<Vec<String>> = texts.iter().map(|t| text::terms(t)).collect();
        let vocabulary = build_vocabulary(&documents, max_features);
        if vocabulary.is_empty() {
            return Err(LedgerError::Classifier(
                "Training texts contain no usable terms".into(),
            ));
        }

        let n_docs = documents.len() as f64;
        let mut document_frequency = vec![0usize; vocabulary.len()];
        for doc in &documents {
            let mut seen = vec![false; vocabulary.len()];
            for term in doc {
                if let Some(&idx) = vocabulary.get(term) {
                    if !seen[idx] {
                        seen[idx] = true;
                        document_frequency[idx] += 1;
                    }
                }
            }
        }
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let mut class_labels: Vec<String> = labels.to_vec();
        class_labels.sort();
        class_labels.dedup();
        let class_index: HashMap<&str, usize> = class_labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();

        let n_features = vocabulary.len();
        let mut feature_count = vec![vec![0.0f64; n_features]; class_labels.len()];
        let mut class_count = vec![0usize; class_labels.len()];

        for (doc, label) in documents.iter().zip(labels) {
            let class = class_index[label.as_str()];
            class_count[class] += 1;
            for (idx, weight) in tfidf_vector(doc, &vocabulary, &idf) {
                feature_count[class][idx] += weight;
            }
        }

        let class_log_prior = class_count
            .iter()
            .map(|&count| (count as f64 / n_docs).ln())
            .collect();
        let feature_log_prob = feature_count
            .iter()
            .map(|counts| {
                let total: f64 = counts.iter().sum::<f64>() + ALPHA * n_features as f64;
                counts.iter().map(|c| ((c + ALPHA) / total).ln()).collect()
            })
            .collect();

        Ok(Self {
            vocabulary,
            idf,
            labels: class_labels,
            class_log_prior,
            feature_log_prob,
            sample_count: texts.len(),
            trained_at: Utc::now(),
        })
    }

    /// Probability of each label for a text, in label order
    pub fn predict_proba(&self, text: &str) -> Vec<(String, f64)> {
        let terms = text::terms(text);
        let features = tfidf_vector(&terms, &self.vocabulary, &self.idf);

        let joint: Vec<f64> = self
            .class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, log_probs)| {
                prior
                    + features
                        .iter()
                        .map(|&(idx, weight)| weight * log_probs[idx])
                        .sum::<f64>()
            })
            .collect();

        let max = joint.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let norm: f64 = joint.iter().map(|j| (j - max).exp()).sum();

        self.labels
            .iter()
            .zip(joint)
            .map(|(label, j)| (label.clone(), (j - max).exp() / norm))
            .collect()
    }

    /// The most probable label
    pub fn predict(&self, text: &str) -> Option<Prediction> {
        self.predict_proba(text)
            .into_iter()
            .fold(None, |best: Option<Prediction>, (label, probability)| match best {
                Some(b) if b.probability >= probability => Some(b),
                _ => Some(Prediction { label, probability }),
            })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Load a model saved with [`TextClassifier::save`]
    pub fn load(path: &Path) -> LedgerResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        let model: Self = serde_json::from_str(&contents).map_err(|e| {
            LedgerError::Classifier(format!("Invalid model file {}: {}", path.display(), e))
        })?;
        model.check_shape().map_err(|problem| {
            LedgerError::Classifier(format!("Invalid model file {}: {}", path.display(), problem))
        })?;
        Ok(model)
    }

    /// Every index used by `predict_proba` must be in bounds
    fn check_shape(&self) -> Result<(), String> {
        let features = self.idf.len();
        if self.vocabulary.len() != features {
            return Err(format!(
                "{} vocabulary terms but {} idf weights",
                self.vocabulary.len(),
                features
            ));
        }
        if let Some((term, idx)) = self.vocabulary.iter().find(|(_, idx)| **idx >= features) {
            return Err(format!("term '{}' has feature index {} of {}", term, idx, features));
        }
        if self.class_log_prior.len() != self.labels.len()
            || self.feature_log_prob.len() != self.labels.len()
        {
            return Err(format!(
                "{} labels, {} priors and {} feature rows",
                self.labels.len(),
                self.class_log_prior.len(),
                self.feature_log_prob.len()
            ));
        }
        if let Some(row) = self.feature_log_prob.iter().find(|row| row.len() != features) {
            return Err(format!("feature row of length {} (expected {})", row.len(), features));
        }
        Ok(())
    }

    /// Write the model as JSON, replacing any previous file atomically
    pub fn save(&self, path: &Path) -> LedgerResult<()> {
        let json = serde_json::to_string(self)?;
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, json).map_err(|e| {
            LedgerError::Io(format!("Failed to write {}: {}", temp_path.display(), e))
        })?;
        std::fs::rename(&temp_path, path)
            .map_err(|e| LedgerError::Io(format!("Failed to replace {}: {}", path.display(), e)))
    }
}

/// Keep the `max_features` most frequent terms, indexed alphabetically
fn build_vocabulary(documents: &[Vec<String>], max_features: usize) -> BTreeMap<String, usize> {
    let mut frequency: HashMap<&str, usize> = HashMap::new();
    for doc in documents {
        for term in doc {
            *frequency.entry(term.as_str()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = frequency.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(max_features.max(1));

    let mut kept: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
    kept.sort_unstable();
    kept.into_iter()
        .enumerate()
        .map(|(idx, term)| (term.to_string(), idx))
        .collect()
}

/// Sparse l2-normalised tf-idf vector of a tokenised document
fn tfidf_vector(
    terms: &[String],
    vocabulary: &BTreeMap<String, usize>,
    idf: &[f64],
) -> Vec<(usize, f64)> {
    let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
    for term in terms {
        if let Some(&idx) = vocabulary.get(term) {
            *counts.entry(idx).or_insert(0.0) += 1.0;
        }
    }

    let mut weighted: Vec<(usize, f64)> = counts
        .into_iter()
        .map(|(idx, tf)| (idx, tf * idf[idx]))
        .collect();
    let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, w) in &mut weighted {
            *w /= norm;
        }
    }
    weighted
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn corpus() -> (Vec<String>, Vec<String>) {
        let rows = [
            ("seven eleven out", "598_101"),
            ("seven eleven tokyo out", "598_101"),
            ("lawson out", "598_101"),
            ("lawson shibuya out", "598_101"),
            ("salary acme in", "101_400"),
            ("salary acme corp in", "101_400"),
            ("acme bonus in", "101_400"),
            ("tokyo electric out", "550_101"),
            ("tokyo electric power out", "550_101"),
            ("electric bill out", "550_101"),
        ];
        (
            rows.iter().map(|(t, _)| t.to_string()).collect(),
            rows.iter().map(|(_, l)| l.to_string()).collect(),
        )
    }

    #[test]
    fn test_predicts_training_classes() {
        let (texts, labels) = corpus();
        let model = TextClassifier::fit(&texts, &labels, 1000).unwrap();

        assert_eq!(model.labels(), &["101_400", "550_101", "598_101"]);
        assert_eq!(model.predict("salary acme in").unwrap().label, "101_400");
        assert_eq!(model.predict("tokyo electric out").unwrap().label, "550_101");
        assert_eq!(model.predict("lawson out").unwrap().label, "598_101");
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (texts, labels) = corpus();
        let model = TextClassifier::fit(&texts, &labels, 1000).unwrap();

        let total: f64 = model.predict_proba("unseen words").iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_features_caps_vocabulary() {
        let (texts, labels) = corpus();
        let model = TextClassifier::fit(&texts, &labels, 5).unwrap();
        assert_eq!(model.vocabulary_size(), 5);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        assert!(TextClassifier::fit(&[], &[], 10).is_err());
        assert!(TextClassifier::fit(&["a".into()], &["x".into(), "y".into()], 10).is_err());
        assert!(TextClassifier::fit(&["a b".into()], &["x".into()], 10).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ufj_remarks.json");
        let (texts, labels) = corpus();
        let model = TextClassifier::fit(&texts, &labels, 1000).unwrap();

        model.save(&path).unwrap();
        let loaded = TextClassifier::load(&path).unwrap();

        assert_eq!(loaded.labels(), model.labels());
        assert_eq!(loaded.sample_count(), 10);
        assert_eq!(
            loaded.predict("salary acme in").unwrap().label,
            model.predict("salary acme in").unwrap().label
        );
    }

    #[test]
    fn test_load_rejects_inconsistent_model() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("jcb_subject_code.json");
        let (texts, labels) = corpus();
        TextClassifier::fit(&texts, &labels, 1000).unwrap().save(&path).unwrap();

        let mut json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        json["idf"].as_array_mut().unwrap().truncate(2);
        std::fs::write(&path, json.to_string()).unwrap();
        assert!(matches!(TextClassifier::load(&path), Err(LedgerError::Classifier(_))));

        let mut json: serde_json::Value = serde_json::from_str(
            &serde_json::to_string(&TextClassifier::fit(&texts, &labels, 1000).unwrap()).unwrap(),
        )
        .unwrap();
        json["feature_log_prob"][1].as_array_mut().unwrap().pop();
        std::fs::write(&path, json.to_string()).unwrap();
        assert!(matches!(TextClassifier::load(&path), Err(LedgerError::Classifier(_))));
    }
}
