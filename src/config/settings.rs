//! User settings for the household ledger
//!
//! Validation tolerance, cash accounts, classifier thresholds and display
//! preferences. Every field has a default so older config files keep loading.

use serde::{Deserialize, Serialize};

use super::paths::LedgerPaths;
use crate::error::LedgerError;
use crate::models::{Money, SubjectCode};

/// Classifier tuning parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Predictions at or below this probability fall back to defaults
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Minimum number of examples required to train a model
    #[serde(default = "default_min_training_samples")]
    pub min_training_samples: usize,

    /// Vocabulary size cap for the TF-IDF features
    #[serde(default = "default_max_features")]
    pub max_features: usize,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            min_training_samples: default_min_training_samples(),
            max_features: default_max_features(),
        }
    }
}

/// User settings for the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Largest absolute set imbalance still accepted as balanced
    #[serde(default = "default_balance_tolerance")]
    pub balance_tolerance: Money,

    /// Accounts counted as cash in the cashflow report
    #[serde(default = "default_cash_codes")]
    pub cash_codes: Vec<SubjectCode>,

    /// Equity account receiving the monthly net income
    #[serde(default = "default_retained_earnings_code")]
    pub retained_earnings_code: SubjectCode,

    /// Classifier tuning
    #[serde(default)]
    pub classifier: ClassifierSettings,

    /// Currency symbol used by the status report
    #[serde(default)]
    pub currency_symbol: String,

    /// Window for the recent confirmations check
    #[serde(default = "default_recent_days")]
    pub recent_days: i64,
}

fn default_schema_version() -> u32 {
    1
}

fn default_balance_tolerance() -> Money {
    Money::from_cents(1)
}

fn default_cash_codes() -> Vec<SubjectCode> {
    vec![SubjectCode::new(100), SubjectCode::new(101), SubjectCode::new(102)]
}

fn default_retained_earnings_code() -> SubjectCode {
    SubjectCode::new(300)
}

fn default_confidence_threshold() -> f64 {
    0.5
}

fn default_min_training_samples() -> usize {
    10
}

fn default_max_features() -> usize {
    1000
}

fn default_recent_days() -> i64 {
    7
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            balance_tolerance: default_balance_tolerance(),
            cash_codes: default_cash_codes(),
            retained_earnings_code: default_retained_earnings_code(),
            classifier: ClassifierSettings::default(),
            currency_symbol: String::new(),
            recent_days: default_recent_days(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &LedgerPaths) -> Result<Self, LedgerError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| LedgerError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                LedgerError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &LedgerPaths) -> Result<(), LedgerError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| LedgerError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Whether an account counts as cash
    pub fn is_cash(&self, code: SubjectCode) -> bool {
        self.cash_codes.contains(&code)
    }
}
