//! Path management for the household ledger
//!
//! ## Path Resolution Order
//!
//! 1. `LEDGER_DATA_DIR` environment variable (if set)
//! 2. The platform configuration directory (`~/.config/household-ledger` on Linux)
//!
//! The database file can be relocated on its own with `LEDGER_DATABASE`.

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::LedgerError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "LEDGER_DATA_DIR";

/// Environment variable overriding the database file
pub const DATABASE_ENV: &str = "LEDGER_DATABASE";

/// Manages all paths used by the ledger
#[derive(Debug, Clone)]
pub struct LedgerPaths {
    /// Base directory for all ledger data
    base_dir: PathBuf,
    /// Explicit database location, if overridden
    database_override: Option<PathBuf>,
}

impl LedgerPaths {
    /// Resolve paths from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no platform configuration directory can be determined.
    pub fn new() -> Result<Self, LedgerError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        let database_override = std::env::var(DATABASE_ENV).ok().map(PathBuf::from);

        Ok(Self {
            base_dir,
            database_override,
        })
    }

    /// Create LedgerPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            database_override: None,
        }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Path to the chart of accounts
    pub fn codes_file(&self) -> PathBuf {
        self.base_dir.join("codes.json")
    }

    /// Path to the classifier override rules
    pub fn rules_file(&self) -> PathBuf {
        self.base_dir.join("override_rules.csv")
    }

    /// Path to the SQLite database
    pub fn database_file(&self) -> PathBuf {
        self.database_override
            .clone()
            .unwrap_or_else(|| self.base_dir.join("ledger.db"))
    }

    /// Path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Statements staged but not yet confirmed
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir().join("uploads")
    }

    /// Statements whose entries have been confirmed
    pub fn confirmed_dir(&self) -> PathBuf {
        self.data_dir().join("confirmed")
    }

    /// Classifier training snapshots
    pub fn train_dir(&self) -> PathBuf {
        self.data_dir().join("train")
    }

    /// Trained classifier models
    pub fn models_dir(&self) -> PathBuf {
        self.base_dir.join("models")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), LedgerError> {
        let dirs = [
            self.base_dir.clone(),
            self.uploads_dir(),
            self.confirmed_dir(),
            self.train_dir(),
            self.models_dir(),
        ];

        for dir in dirs {
            std::fs::create_dir_all(&dir).map_err(|e| {
                LedgerError::Io(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }

        if let Some(parent) = self.database_file().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    LedgerError::Io(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        Ok(())
    }

    /// Check if the ledger has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, LedgerError> {
    ProjectDirs::from("", "", "household-ledger")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| LedgerError::Config("Could not determine a configuration directory".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.uploads_dir(), temp_dir.path().join("data").join("uploads"));
        assert_eq!(paths.database_file(), temp_dir.path().join("ledger.db"));
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        paths.ensure_directories().unwrap();

        assert!(paths.uploads_dir().exists());
        assert!(paths.confirmed_dir().exists());
        assert!(paths.train_dir().exists());
        assert!(paths.models_dir().exists());
    }

    #[test]
    fn test_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
        assert_eq!(paths.codes_file(), temp_dir.path().join("codes.json"));
        assert_eq!(paths.rules_file(), temp_dir.path().join("override_rules.csv"));
        assert!(!paths.is_initialized());
    }
}
