use std::path::{Path, PathBuf};

pub const MODELS_DIR: &str = "models";
pub const TRIALS_DIR: &str = "trials";
pub const STUDIES_DIR: &str = "studies";

/// Ledger of the latest run.
pub const LEDGER_FILE: &str = "optuna_study.csv";

/// Best model of the latest run.
pub const PROMOTED_MODEL_FILE: &str = "LightGBM_model.txt";

/// Output locations of a run, all relative to one root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn models_dir(&self) -> PathBuf {
        self.root.join(MODELS_DIR)
    }

    pub fn trials_dir(&self) -> PathBuf {
        self.root.join(TRIALS_DIR)
    }

    pub fn studies_dir(&self) -> PathBuf {
        self.root.join(STUDIES_DIR)
    }

    /// `models/LightGBM_model_007.txt`
    pub fn model_path(&self, trial: usize) -> PathBuf {
        self.models_dir()
            .join(format!("LightGBM_model_{:03}.txt", trial))
    }

    /// `trials/trial_007.csv`
    pub fn trial_history_path(&self, trial: usize) -> PathBuf {
        self.trials_dir().join(format!("trial_{:03}.csv", trial))
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(LEDGER_FILE)
    }

    pub fn promoted_model_path(&self) -> PathBuf {
        self.root.join(PROMOTED_MODEL_FILE)
    }

    /// `studies/optuna_study_2024-05-01_13-45-00.csv`
    pub fn archive_path(&self, timestamp: &str) -> PathBuf {
        self.studies_dir()
            .join(format!("optuna_study_{}.csv", timestamp))
    }
}
