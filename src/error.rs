use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Stage of a trial an error surfaced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialPhase {
    LoadData,
    Training,
    WriteModel,
    WriteHistory,
}

impl fmt::Display for TrialPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrialPhase::LoadData => "loading data",
            TrialPhase::Training => "training",
            TrialPhase::WriteModel => "writing model",
            TrialPhase::WriteHistory => "writing history",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum TunerError {
    #[error("Workspace error at {path:?}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dataset {path:?} (line {line}): {message}")]
    Dataset {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Invalid hyperparameter: {0}")]
    Parameter(String),

    #[error("Trial #{trial:03} failed while {phase}: {source}")]
    Trial {
        trial: usize,
        phase: TrialPhase,
        #[source]
        source: Box<TunerError>,
    },

    #[error("Could not publish {path:?}: {source}")]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Search finished without any completed trials")]
    NoTrials,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl TunerError {
    /// Attach trial number and phase to an error raised inside a trial.
    pub fn in_trial(self, trial: usize, phase: TrialPhase) -> Self {
        TunerError::Trial {
            trial,
            phase,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, TunerError>;
