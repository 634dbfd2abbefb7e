use std::fs;

use chrono::{DateTime, Local};
use tracing::info;

use crate::booster::{TextModel, Trainer};
use crate::config::RunConfig;
use crate::data::load_dataset;
use crate::error::{Result, TrialPhase, TunerError};
use crate::tuner::output::write_trial_history;
use crate::tuner::params::HyperparameterSet;
use crate::workspace::Workspace;

/// Outcome of one completed trial.
#[derive(Debug, Clone)]
pub struct TrialRecord {
    pub number: usize,
    pub params: HyperparameterSet,
    /// Validation log-loss at the best iteration.
    pub value: f64,
    pub best_iteration: usize,
    /// Boosting rounds actually run.
    pub rounds: usize,
    pub datetime_start: DateTime<Local>,
    pub datetime_complete: DateTime<Local>,
}

impl TrialRecord {
    pub fn duration_secs(&self) -> f64 {
        (self.datetime_complete - self.datetime_start)
            .num_microseconds()
            .map(|us| us as f64 / 1e6)
            .unwrap_or(0.0)
    }
}

/// Train and score one parameter set, writing the model and round history.
///
/// Both datasets are read from disk on every call.
pub fn execute_trial<T: Trainer>(
    number: usize,
    params: &HyperparameterSet,
    config: &RunConfig,
    trainer: &T,
    workspace: &Workspace,
) -> Result<TrialRecord> {
    let datetime_start = Local::now();

    info!("Loading training/validation data for trial #{:03}", number);
    let train = load_dataset(&config.train_path)
        .map_err(|e| e.in_trial(number, TrialPhase::LoadData))?;
    let valid = load_dataset(&config.val_path)
        .map_err(|e| e.in_trial(number, TrialPhase::LoadData))?;

    let booster_params = config
        .fixed
        .compose(params)
        .map_err(|e| e.in_trial(number, TrialPhase::Training))?;
    info!(
        "Selected parameters for new trial #{:03}: {}",
        number,
        serde_json::to_string(&booster_params)?
    );

    let fitted = trainer
        .fit(&train, &valid, &booster_params)
        .map_err(|e| e.in_trial(number, TrialPhase::Training))?;

    let best = fitted
        .history
        .at_iteration(fitted.best_iteration)
        .copied()
        .ok_or_else(|| {
            TunerError::Training("no boosting rounds were recorded".to_string())
                .in_trial(number, TrialPhase::Training)
        })?;
    info!(
        "Training log loss (trial #{:03}): {}",
        number, best.train_logloss
    );
    info!(
        "Validation log loss (trial #{:03}): {}",
        number, best.val_logloss
    );

    let model_path = workspace.model_path(number);
    info!(
        "Writing model for trial #{:03} out to: {}",
        number,
        model_path.display()
    );
    let text = fitted
        .model
        .to_text()
        .map_err(|e| e.in_trial(number, TrialPhase::WriteModel))?;
    fs::write(&model_path, text).map_err(|source| {
        TunerError::Workspace {
            path: model_path.clone(),
            source,
        }
        .in_trial(number, TrialPhase::WriteModel)
    })?;

    let history_path = workspace.trial_history_path(number);
    info!("Writing trial results out to {}", history_path.display());
    write_trial_history(&fitted.history, &history_path)
        .map_err(|e| e.in_trial(number, TrialPhase::WriteHistory))?;

    Ok(TrialRecord {
        number,
        params: params.clone(),
        value: best.val_logloss,
        best_iteration: fitted.best_iteration,
        rounds: fitted.history.len(),
        datetime_start,
        datetime_complete: Local::now(),
    })
}
