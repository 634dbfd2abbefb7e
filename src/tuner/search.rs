use tracing::info;

use crate::booster::Trainer;
use crate::config::RunConfig;
use crate::error::Result;
use crate::tuner::sampler::Sampler;
use crate::tuner::trial::{execute_trial, TrialRecord};
use crate::workspace::Workspace;

/// Completed trials in the order they ran.
#[derive(Debug, Clone, Default)]
pub struct Study {
    trials: Vec<TrialRecord>,
}

impl Study {
    pub fn from_trials(trials: Vec<TrialRecord>) -> Self {
        Self { trials }
    }

    pub fn trials(&self) -> &[TrialRecord] {
        &self.trials
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Trial with the lowest score. Only a strictly lower score displaces the
    /// current best, so the earliest trial wins ties.
    pub fn best_trial(&self) -> Option<&TrialRecord> {
        let mut best: Option<&TrialRecord> = None;
        for trial in &self.trials {
            if trial.value.is_nan() {
                continue;
            }
            if best.is_none_or(|b| trial.value < b.value) {
                best = Some(trial);
            }
        }
        best
    }
}

/// Run `config.num_trials` trials, feeding each score back to the sampler.
pub fn run_search<S: Sampler, T: Trainer>(
    config: &RunConfig,
    workspace: &Workspace,
    sampler: &mut S,
    trainer: &T,
) -> Result<Study> {
    let mut study = Study::default();
    let mut best_value = f64::INFINITY;

    for number in 0..config.num_trials {
        let params = sampler.propose();
        let record = execute_trial(number, &params, config, trainer, workspace)?;
        sampler.report(record.value);

        if record.value < best_value {
            best_value = record.value;
            info!(
                "[{}/{}] New best: trial #{:03} log-loss={} ({})",
                number + 1,
                config.num_trials,
                number,
                record.value,
                record.params.display()
            );
        } else {
            info!(
                "[{}/{}] Trial #{:03} finished with log-loss={}",
                number + 1,
                config.num_trials,
                number,
                record.value
            );
        }

        study.trials.push(record);
    }

    Ok(study)
}
