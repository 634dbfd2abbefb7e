use tracing::info;

use crate::booster::{HistogramBooster, Trainer};
use crate::config::RunConfig;
use crate::error::Result;
use crate::tuner::{publish_results, run_search, Publication, Sampler, Study, TpeSampler};
use crate::workspace::reset_workspace;

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub study: Study,
    pub publication: Publication,
}

/// Resets the workspace, runs the search and publishes the winner.
pub struct TrialRunner {
    config: RunConfig,
}

impl TrialRunner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run with the given sampler and trainer.
    pub fn run<S: Sampler, T: Trainer>(&self, sampler: &mut S, trainer: &T) -> Result<RunReport> {
        let workspace = self.config.workspace();
        reset_workspace(&workspace)?;

        info!(
            num_trials = self.config.num_trials,
            train = %self.config.train_path.display(),
            val = %self.config.val_path.display(),
            "Starting study"
        );
        let study = run_search(&self.config, &workspace, sampler, trainer)?;
        let publication = publish_results(&study, &workspace)?;

        Ok(RunReport { study, publication })
    }

    /// Run with the TPE sampler and the histogram booster.
    pub fn run_default(&self) -> Result<RunReport> {
        let mut sampler = TpeSampler::new(self.config.space.clone(), self.config.seed)
            .with_config(self.config.tpe.clone());
        self.run(&mut sampler, &HistogramBooster::new())
    }
}
