use std::path::PathBuf;

use crate::tuner::{FixedParams, SearchSpace, TpeConfig};
use crate::workspace::Workspace;

/// Everything one tuning run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory the output tree is written under.
    pub workspace_root: PathBuf,
    pub train_path: PathBuf,
    pub val_path: PathBuf,
    pub num_trials: usize,
    pub fixed: FixedParams,
    pub space: SearchSpace,
    pub tpe: TpeConfig,
    /// Sampler seed; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("."),
            train_path: PathBuf::from("train.csv"),
            val_path: PathBuf::from("val.csv"),
            num_trials: 100,
            fixed: FixedParams::default(),
            space: SearchSpace::default(),
            tpe: TpeConfig::default(),
            seed: None,
        }
    }
}

impl RunConfig {
    pub fn workspace(&self) -> Workspace {
        Workspace::new(&self.workspace_root)
    }
}
