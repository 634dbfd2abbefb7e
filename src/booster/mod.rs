//! Gradient-boosted decision trees for the binary log-loss objective.
//!
//! Features are bucketed into histogram bins once per training run, trees
//! are grown leaf-wise on gradient/hessian histograms, and every round is
//! scored on both the training and the validation set so early stopping can
//! watch validation log-loss.

pub mod binning;
pub mod learner;
pub mod metrics;
pub mod model;
pub mod params;
pub mod train;
pub mod tree;

pub use binning::{BinKind, BinMapper, BinnedMatrix};
pub use metrics::{auc, binary_logloss, sigmoid, EarlyStopping, EvaluationHistory, RoundMetrics};
pub use model::{GbdtModel, TextModel};
pub use params::{BoosterParams, BoostingType, Objective};
pub use train::{Fitted, HistogramBooster, Trainer};
pub use tree::{Child, SplitNode, SplitRule, Tree};
