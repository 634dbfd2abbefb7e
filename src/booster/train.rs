use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::booster::binning::{BinMapper, BinnedMatrix};
use crate::booster::learner::TreeLearner;
use crate::booster::metrics::{
    auc, binary_logloss, sigmoid, EarlyStopping, EvaluationHistory, RoundMetrics,
};
use crate::booster::model::{GbdtModel, TextModel};
use crate::booster::params::BoosterParams;
use crate::booster::tree::Tree;
use crate::data::Dataset;
use crate::error::{Result, TunerError};

/// Output of one training run.
#[derive(Debug, Clone)]
pub struct Fitted<M> {
    pub model: M,
    /// Metrics for every round that ran, including rounds past the best one.
    pub history: EvaluationHistory,
    /// One-based iteration with the lowest validation log-loss.
    pub best_iteration: usize,
}

impl<M> Fitted<M> {
    /// Validation log-loss at the best iteration.
    pub fn best_score(&self) -> Option<f64> {
        self.history
            .at_iteration(self.best_iteration)
            .map(|m| m.val_logloss)
    }
}

/// Something that turns a training set, a validation set and a parameter set
/// into a model plus its per-round evaluation history.
pub trait Trainer {
    type Model: TextModel;

    fn fit(
        &self,
        train: &Dataset,
        valid: &Dataset,
        params: &BoosterParams,
    ) -> Result<Fitted<Self::Model>>;
}

/// Histogram-based, leaf-wise gradient boosting for the binary objective.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistogramBooster;

impl HistogramBooster {
    pub fn new() -> Self {
        Self
    }

    fn check_inputs(train: &Dataset, valid: &Dataset, params: &BoosterParams) -> Result<()> {
        params.validate()?;

        let num_features = train.num_features();
        if valid.num_features() != num_features {
            return Err(TunerError::Training(format!(
                "training set has {} features but validation set has {}",
                num_features,
                valid.num_features()
            )));
        }
        if !params.max_bin_by_feature.is_empty() && params.max_bin_by_feature.len() != num_features
        {
            return Err(TunerError::Parameter(format!(
                "max_bin_by_feature has {} entries for {} features",
                params.max_bin_by_feature.len(),
                num_features
            )));
        }
        if let Some(&bad) = params.categorical_feature.iter().find(|&&f| f >= num_features) {
            return Err(TunerError::Parameter(format!(
                "categorical feature index {} out of range",
                bad
            )));
        }
        if train.is_empty() || valid.is_empty() {
            return Err(TunerError::Training("empty dataset".to_string()));
        }

        let rate = train.positive_rate();
        if rate <= 0.0 || rate >= 1.0 {
            return Err(TunerError::Training(
                "training labels contain a single class".to_string(),
            ));
        }
        Ok(())
    }
}

/// Add one tree's output to every row's running score.
fn apply_tree(tree: &Tree, bins: &BinnedMatrix, scores: &mut [f64]) {
    if tree.splits.is_empty() {
        return;
    }
    for (row, score) in scores.iter_mut().enumerate() {
        let leaf = tree.leaf_for_bins(|feature| bins.get(row, feature));
        *score += tree.leaf_values[leaf];
    }
}

fn sorted_sample(rng: &mut StdRng, length: usize, amount: usize) -> Vec<usize> {
    let mut picked = index::sample(rng, length, amount).into_vec();
    picked.sort_unstable();
    picked
}

impl Trainer for HistogramBooster {
    type Model = GbdtModel;

    fn fit(
        &self,
        train: &Dataset,
        valid: &Dataset,
        params: &BoosterParams,
    ) -> Result<Fitted<GbdtModel>> {
        Self::check_inputs(train, valid, params)?;

        let num_features = train.num_features();
        let num_rows = train.len();

        let mappers: Vec<BinMapper> = (0..num_features)
            .map(|f| BinMapper::fit(train.column(f), params.max_bin(f), params.is_categorical(f)))
            .collect();
        let train_bins = BinnedMatrix::new(train, &mappers);
        let valid_bins = BinnedMatrix::new(valid, &mappers);

        let rate = train.positive_rate();
        let init_score = (rate / (1.0 - rate)).ln();
        debug!(init_score, "Boosting from average label");

        let mut train_scores = vec![init_score; num_rows];
        let mut valid_scores = vec![init_score; valid.len()];
        let mut gradients = vec![0.0; num_rows];
        let mut hessians = vec![0.0; num_rows];

        let mut bag_rng = StdRng::seed_from_u64(params.bagging_seed);
        let mut feature_rng = StdRng::seed_from_u64(params.feature_fraction_seed);
        let bag_size = ((params.bagging_fraction * num_rows as f64) as usize).clamp(1, num_rows);
        let feature_count =
            ((params.feature_fraction * num_features as f64).round() as usize).clamp(1, num_features);
        let mut bag: Vec<u32> = (0..num_rows as u32).collect();

        let learner = TreeLearner::new(params, &mappers, &train_bins);
        let mut stopper = EarlyStopping::new(params.early_stopping_rounds);
        let mut history = EvaluationHistory::new();
        let mut trees = Vec::new();

        for round in 0..params.num_boost_round {
            for (i, (&y, &score)) in train.labels().iter().zip(&train_scores).enumerate() {
                let p = sigmoid(score);
                gradients[i] = p - y;
                hessians[i] = p * (1.0 - p);
            }

            if params.rebag_at(round) {
                bag = sorted_sample(&mut bag_rng, num_rows, bag_size)
                    .into_iter()
                    .map(|r| r as u32)
                    .collect();
            }
            let features: Vec<usize> = if feature_count < num_features {
                sorted_sample(&mut feature_rng, num_features, feature_count)
            } else {
                (0..num_features).collect()
            };

            let tree = learner.grow(&gradients, &hessians, bag.clone(), &features);
            apply_tree(&tree, &train_bins, &mut train_scores);
            apply_tree(&tree, &valid_bins, &mut valid_scores);
            trees.push(tree);

            let metrics = RoundMetrics {
                train_logloss: binary_logloss(train.labels(), &train_scores),
                val_logloss: binary_logloss(valid.labels(), &valid_scores),
                train_auc: auc(train.labels(), &train_scores),
                val_auc: auc(valid.labels(), &valid_scores),
            };
            debug!(
                round = round + 1,
                train_logloss = metrics.train_logloss,
                val_logloss = metrics.val_logloss,
                train_auc = metrics.train_auc,
                val_auc = metrics.val_auc,
                "Evaluated round"
            );
            history.push(metrics);

            if stopper.update(round, metrics.val_logloss) {
                info!(
                    best_iteration = stopper.best_iteration(),
                    val_logloss = stopper.best_score(),
                    "Early stopping"
                );
                break;
            }
        }

        let best_iteration = stopper.best_iteration();
        trees.truncate(best_iteration);

        let model = GbdtModel {
            feature_names: train.feature_names().iter().map(|n| n.to_string()).collect(),
            feature_infos: mappers.iter().map(|m| m.feature_info()).collect(),
            init_score,
            trees,
            params: params.clone(),
        };

        Ok(Fitted {
            model,
            history,
            best_iteration,
        })
    }
}
