use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TunerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    /// Binary log-loss on 0/1 labels.
    Binary,
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::Binary => f.write_str("binary"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoostingType {
    /// Plain gradient-boosted trees.
    Gbdt,
}

impl fmt::Display for BoostingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoostingType::Gbdt => f.write_str("gbdt"),
        }
    }
}

/// Full configuration of one booster training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterParams {
    pub objective: Objective,
    pub boosting_type: BoostingType,
    pub metric: Vec<String>,
    pub learning_rate: f64,
    pub num_leaves: usize,
    pub max_depth: usize,
    pub feature_fraction: f64,
    pub bagging_fraction: f64,
    pub bagging_freq: usize,
    pub min_child_samples: usize,
    /// Minimum hessian sum on each side of a split.
    pub min_sum_hessian_in_leaf: f64,
    pub max_bin_by_feature: Vec<u32>,
    pub categorical_feature: Vec<usize>,
    pub num_boost_round: usize,
    pub early_stopping_rounds: usize,
    pub bagging_seed: u64,
    pub feature_fraction_seed: u64,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            objective: Objective::Binary,
            boosting_type: BoostingType::Gbdt,
            metric: vec!["binary_logloss".to_string(), "auc".to_string()],
            learning_rate: 0.1,
            num_leaves: 31,
            max_depth: 16,
            feature_fraction: 1.0,
            bagging_fraction: 1.0,
            bagging_freq: 0,
            min_child_samples: 20,
            min_sum_hessian_in_leaf: 1e-3,
            max_bin_by_feature: Vec::new(),
            categorical_feature: Vec::new(),
            num_boost_round: 100,
            early_stopping_rounds: 50,
            bagging_seed: 3,
            feature_fraction_seed: 2,
        }
    }
}

impl BoosterParams {
    /// Reject configurations the learner cannot run with.
    pub fn validate(&self) -> Result<()> {
        let fail = |message: String| Err(TunerError::Parameter(message));

        if !(self.learning_rate > 0.0) {
            return fail(format!("learning_rate must be positive, got {}", self.learning_rate));
        }
        if self.num_leaves < 2 {
            return fail(format!("num_leaves must be at least 2, got {}", self.num_leaves));
        }
        if self.max_depth == 0 {
            return fail("max_depth must be at least 1".to_string());
        }
        for (name, value) in [
            ("feature_fraction", self.feature_fraction),
            ("bagging_fraction", self.bagging_fraction),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return fail(format!("{} must be in (0, 1], got {}", name, value));
            }
        }
        if self.min_child_samples == 0 {
            return fail("min_child_samples must be at least 1".to_string());
        }
        if self.max_bin_by_feature.iter().any(|&b| b < 2) {
            return fail("every max_bin_by_feature entry must be at least 2".to_string());
        }
        if self.num_boost_round == 0 {
            return fail("num_boost_round must be at least 1".to_string());
        }
        if self.early_stopping_rounds == 0 {
            return fail("early_stopping_rounds must be at least 1".to_string());
        }
        Ok(())
    }

    /// Histogram bin ceiling for one feature; 255 when not configured.
    pub fn max_bin(&self, feature: usize) -> usize {
        self.max_bin_by_feature
            .get(feature)
            .map(|&b| b as usize)
            .unwrap_or(255)
    }

    pub fn is_categorical(&self, feature: usize) -> bool {
        self.categorical_feature.contains(&feature)
    }

    /// Whether the bag is redrawn before the given zero-based round.
    pub fn rebag_at(&self, round: usize) -> bool {
        self.bagging_freq > 0 && self.bagging_fraction < 1.0 && round % self.bagging_freq == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(BoosterParams::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_single_leaf() {
        let params = BoosterParams {
            num_leaves: 1,
            ..BoosterParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_fraction() {
        let params = BoosterParams {
            bagging_fraction: 0.0,
            ..BoosterParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rebag_schedule() {
        let params = BoosterParams {
            bagging_fraction: 0.8,
            bagging_freq: 3,
            ..BoosterParams::default()
        };
        let rounds: Vec<usize> = (0..10).filter(|&r| params.rebag_at(r)).collect();
        assert_eq!(rounds, vec![0, 3, 6, 9]);

        let no_bagging = BoosterParams {
            bagging_fraction: 1.0,
            bagging_freq: 3,
            ..BoosterParams::default()
        };
        assert!(!no_bagging.rebag_at(0));
    }

    #[test]
    fn test_serializes_enums_lowercase() {
        let json = serde_json::to_value(BoosterParams::default()).unwrap();
        assert_eq!(json["objective"], "binary");
        assert_eq!(json["boosting_type"], "gbdt");
    }
}
