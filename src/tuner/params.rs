use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::booster::{BoosterParams, BoostingType, Objective};
use crate::data::{categorical_indices, MAX_BIN_BY_FEATURE};
use crate::error::{Result, TunerError};

/// A single sampled value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
}

impl ParamValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            ParamValue::Int(v) => *v as f64,
            ParamValue::Float(v) => *v,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Sampled hyperparameters for one trial, keyed by name.
///
/// Iteration order is alphabetical by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HyperparameterSet {
    values: BTreeMap<String, ParamValue>,
}

impl HyperparameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Integer parameter, rejected if missing, fractional or negative.
    pub fn get_count(&self, name: &str) -> Result<usize> {
        match self.get(name) {
            Some(ParamValue::Int(v)) => usize::try_from(v)
                .map_err(|_| TunerError::Parameter(format!("{} must be non-negative, got {}", name, v))),
            Some(ParamValue::Float(v)) => Err(TunerError::Parameter(format!(
                "{} must be an integer, got {}",
                name, v
            ))),
            None => Err(TunerError::Parameter(format!("{} was not sampled", name))),
        }
    }

    pub fn get_float(&self, name: &str) -> Result<f64> {
        self.get(name)
            .map(|v| v.as_f64())
            .ok_or_else(|| TunerError::Parameter(format!("{} was not sampled", name)))
    }

    /// Format as a compact string for display.
    pub fn display(&self) -> String {
        self.iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Range a parameter is sampled from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDomain {
    /// Integer in `low..=high`.
    Int { low: i64, high: i64 },
    /// Uniform float in `[low, high]`.
    Float { low: f64, high: f64 },
}

impl ParamDomain {
    /// Draw a value uniformly from the domain.
    pub fn sample_uniform(&self, rng: &mut impl Rng) -> ParamValue {
        match *self {
            ParamDomain::Int { low, high } => ParamValue::Int(rng.gen_range(low..=high)),
            ParamDomain::Float { low, high } => ParamValue::Float(rng.gen_range(low..=high)),
        }
    }

    /// Continuous interval the density estimators work on.
    ///
    /// Integers are widened by half a step on each side so every integer owns
    /// an equal share of the interval.
    pub fn search_bounds(&self) -> (f64, f64) {
        match *self {
            ParamDomain::Int { low, high } => (low as f64 - 0.5, high as f64 + 0.5),
            ParamDomain::Float { low, high } => (low, high),
        }
    }

    /// Map a point of `search_bounds` back onto the domain.
    pub fn from_search_space(&self, x: f64) -> ParamValue {
        match *self {
            ParamDomain::Int { low, high } => ParamValue::Int((x.round() as i64).clamp(low, high)),
            ParamDomain::Float { low, high } => ParamValue::Float(x.clamp(low, high)),
        }
    }

    pub fn contains(&self, value: ParamValue) -> bool {
        match (*self, value) {
            (ParamDomain::Int { low, high }, ParamValue::Int(v)) => (low..=high).contains(&v),
            (ParamDomain::Float { low, high }, ParamValue::Float(v)) => v >= low && v <= high,
            _ => false,
        }
    }
}

/// One named, sampled parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub domain: ParamDomain,
}

/// The parameters a sampler proposes, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpace {
    params: Vec<ParamSpec>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    pub fn add_int(mut self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            domain: ParamDomain::Int { low, high },
        });
        self
    }

    pub fn add_float(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            domain: ParamDomain::Float { low, high },
        });
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn dim(&self) -> usize {
        self.params.len()
    }

    /// Sample every parameter uniformly.
    pub fn sample_uniform(&self, rng: &mut impl Rng) -> HyperparameterSet {
        self.params
            .iter()
            .fold(HyperparameterSet::new(), |set, spec| {
                set.with(spec.name.clone(), spec.domain.sample_uniform(rng))
            })
    }

    /// Check that a set holds exactly this space's parameters, each in range.
    pub fn contains(&self, set: &HyperparameterSet) -> bool {
        set.len() == self.params.len()
            && self
                .params
                .iter()
                .all(|spec| set.get(&spec.name).is_some_and(|v| spec.domain.contains(v)))
    }
}

impl Default for SearchSpace {
    /// The booster's tunable parameters and their ranges.
    fn default() -> Self {
        Self::new()
            .add_int("num_leaves", 7, 256)
            .add_int("max_depth", 2, 128)
            .add_float("feature_fraction", 0.7, 1.0)
            .add_float("bagging_fraction", 0.7, 1.0)
            .add_int("bagging_freq", 1, 10)
            .add_int("min_child_samples", 5, 300)
    }
}

/// Parameters shared by every trial.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedParams {
    pub objective: Objective,
    pub boosting_type: BoostingType,
    pub learning_rate: f64,
    pub max_bin_by_feature: Vec<u32>,
    pub categorical_feature: Vec<usize>,
    /// Boosting-round ceiling.
    pub num_boost_round: usize,
    /// Rounds without validation improvement before training stops.
    pub early_stopping_rounds: usize,
}

impl Default for FixedParams {
    fn default() -> Self {
        Self {
            objective: Objective::Binary,
            boosting_type: BoostingType::Gbdt,
            learning_rate: 0.01,
            max_bin_by_feature: MAX_BIN_BY_FEATURE.to_vec(),
            categorical_feature: categorical_indices(),
            num_boost_round: 100_000,
            early_stopping_rounds: 50,
        }
    }
}

impl FixedParams {
    /// Merge with one trial's sampled values into a full booster configuration.
    pub fn compose(&self, sampled: &HyperparameterSet) -> Result<BoosterParams> {
        let params = BoosterParams {
            objective: self.objective,
            boosting_type: self.boosting_type,
            learning_rate: self.learning_rate,
            num_leaves: sampled.get_count("num_leaves")?,
            max_depth: sampled.get_count("max_depth")?,
            feature_fraction: sampled.get_float("feature_fraction")?,
            bagging_fraction: sampled.get_float("bagging_fraction")?,
            bagging_freq: sampled.get_count("bagging_freq")?,
            min_child_samples: sampled.get_count("min_child_samples")?,
            max_bin_by_feature: self.max_bin_by_feature.clone(),
            categorical_feature: self.categorical_feature.clone(),
            num_boost_round: self.num_boost_round,
            early_stopping_rounds: self.early_stopping_rounds,
            ..BoosterParams::default()
        };
        params.validate()?;
        Ok(params)
    }
}
