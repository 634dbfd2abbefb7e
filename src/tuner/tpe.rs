//! Tree-structured Parzen Estimator sampling.
//!
//! Completed trials are split into a small "good" group and the rest. Each
//! parameter gets one density per group, and the next value is the candidate
//! (drawn from the good density) with the best good/bad density ratio.
//! Parameters are treated independently.

use std::f64::consts::{PI, SQRT_2};

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::Normal;
use tracing::{debug, warn};

use crate::tuner::params::{HyperparameterSet, SearchSpace};
use crate::tuner::sampler::{seeded_rng, Sampler};

/// Rejection attempts before a truncated draw falls back to clamping.
const MAX_REJECTIONS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct TpeConfig {
    /// Trials sampled uniformly before the estimators take over.
    pub n_startup_trials: usize,
    /// Candidates drawn from the good density per parameter.
    pub n_ei_candidates: usize,
    /// Weight of the prior component in each density.
    pub prior_weight: f64,
}

impl Default for TpeConfig {
    fn default() -> Self {
        Self {
            n_startup_trials: 10,
            n_ei_candidates: 24,
            prior_weight: 1.0,
        }
    }
}

/// Size of the "good" group for `n` completed trials.
pub fn gamma(n: usize) -> usize {
    n.div_ceil(10).min(25)
}

fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / SQRT_2))
}

/// Abramowitz and Stegun 7.1.26, absolute error below 1.5e-7.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// Mixture of Gaussians truncated to `[low, high]`: one component per
/// observation plus a broad prior centred on the interval.
#[derive(Debug, Clone)]
pub struct ParzenEstimator {
    low: f64,
    high: f64,
    weights: Vec<f64>,
    mus: Vec<f64>,
    sigmas: Vec<f64>,
}

impl ParzenEstimator {
    pub fn new(observations: &[f64], low: f64, high: f64, prior_weight: f64) -> Self {
        let span = high - low;
        let prior_mu = 0.5 * (low + high);

        // Components sorted by centre so bandwidths can use neighbour gaps.
        let mut components: Vec<(f64, f64, bool)> = observations
            .iter()
            .map(|&mu| (mu, 1.0, false))
            .chain(std::iter::once((prior_mu, prior_weight, true)))
            .collect();
        components.sort_by(|a, b| a.0.total_cmp(&b.0));

        let max_sigma = span;
        let min_sigma = span / (observations.len() as f64 + 1.0).min(100.0);

        let mus: Vec<f64> = components.iter().map(|c| c.0).collect();
        let sigmas = components
            .iter()
            .enumerate()
            .map(|(i, &(mu, _, is_prior))| {
                if is_prior {
                    return max_sigma;
                }
                let prev = if i == 0 { low } else { mus[i - 1] };
                let next = if i + 1 == mus.len() { high } else { mus[i + 1] };
                (mu - prev).max(next - mu).clamp(min_sigma, max_sigma)
            })
            .collect();

        let total: f64 = components.iter().map(|c| c.1).sum();
        let weights = components.iter().map(|c| c.1 / total).collect();

        Self {
            low,
            high,
            weights,
            mus,
            sigmas,
        }
    }

    fn is_degenerate(&self) -> bool {
        !(self.high > self.low)
    }

    /// Draw one value inside `[low, high]`.
    pub fn sample(&self, rng: &mut StdRng) -> f64 {
        if self.is_degenerate() {
            return self.low;
        }

        let component = WeightedIndex::new(&self.weights)
            .map(|dist| dist.sample(rng))
            .unwrap_or(0);
        let mu = self.mus[component];
        let Ok(normal) = Normal::new(mu, self.sigmas[component]) else {
            return mu.clamp(self.low, self.high);
        };

        for _ in 0..MAX_REJECTIONS {
            let x = normal.sample(rng);
            if x >= self.low && x <= self.high {
                return x;
            }
        }
        rng.gen_range(self.low..=self.high)
    }

    /// Log density at `x`.
    pub fn log_pdf(&self, x: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }

        let terms: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.mus)
            .zip(&self.sigmas)
            .map(|((&w, &mu), &sigma)| {
                let z = (x - mu) / sigma;
                let mass = normal_cdf((self.high - mu) / sigma) - normal_cdf((self.low - mu) / sigma);
                w.ln() - 0.5 * z * z - sigma.ln() - 0.5 * (2.0 * PI).ln() - mass.max(1e-12).ln()
            })
            .collect();

        let max = terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return max;
        }
        max + terms.iter().map(|t| (t - max).exp()).sum::<f64>().ln()
    }
}

/// Sequential model-based sampler over a `SearchSpace`.
pub struct TpeSampler {
    space: SearchSpace,
    config: TpeConfig,
    rng: StdRng,
    observations: Vec<(HyperparameterSet, f64)>,
    pending: Option<HyperparameterSet>,
}

impl TpeSampler {
    pub fn new(space: SearchSpace, seed: Option<u64>) -> Self {
        Self {
            space,
            config: TpeConfig::default(),
            rng: seeded_rng(seed),
            observations: Vec::new(),
            pending: None,
        }
    }

    pub fn with_config(mut self, config: TpeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn num_observations(&self) -> usize {
        self.observations.len()
    }

    fn propose_from_history(&mut self) -> HyperparameterSet {
        let n = self.observations.len();
        let n_below = gamma(n);

        // Stable sort keeps trial order among equal scores.
        let mut ranked: Vec<usize> = (0..n).collect();
        ranked.sort_by(|&a, &b| self.observations[a].1.total_cmp(&self.observations[b].1));
        let (below, above) = ranked.split_at(n_below);

        let mut proposal = HyperparameterSet::new();
        for spec in self.space.params() {
            let (low, high) = spec.domain.search_bounds();
            let values_of = |indices: &[usize]| -> Vec<f64> {
                indices
                    .iter()
                    .filter_map(|&i| self.observations[i].0.get(&spec.name))
                    .map(|v| v.as_f64())
                    .collect()
            };

            let good = ParzenEstimator::new(&values_of(below), low, high, self.config.prior_weight);
            let bad = ParzenEstimator::new(&values_of(above), low, high, self.config.prior_weight);

            let mut best_x = good.sample(&mut self.rng);
            let mut best_ratio = good.log_pdf(best_x) - bad.log_pdf(best_x);
            for _ in 1..self.config.n_ei_candidates {
                let x = good.sample(&mut self.rng);
                let ratio = good.log_pdf(x) - bad.log_pdf(x);
                if ratio > best_ratio {
                    best_x = x;
                    best_ratio = ratio;
                }
            }

            proposal.insert(spec.name.clone(), spec.domain.from_search_space(best_x));
        }

        debug!(n_below, n_above = n - n_below, "Sampled from Parzen estimators");
        proposal
    }
}

impl Sampler for TpeSampler {
    fn propose(&mut self) -> HyperparameterSet {
        let proposal = if self.observations.len() < self.config.n_startup_trials {
            self.space.sample_uniform(&mut self.rng)
        } else {
            self.propose_from_history()
        };
        self.pending = Some(proposal.clone());
        proposal
    }

    fn report(&mut self, score: f64) {
        match self.pending.take() {
            Some(params) => self.observations.push((params, score)),
            None => warn!(score, "Score reported without a pending proposal"),
        }
    }
}
