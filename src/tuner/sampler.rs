use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::warn;

use crate::tuner::params::{HyperparameterSet, SearchSpace};

/// Proposes hyperparameters and learns from the scores they earn.
///
/// Calls alternate: `propose`, then `report` with the score of that proposal.
/// Lower scores are better.
pub trait Sampler {
    fn propose(&mut self) -> HyperparameterSet;

    fn report(&mut self, score: f64);
}

/// Seeded generator, or one seeded from OS entropy when no seed is given.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Uniform random search; ignores reported scores.
pub struct RandomSampler {
    space: SearchSpace,
    rng: StdRng,
    proposed: usize,
    reported: usize,
}

impl RandomSampler {
    pub fn new(space: SearchSpace, seed: Option<u64>) -> Self {
        Self {
            space,
            rng: seeded_rng(seed),
            proposed: 0,
            reported: 0,
        }
    }
}

impl Sampler for RandomSampler {
    fn propose(&mut self) -> HyperparameterSet {
        self.proposed += 1;
        self.space.sample_uniform(&mut self.rng)
    }

    fn report(&mut self, _score: f64) {
        if self.reported >= self.proposed {
            warn!("Score reported without a pending proposal");
            return;
        }
        self.reported += 1;
    }
}
