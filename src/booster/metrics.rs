use serde::{Deserialize, Serialize};

/// Probabilities are clipped away from 0 and 1 before taking logs.
const PROB_EPSILON: f64 = 1e-15;

pub fn sigmoid(score: f64) -> f64 {
    1.0 / (1.0 + (-score).exp())
}

/// Mean binary cross-entropy of raw scores against 0/1 labels.
pub fn binary_logloss(labels: &[f64], scores: &[f64]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let total: f64 = labels
        .iter()
        .zip(scores)
        .map(|(&y, &s)| {
            let p = sigmoid(s).clamp(PROB_EPSILON, 1.0 - PROB_EPSILON);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    total / labels.len() as f64
}

/// Area under the ROC curve.
///
/// Tied scores share their average rank. A set holding a single class scores
/// 1.0.
pub fn auc(labels: &[f64], scores: &[f64]) -> f64 {
    let n = labels.len();
    let positives = labels.iter().filter(|&&y| y > 0.5).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return 1.0;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; the tie group spans start+1..=end.
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let group_positives = order[start..end]
            .iter()
            .filter(|&&i| labels[i] > 0.5)
            .count();
        positive_rank_sum += avg_rank * group_positives as f64;
        start = end;
    }

    let p = positives as f64;
    let q = negatives as f64;
    (positive_rank_sum - p * (p + 1.0) / 2.0) / (p * q)
}

/// Metrics recorded after one boosting round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundMetrics {
    pub train_logloss: f64,
    pub val_logloss: f64,
    pub train_auc: f64,
    pub val_auc: f64,
}

/// Per-round metrics in the order rounds were run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationHistory {
    rounds: Vec<RoundMetrics>,
}

impl EvaluationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, metrics: RoundMetrics) {
        self.rounds.push(metrics);
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn rounds(&self) -> &[RoundMetrics] {
        &self.rounds
    }

    /// Metrics after the given one-based iteration.
    pub fn at_iteration(&self, iteration: usize) -> Option<&RoundMetrics> {
        iteration.checked_sub(1).and_then(|idx| self.rounds.get(idx))
    }
}

/// Stops training once the monitored score has not strictly improved for
/// `patience` consecutive rounds.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    best_score: f64,
    best_round: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best_score: f64::INFINITY,
            best_round: 0,
        }
    }

    /// Record the score of a zero-based round; returns true when training
    /// should stop.
    pub fn update(&mut self, round: usize, score: f64) -> bool {
        if score < self.best_score {
            self.best_score = score;
            self.best_round = round;
        }
        round - self.best_round >= self.patience
    }

    /// One-based iteration of the best score.
    pub fn best_iteration(&self) -> usize {
        self.best_round + 1
    }

    pub fn best_score(&self) -> f64 {
        self.best_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::*;

    #[test]
    fn test_logloss_at_zero_score_is_ln2() {
        let loss = binary_logloss(&[1.0, 0.0], &[0.0, 0.0]);
        assert_float_absolute_eq!(loss, std::f64::consts::LN_2, 1e-12);
    }

    #[test]
    fn test_logloss_is_finite_for_confident_mistakes() {
        let loss = binary_logloss(&[1.0], &[-1000.0]);
        assert!(loss.is_finite());
        assert_float_absolute_eq!(loss, -(PROB_EPSILON.ln()), 1e-6);
    }

    #[test]
    fn test_auc_perfect_and_inverted() {
        let labels = [0.0, 0.0, 1.0, 1.0];
        assert_float_absolute_eq!(auc(&labels, &[0.1, 0.2, 0.8, 0.9]), 1.0, 1e-12);
        assert_float_absolute_eq!(auc(&labels, &[0.9, 0.8, 0.2, 0.1]), 0.0, 1e-12);
    }

    #[test]
    fn test_auc_ties_count_half() {
        let labels = [0.0, 1.0];
        assert_float_absolute_eq!(auc(&labels, &[0.5, 0.5]), 0.5, 1e-12);

        let labels = [0.0, 0.0, 1.0, 1.0];
        // One positive ties one negative, the other positive is ranked above.
        assert_float_absolute_eq!(auc(&labels, &[0.1, 0.4, 0.4, 0.9]), 0.875, 1e-12);
    }

    #[test]
    fn test_auc_single_class_is_one() {
        assert_eq!(auc(&[1.0, 1.0], &[0.3, 0.4]), 1.0);
    }

    #[test]
    fn test_early_stopping_waits_for_patience() {
        let mut stopper = EarlyStopping::new(3);
        let scores = [0.9, 0.8, 0.7, 0.75, 0.7, 0.71];
        let mut stopped_at = None;
        for (round, score) in scores.iter().enumerate() {
            if stopper.update(round, *score) {
                stopped_at = Some(round);
                break;
            }
        }
        // Equal score at round 4 is not an improvement.
        assert_eq!(stopped_at, Some(5));
        assert_eq!(stopper.best_iteration(), 3);
        assert_eq!(stopper.best_score(), 0.7);
    }

    #[test]
    fn test_history_iteration_lookup() {
        let mut history = EvaluationHistory::new();
        let first = RoundMetrics {
            train_logloss: 0.6,
            val_logloss: 0.65,
            train_auc: 0.7,
            val_auc: 0.68,
        };
        history.push(first);
        assert_eq!(history.at_iteration(1), Some(&first));
        assert_eq!(history.at_iteration(0), None);
        assert_eq!(history.at_iteration(2), None);
    }
}
