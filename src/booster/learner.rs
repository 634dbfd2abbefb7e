//! Leaf-wise tree growth over binned features.

use crate::booster::binning::{BinMapper, BinnedMatrix};
use crate::booster::params::BoosterParams;
use crate::booster::tree::{Child, SplitNode, SplitRule, Tree};

/// Gradient, hessian and row count accumulated per bin.
#[derive(Debug, Clone, Copy, Default)]
struct BinStats {
    grad: f64,
    hess: f64,
    count: usize,
}

impl BinStats {
    fn add(&mut self, other: BinStats) {
        self.grad += other.grad;
        self.hess += other.hess;
        self.count += other.count;
    }

    fn minus(self, other: BinStats) -> BinStats {
        BinStats {
            grad: self.grad - other.grad,
            hess: self.hess - other.hess,
            count: self.count - other.count,
        }
    }
}

fn leaf_gain(stats: BinStats) -> f64 {
    stats.grad * stats.grad / stats.hess
}

#[derive(Debug, Clone)]
struct SplitCandidate {
    feature: usize,
    bin: u16,
    rule: SplitRule,
    gain: f64,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

#[derive(Debug)]
struct GrowingLeaf {
    rows: Vec<u32>,
    depth: usize,
    stats: BinStats,
    parent: Option<(usize, Side)>,
    best: Option<SplitCandidate>,
}

/// Grows one tree per call from the current gradients.
pub struct TreeLearner<'a> {
    params: &'a BoosterParams,
    mappers: &'a [BinMapper],
    bins: &'a BinnedMatrix,
}

impl<'a> TreeLearner<'a> {
    pub fn new(params: &'a BoosterParams, mappers: &'a [BinMapper], bins: &'a BinnedMatrix) -> Self {
        Self {
            params,
            mappers,
            bins,
        }
    }

    /// Fit a tree to the gradients of `rows`, splitting only on `features`.
    pub fn grow(
        &self,
        gradients: &[f64],
        hessians: &[f64],
        rows: Vec<u32>,
        features: &[usize],
    ) -> Tree {
        let stats = sum_stats(&rows, gradients, hessians);
        let mut root = GrowingLeaf {
            rows,
            depth: 0,
            stats,
            parent: None,
            best: None,
        };
        root.best = self.find_best_split(&root, gradients, hessians, features);

        let mut leaves = vec![root];
        let mut splits: Vec<SplitNode> = Vec::new();

        while leaves.len() < self.params.num_leaves {
            let Some(leaf_idx) = best_leaf(&leaves) else {
                break;
            };
            let Some(candidate) = leaves[leaf_idx].best.take() else {
                break;
            };

            let parent_leaf = &leaves[leaf_idx];
            let (left_rows, right_rows): (Vec<u32>, Vec<u32>) =
                parent_leaf.rows.iter().copied().partition(|&r| {
                    let bin = self.bins.get(r as usize, candidate.feature);
                    match candidate.rule {
                        SplitRule::LessOrEqual => bin <= candidate.bin,
                        SplitRule::CategoryEquals => bin == candidate.bin,
                    }
                });

            let left_stats = sum_stats(&left_rows, gradients, hessians);
            let right_stats = parent_leaf.stats.minus(left_stats);
            let depth = parent_leaf.depth + 1;
            let parent_link = parent_leaf.parent;

            let node_idx = splits.len();
            let new_leaf_idx = leaves.len();
            let threshold = self.mappers[candidate.feature]
                .split_value(candidate.bin)
                .unwrap_or(f64::INFINITY);
            splits.push(SplitNode {
                feature: candidate.feature,
                bin: candidate.bin,
                threshold,
                rule: candidate.rule,
                gain: candidate.gain,
                left: Child::Leaf(leaf_idx),
                right: Child::Leaf(new_leaf_idx),
            });

            if let Some((parent_node, side)) = parent_link {
                match side {
                    Side::Left => splits[parent_node].left = Child::Split(node_idx),
                    Side::Right => splits[parent_node].right = Child::Split(node_idx),
                }
            }

            let mut left = GrowingLeaf {
                rows: left_rows,
                depth,
                stats: left_stats,
                parent: Some((node_idx, Side::Left)),
                best: None,
            };
            let mut right = GrowingLeaf {
                rows: right_rows,
                depth,
                stats: right_stats,
                parent: Some((node_idx, Side::Right)),
                best: None,
            };

            if depth < self.params.max_depth {
                left.best = self.find_best_split(&left, gradients, hessians, features);
                right.best = self.find_best_split(&right, gradients, hessians, features);
            }

            leaves[leaf_idx] = left;
            leaves.push(right);
        }

        let shrinkage = self.params.learning_rate;
        if splits.is_empty() {
            let count = leaves.first().map(|l| l.rows.len()).unwrap_or(0);
            return Tree::constant(0.0, count, shrinkage);
        }

        let leaf_values = leaves
            .iter()
            .map(|leaf| {
                if leaf.stats.hess > 0.0 {
                    -leaf.stats.grad / leaf.stats.hess * shrinkage
                } else {
                    0.0
                }
            })
            .collect();
        let leaf_counts = leaves.iter().map(|leaf| leaf.rows.len()).collect();

        Tree {
            splits,
            leaf_values,
            leaf_counts,
            shrinkage,
        }
    }

    fn find_best_split(
        &self,
        leaf: &GrowingLeaf,
        gradients: &[f64],
        hessians: &[f64],
        features: &[usize],
    ) -> Option<SplitCandidate> {
        let min_count = self.params.min_child_samples;
        let min_hess = self.params.min_sum_hessian_in_leaf;
        if leaf.rows.len() < 2 * min_count || leaf.stats.hess <= 0.0 {
            return None;
        }

        let parent_gain = leaf_gain(leaf.stats);
        let valid = |side: BinStats| side.count >= min_count && side.hess >= min_hess;

        let mut best: Option<SplitCandidate> = None;
        let mut consider = |feature: usize, bin: u16, rule: SplitRule, left: BinStats| {
            let right = leaf.stats.minus(left);
            if !valid(left) || !valid(right) {
                return;
            }
            let gain = leaf_gain(left) + leaf_gain(right) - parent_gain;
            if gain > 0.0 && best.as_ref().is_none_or(|b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    bin,
                    rule,
                    gain,
                });
            }
        };

        for &feature in features {
            let mapper = &self.mappers[feature];
            let num_bins = mapper.num_bins();
            if num_bins < 2 {
                continue;
            }

            let column = self.bins.column(feature);
            let mut histogram = vec![BinStats::default(); num_bins];
            for &r in &leaf.rows {
                let r = r as usize;
                histogram[column[r] as usize].add(BinStats {
                    grad: gradients[r],
                    hess: hessians[r],
                    count: 1,
                });
            }

            if mapper.is_categorical() {
                // One category against the rest; the trailing "other" bin
                // cannot anchor a split.
                for (bin, stats) in histogram.iter().enumerate().take(num_bins - 1) {
                    if stats.count > 0 {
                        consider(feature, bin as u16, SplitRule::CategoryEquals, *stats);
                    }
                }
            } else {
                let mut left = BinStats::default();
                for (bin, stats) in histogram.iter().enumerate().take(num_bins - 1) {
                    left.add(*stats);
                    consider(feature, bin as u16, SplitRule::LessOrEqual, left);
                }
            }
        }

        best
    }
}

fn sum_stats(rows: &[u32], gradients: &[f64], hessians: &[f64]) -> BinStats {
    rows.iter().fold(BinStats::default(), |mut acc, &r| {
        acc.add(BinStats {
            grad: gradients[r as usize],
            hess: hessians[r as usize],
            count: 1,
        });
        acc
    })
}

/// Leaf with the largest pending split gain; the lowest index wins ties.
fn best_leaf(leaves: &[GrowingLeaf]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, leaf) in leaves.iter().enumerate() {
        if let Some(candidate) = &leaf.best {
            if best.is_none_or(|(_, gain)| candidate.gain > gain) {
                best = Some((idx, candidate.gain));
            }
        }
    }
    best.map(|(idx, _)| idx)
}
