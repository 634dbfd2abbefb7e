use std::fmt::Write;

/// Where a split sends a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    Split(usize),
    Leaf(usize),
}

/// Comparison a split applies to its feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitRule {
    /// Left when `value <= threshold`.
    LessOrEqual,
    /// Left when the value is exactly the category stored in `threshold`.
    CategoryEquals,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitNode {
    pub feature: usize,
    /// Bin index the split was found at.
    pub bin: u16,
    /// Raw threshold (or category) matching `bin`.
    pub threshold: f64,
    pub rule: SplitRule,
    pub gain: f64,
    pub left: Child,
    pub right: Child,
}

impl SplitRule {
    /// LightGBM decision type bits: 1 marks a categorical split, 2 sends
    /// missing values left.
    fn decision_type(self) -> u8 {
        match self {
            SplitRule::LessOrEqual => 2,
            SplitRule::CategoryEquals => 1,
        }
    }
}

impl SplitNode {
    fn goes_left_binned(&self, bin: u16) -> bool {
        match self.rule {
            SplitRule::LessOrEqual => bin <= self.bin,
            SplitRule::CategoryEquals => bin == self.bin,
        }
    }

    fn goes_left(&self, value: f64) -> bool {
        match self.rule {
            SplitRule::LessOrEqual => value <= self.threshold,
            SplitRule::CategoryEquals => value == self.threshold,
        }
    }
}

/// One regression tree of the ensemble. Leaf values already include
/// shrinkage.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub splits: Vec<SplitNode>,
    pub leaf_values: Vec<f64>,
    pub leaf_counts: Vec<usize>,
    pub shrinkage: f64,
}

impl Tree {
    /// A tree that outputs the same value for every row.
    pub fn constant(value: f64, count: usize, shrinkage: f64) -> Self {
        Self {
            splits: Vec::new(),
            leaf_values: vec![value],
            leaf_counts: vec![count],
            shrinkage,
        }
    }

    pub fn num_leaves(&self) -> usize {
        self.leaf_values.len()
    }

    fn leaf_by(&self, mut goes_left: impl FnMut(&SplitNode) -> bool) -> usize {
        if self.splits.is_empty() {
            return 0;
        }
        let mut node = 0;
        loop {
            let split = &self.splits[node];
            let next = if goes_left(split) { split.left } else { split.right };
            match next {
                Child::Split(idx) => node = idx,
                Child::Leaf(idx) => return idx,
            }
        }
    }

    /// Leaf reached by a row given as per-feature bin indices.
    pub fn leaf_for_bins(&self, bin_of: impl Fn(usize) -> u16) -> usize {
        self.leaf_by(|split| split.goes_left_binned(bin_of(split.feature)))
    }

    /// Output for a row of raw feature values.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let leaf = self.leaf_by(|split| split.goes_left(features[split.feature]));
        self.leaf_values[leaf]
    }

    /// Encode children the way the text model expects: split nodes as their
    /// index, leaves as `-(leaf + 1)`.
    fn encode_child(child: Child) -> i64 {
        match child {
            Child::Split(idx) => idx as i64,
            Child::Leaf(idx) => -(idx as i64) - 1,
        }
    }

    /// Split thresholds as written to the text model, plus the categorical
    /// tables.
    ///
    /// Numerical splits keep their raw threshold. A categorical split stores
    /// the index of its bitset instead; `cat_boundaries[k]..cat_boundaries[k + 1]`
    /// delimits bitset `k` within `cat_threshold`.
    fn encoded_thresholds(&self) -> (Vec<String>, Vec<usize>, Vec<u32>) {
        let mut thresholds = Vec::with_capacity(self.splits.len());
        let mut cat_boundaries = vec![0];
        let mut cat_threshold = Vec::new();

        for split in &self.splits {
            match split.rule {
                SplitRule::LessOrEqual => thresholds.push(split.threshold.to_string()),
                SplitRule::CategoryEquals => {
                    thresholds.push((cat_boundaries.len() - 1).to_string());
                    cat_threshold.extend(category_bitset(split.threshold as u32));
                    cat_boundaries.push(cat_threshold.len());
                }
            }
        }

        (thresholds, cat_boundaries, cat_threshold)
    }

    /// Write this tree as a LightGBM `Tree=` block. `bias` is added to every
    /// leaf.
    pub fn write_text(&self, index: usize, bias: f64, out: &mut String) {
        fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
            items.map(|i| i.to_string()).collect::<Vec<_>>().join(" ")
        }

        let (thresholds, cat_boundaries, cat_threshold) = self.encoded_thresholds();
        let num_cat = cat_boundaries.len() - 1;

        let _ = writeln!(out, "Tree={}", index);
        let _ = writeln!(out, "num_leaves={}", self.num_leaves());
        let _ = writeln!(out, "num_cat={}", num_cat);
        if !self.splits.is_empty() {
            let _ = writeln!(out, "split_feature={}", join(self.splits.iter().map(|s| s.feature)));
            let _ = writeln!(out, "split_gain={}", join(self.splits.iter().map(|s| s.gain)));
            let _ = writeln!(out, "threshold={}", thresholds.join(" "));
            let _ = writeln!(
                out,
                "decision_type={}",
                join(self.splits.iter().map(|s| s.rule.decision_type()))
            );
            let _ = writeln!(
                out,
                "left_child={}",
                join(self.splits.iter().map(|s| Self::encode_child(s.left)))
            );
            let _ = writeln!(
                out,
                "right_child={}",
                join(self.splits.iter().map(|s| Self::encode_child(s.right)))
            );
        }
        let _ = writeln!(
            out,
            "leaf_value={}",
            join(self.leaf_values.iter().map(|v| v + bias))
        );
        let _ = writeln!(out, "leaf_count={}", join(self.leaf_counts.iter()));
        if num_cat > 0 {
            let _ = writeln!(out, "cat_boundaries={}", join(cat_boundaries.iter()));
            let _ = writeln!(out, "cat_threshold={}", join(cat_threshold.iter()));
        }
        let _ = writeln!(out, "shrinkage={}", self.shrinkage);
        out.push('\n');
    }
}

/// 32-bit words with only `category`'s bit set; rows whose category bit is
/// set go left.
fn category_bitset(category: u32) -> Vec<u32> {
    let word = (category / 32) as usize;
    let mut bits = vec![0u32; word + 1];
    bits[word] = 1 << (category % 32);
    bits
}
