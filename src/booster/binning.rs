//! Discretization of raw feature values into histogram bins.

use crate::data::Dataset;

/// How a feature's bins are interpreted by splits.
#[derive(Debug, Clone, PartialEq)]
pub enum BinKind {
    /// Ordered bins; bin `i` holds values `<= upper_bounds[i]`.
    Numerical { upper_bounds: Vec<f64> },
    /// One bin per known category plus a trailing bin for everything else.
    Categorical { categories: Vec<i64> },
}

/// Maps one feature's raw values to bin indices.
#[derive(Debug, Clone, PartialEq)]
pub struct BinMapper {
    kind: BinKind,
    min_value: f64,
    max_value: f64,
}

impl BinMapper {
    /// Build a mapper from training values.
    pub fn fit(values: &[f64], max_bin: usize, categorical: bool) -> Self {
        let max_bin = max_bin.max(2);
        let min_value = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max_value = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let kind = if categorical {
            BinKind::Categorical {
                categories: top_categories(values, max_bin),
            }
        } else {
            BinKind::Numerical {
                upper_bounds: numerical_bounds(values, max_bin),
            }
        };

        Self {
            kind,
            min_value,
            max_value,
        }
    }

    pub fn kind(&self) -> &BinKind {
        &self.kind
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self.kind, BinKind::Categorical { .. })
    }

    pub fn num_bins(&self) -> usize {
        match &self.kind {
            BinKind::Numerical { upper_bounds } => upper_bounds.len(),
            BinKind::Categorical { categories } => categories.len() + 1,
        }
    }

    /// Bin index for a raw value.
    pub fn bin(&self, value: f64) -> u16 {
        match &self.kind {
            BinKind::Numerical { upper_bounds } => {
                let idx = upper_bounds.partition_point(|bound| *bound < value);
                idx.min(upper_bounds.len() - 1) as u16
            }
            BinKind::Categorical { categories } => as_category(value)
                .and_then(|c| categories.binary_search(&c).ok())
                .unwrap_or(categories.len()) as u16,
        }
    }

    /// Raw split value for a bin: the upper bound for numerical features,
    /// the category for categorical ones.
    ///
    /// Returns `None` for bins that cannot anchor a split.
    pub fn split_value(&self, bin: u16) -> Option<f64> {
        let bin = bin as usize;
        match &self.kind {
            BinKind::Numerical { upper_bounds } => upper_bounds
                .get(bin)
                .copied()
                .filter(|bound| bound.is_finite()),
            BinKind::Categorical { categories } => categories.get(bin).map(|&c| c as f64),
        }
    }

    /// Summary written to the model header.
    pub fn feature_info(&self) -> String {
        match &self.kind {
            BinKind::Numerical { .. } => format!("[{}:{}]", self.min_value, self.max_value),
            BinKind::Categorical { categories } => categories
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(":"),
        }
    }
}

fn as_category(value: f64) -> Option<i64> {
    if value >= 0.0 && value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

/// Most frequent non-negative integer categories, at most `max_bin`, sorted.
fn top_categories(values: &[f64], max_bin: usize) -> Vec<i64> {
    let mut seen: Vec<i64> = values.iter().filter_map(|v| as_category(*v)).collect();
    seen.sort_unstable();

    let mut counts: Vec<(i64, usize)> = Vec::new();
    for c in seen {
        match counts.last_mut() {
            Some((last, n)) if *last == c => *n += 1,
            _ => counts.push((c, 1)),
        }
    }

    // Most frequent first; ties keep the smaller category.
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    counts.truncate(max_bin);

    let mut categories: Vec<i64> = counts.into_iter().map(|(c, _)| c).collect();
    categories.sort_unstable();
    categories
}

/// Upper bounds of at most `max_bin` numerical bins.
///
/// With few distinct values every value gets a bin; otherwise cut points are
/// taken at evenly spaced quantiles. Bounds sit halfway between neighbouring
/// distinct values and the last bound is infinite.
fn numerical_bounds(values: &[f64], max_bin: usize) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut distinct = sorted.clone();
    distinct.dedup();

    if distinct.is_empty() {
        return vec![f64::INFINITY];
    }

    let mut bounds: Vec<f64> = if distinct.len() <= max_bin {
        distinct.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    } else {
        let n = sorted.len();
        let mut cuts: Vec<f64> = (1..max_bin).map(|i| sorted[i * n / max_bin]).collect();
        cuts.dedup();
        cuts.into_iter()
            .filter_map(|cut| {
                let pos = distinct.partition_point(|v| *v < cut);
                (pos > 0).then(|| (distinct[pos - 1] + cut) / 2.0)
            })
            .collect()
    };

    bounds.dedup();
    bounds.push(f64::INFINITY);
    bounds
}

/// A dataset's features converted to bin indices, column-major.
#[derive(Debug, Clone)]
pub struct BinnedMatrix {
    columns: Vec<Vec<u16>>,
    num_rows: usize,
}

impl BinnedMatrix {
    pub fn new(data: &Dataset, mappers: &[BinMapper]) -> Self {
        let columns = mappers
            .iter()
            .enumerate()
            .map(|(feature, mapper)| data.column(feature).iter().map(|v| mapper.bin(*v)).collect())
            .collect();

        Self {
            columns,
            num_rows: data.len(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn column(&self, feature: usize) -> &[u16] {
        &self.columns[feature]
    }

    pub fn get(&self, row: usize, feature: usize) -> u16 {
        self.columns[feature][row]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_few_distinct_values_get_own_bins() {
        let values = [0.0, 1.0, 2.0, 2.0, 5.0, 3.0, 4.0];
        let mapper = BinMapper::fit(&values, 6, false);

        assert_eq!(mapper.num_bins(), 6);
        assert_eq!(mapper.bin(0.0), 0);
        assert_eq!(mapper.bin(2.0), 2);
        assert_eq!(mapper.bin(5.0), 5);
        // Unseen values fall into the neighbouring bin.
        assert_eq!(mapper.bin(2.4), 2);
        assert_eq!(mapper.bin(2.6), 3);
        assert_eq!(mapper.bin(100.0), 5);
        assert_eq!(mapper.split_value(0), Some(0.5));
        assert_eq!(mapper.split_value(5), None);
    }

    #[test]
    fn test_many_distinct_values_capped_at_max_bin() {
        let values: Vec<f64> = (0..1000).map(|i| i as f64 * 0.37).collect();
        let mapper = BinMapper::fit(&values, 16, false);

        assert!(mapper.num_bins() <= 16);
        assert!(mapper.num_bins() > 8);

        // Bins are monotone in the raw value.
        let mut last = 0;
        for v in &values {
            let b = mapper.bin(*v);
            assert!(b >= last);
            last = b;
        }
    }

    #[test]
    fn test_bin_threshold_agrees_with_raw_comparison() {
        let values: Vec<f64> = (0..500).map(|i| ((i * 7919) % 211) as f64).collect();
        let mapper = BinMapper::fit(&values, 32, false);

        for bin in 0..mapper.num_bins() as u16 {
            if let Some(threshold) = mapper.split_value(bin) {
                for v in &values {
                    assert_eq!(mapper.bin(*v) <= bin, *v <= threshold);
                }
            }
        }
    }

    #[test]
    fn test_categorical_bins() {
        let values = [0.0, 1.0, 1.0, 0.0, 1.0];
        let mapper = BinMapper::fit(&values, 2, true);

        assert!(mapper.is_categorical());
        assert_eq!(mapper.num_bins(), 3);
        assert_eq!(mapper.bin(0.0), 0);
        assert_eq!(mapper.bin(1.0), 1);
        assert_eq!(mapper.bin(7.0), 2);
        assert_eq!(mapper.bin(-1.0), 2);
        assert_eq!(mapper.bin(0.5), 2);
        assert_eq!(mapper.split_value(1), Some(1.0));
        assert_eq!(mapper.split_value(2), None);
        assert_eq!(mapper.feature_info(), "0:1");
    }

    #[test]
    fn test_categorical_keeps_most_frequent() {
        let values = [3.0, 3.0, 3.0, 9.0, 9.0, 4.0];
        let mapper = BinMapper::fit(&values, 2, true);
        assert_eq!(
            mapper.kind(),
            &BinKind::Categorical {
                categories: vec![3, 9]
            }
        );
        assert_eq!(mapper.bin(4.0), 2);
    }

    #[test]
    fn test_constant_feature_has_single_bin() {
        let mapper = BinMapper::fit(&[4.0; 10], 255, false);
        assert_eq!(mapper.num_bins(), 1);
        assert_eq!(mapper.bin(4.0), 0);
    }
}
