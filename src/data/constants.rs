/// Feature columns in file order, after the label column.
pub const FEATURE_NAMES: [&str; 10] = [
    "aliveCt",
    "aliveT",
    "meanHealthCt",
    "meanHealthT",
    "meanValueCT",
    "meanValueT",
    "roundTime",
    "bombTime",
    "bombDefusing",
    "bombDefused",
];

/// Number of feature columns.
pub const NUM_FEATURES: usize = FEATURE_NAMES.len();

/// Label column plus features.
pub const NUM_COLUMNS: usize = NUM_FEATURES + 1;

/// Features treated as categorical by the booster.
pub const CATEGORICAL_FEATURES: [&str; 2] = ["bombDefusing", "bombDefused"];

/// Histogram bin ceiling per feature, aligned with `FEATURE_NAMES`.
///
/// Alive counts only take 0..=5, the bomb flags are binary.
pub const MAX_BIN_BY_FEATURE: [u32; NUM_FEATURES] = [6, 6, 255, 255, 255, 255, 255, 255, 2, 2];

/// Column indices of the categorical features within `FEATURE_NAMES`.
pub fn categorical_indices() -> Vec<usize> {
    FEATURE_NAMES
        .iter()
        .enumerate()
        .filter(|(_, name)| CATEGORICAL_FEATURES.contains(name))
        .map(|(idx, _)| idx)
        .collect()
}
