pub mod constants;
pub mod dataset;

pub use constants::{
    categorical_indices, CATEGORICAL_FEATURES, FEATURE_NAMES, MAX_BIN_BY_FEATURE, NUM_COLUMNS,
    NUM_FEATURES,
};
pub use dataset::{load_dataset, Dataset};
