pub mod output;
pub mod params;
pub mod sampler;
pub mod search;
pub mod tpe;
pub mod trial;

pub use output::{
    archive_ledger, print_summary, promote_model, publish_results, write_ledger,
    write_trial_history, Publication,
};
pub use params::{FixedParams, HyperparameterSet, ParamDomain, ParamSpec, ParamValue, SearchSpace};
pub use sampler::{RandomSampler, Sampler};
pub use search::{run_search, Study};
pub use tpe::{ParzenEstimator, TpeConfig, TpeSampler};
pub use trial::{execute_trial, TrialRecord};
