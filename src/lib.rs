pub mod booster;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod runner;
pub mod tuner;
pub mod workspace;

pub use config::RunConfig;
pub use error::{Result, TunerError};
pub use runner::{RunReport, TrialRunner};
