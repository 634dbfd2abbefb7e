use std::path::PathBuf;

use clap::Parser;

/// Hyperparameter search for the round-outcome gradient-boosted classifier.
///
/// Trains one model per trial, keeps every model and training curve, and
/// promotes the best model to LightGBM_model.txt.
#[derive(Parser, Debug)]
#[command(name = "train_lightgbm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Training data CSV (header row, label column, then the ten features).
    #[arg(short, long, value_parser = existing_file)]
    pub train: PathBuf,

    /// Validation data CSV, same layout as the training data.
    #[arg(short, long, value_parser = existing_file)]
    pub val: PathBuf,

    /// Number of search trials to run.
    #[arg(short, long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
    pub num_trials: u32,
}

/// Accept only paths to existing files, resolved to absolute form.
fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if !path.is_file() {
        return Err(format!("file {:?} does not exist", value));
    }
    path.canonicalize()
        .map_err(|e| format!("cannot resolve {:?}: {}", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parses_all_options() {
        let train = NamedTempFile::new().unwrap();
        let val = NamedTempFile::new().unwrap();
        let cli = Cli::try_parse_from([
            "train_lightgbm",
            "-t",
            train.path().to_str().unwrap(),
            "--val",
            val.path().to_str().unwrap(),
            "-n",
            "3",
        ])
        .unwrap();

        assert_eq!(cli.num_trials, 3);
        assert!(cli.train.is_absolute());
        assert_eq!(cli.val, val.path().canonicalize().unwrap());
    }

    #[test]
    fn test_num_trials_defaults_to_100() {
        let train = NamedTempFile::new().unwrap();
        let cli = Cli::try_parse_from([
            "train_lightgbm",
            "--train",
            train.path().to_str().unwrap(),
            "--val",
            train.path().to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(cli.num_trials, 100);
    }

    #[test]
    fn test_rejects_missing_file() {
        let val = NamedTempFile::new().unwrap();
        let result = Cli::try_parse_from([
            "train_lightgbm",
            "--train",
            "/definitely/not/here.csv",
            "--val",
            val.path().to_str().unwrap(),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_trials() {
        let train = NamedTempFile::new().unwrap();
        let path = train.path().to_str().unwrap();
        let result = Cli::try_parse_from(["train_lightgbm", "-t", path, "-v", path, "-n", "0"]);
        assert!(result.is_err());
    }
}
