use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::booster::EvaluationHistory;
use crate::error::{Result, TunerError};
use crate::tuner::search::Study;
use crate::tuner::trial::TrialRecord;
use crate::workspace::Workspace;

/// Archive timestamp format, e.g. `2024-05-01_13-45-00`.
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

const LEDGER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

fn create_file(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| TunerError::Publish {
        path: path.to_path_buf(),
        source,
    })
}

/// Write one row per boosting round, numbered from 0.
pub fn write_trial_history(history: &EvaluationHistory, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|source| TunerError::Workspace {
        path: path.to_path_buf(),
        source,
    })?;
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record(["round", "train_logloss", "val_logloss", "train_auc", "val_auc"])?;
    for (round, m) in history.rounds().iter().enumerate() {
        wtr.write_record([
            round.to_string(),
            m.train_logloss.to_string(),
            m.val_logloss.to_string(),
            m.train_auc.to_string(),
            m.val_auc.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the search ledger: one row per trial with its score, timing and
/// every sampled parameter.
pub fn write_ledger(study: &Study, path: &Path) -> Result<()> {
    let param_names: BTreeSet<&str> = study
        .trials()
        .iter()
        .flat_map(|t| t.params.iter().map(|(name, _)| name))
        .collect();

    let mut wtr = csv::Writer::from_writer(create_file(path)?);

    let mut header = vec![
        "number".to_string(),
        "value".to_string(),
        "datetime_start".to_string(),
        "datetime_complete".to_string(),
        "duration_secs".to_string(),
    ];
    header.extend(param_names.iter().map(|name| format!("params_{}", name)));
    header.push("state".to_string());
    wtr.write_record(&header)?;

    for trial in study.trials() {
        let mut row = vec![
            trial.number.to_string(),
            trial.value.to_string(),
            trial.datetime_start.format(LEDGER_TIME_FORMAT).to_string(),
            trial.datetime_complete.format(LEDGER_TIME_FORMAT).to_string(),
            format!("{:.6}", trial.duration_secs()),
        ];
        row.extend(
            param_names
                .iter()
                .map(|name| trial.params.get(name).map(|v| v.to_string()).unwrap_or_default()),
        );
        row.push("COMPLETE".to_string());
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Copy the ledger into `studies/`, named after `now`.
///
/// A second run within the same second gets a numeric suffix instead of
/// replacing the earlier archive.
pub fn archive_ledger(workspace: &Workspace, now: DateTime<Local>) -> Result<PathBuf> {
    let stamp = now.format(ARCHIVE_TIMESTAMP_FORMAT).to_string();
    let mut target = workspace.archive_path(&stamp);
    let mut suffix = 1;
    while target.exists() {
        target = workspace.archive_path(&format!("{}_{}", stamp, suffix));
        suffix += 1;
    }

    let ledger = workspace.ledger_path();
    info!("Copying study results to {}", target.display());
    fs::copy(&ledger, &target).map_err(|source| TunerError::Publish {
        path: ledger.clone(),
        source,
    })?;
    Ok(target)
}

/// Copy the best trial's model file to the promoted model path.
pub fn promote_model(workspace: &Workspace, trial: usize) -> Result<PathBuf> {
    let source_path = workspace.model_path(trial);
    let target = workspace.promoted_model_path();
    info!(
        "Copying best performing model file {} to {}",
        source_path.display(),
        target.display()
    );
    fs::copy(&source_path, &target).map_err(|source| TunerError::Publish {
        path: source_path.clone(),
        source,
    })?;
    Ok(target)
}

/// Where a run's results ended up.
#[derive(Debug, Clone)]
pub struct Publication {
    pub best_trial: usize,
    pub best_value: f64,
    pub ledger: PathBuf,
    pub archive: PathBuf,
    pub promoted_model: PathBuf,
}

/// Summarize, write the ledger, archive it and promote the best model.
pub fn publish_results(study: &Study, workspace: &Workspace) -> Result<Publication> {
    let best = study.best_trial().ok_or(TunerError::NoTrials)?;
    print_summary(study.len(), best);

    let ledger = workspace.ledger_path();
    info!("Writing study results to {}", ledger.display());
    write_ledger(study, &ledger)?;

    let archive = archive_ledger(workspace, Local::now())?;
    let promoted_model = promote_model(workspace, best.number)?;

    Ok(Publication {
        best_trial: best.number,
        best_value: best.value,
        ledger,
        archive,
        promoted_model,
    })
}

/// Print the best trial to stdout.
pub fn print_summary(finished: usize, best: &TrialRecord) {
    println!("\n=== Study Summary ===\n");
    println!("Number of finished trials: {}", finished);
    println!("Best trial: #{:03}", best.number);
    println!("  Log-loss: {}", best.value);
    println!(
        "  Best iteration: {} of {} rounds",
        best.best_iteration, best.rounds
    );
    println!("  Params:");
    for (name, value) in best.params.iter() {
        println!("    {}: {}", name, value);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booster::RoundMetrics;
    use crate::tuner::params::{HyperparameterSet, ParamValue};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn record(number: usize, value: f64) -> TrialRecord {
        let start = Local.with_ymd_and_hms(2024, 5, 1, 13, 45, 0).unwrap();
        TrialRecord {
            number,
            params: HyperparameterSet::new()
                .with("num_leaves", ParamValue::Int(31 + number as i64))
                .with("feature_fraction", ParamValue::Float(0.75)),
            value,
            best_iteration: 10,
            rounds: 60,
            datetime_start: start,
            datetime_complete: start + chrono::Duration::milliseconds(1500),
        }
    }

    #[test]
    fn test_trial_history_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trial_000.csv");

        let mut history = EvaluationHistory::new();
        history.push(RoundMetrics {
            train_logloss: 0.69,
            val_logloss: 0.7,
            train_auc: 0.5,
            val_auc: 0.55,
        });
        history.push(RoundMetrics {
            train_logloss: 0.6,
            val_logloss: 0.65,
            train_auc: 0.8,
            val_auc: 0.75,
        });
        write_trial_history(&history, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "round,train_logloss,val_logloss,train_auc,val_auc\n0,0.69,0.7,0.5,0.55\n1,0.6,0.65,0.8,0.75\n"
        );
    }

    #[test]
    fn test_history_in_missing_directory_is_a_workspace_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trials").join("trial_000.csv");

        match write_trial_history(&EvaluationHistory::new(), &path) {
            Err(TunerError::Workspace { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected workspace error, got {:?}", other),
        }
    }

    #[test]
    fn test_ledger_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("optuna_study.csv");
        let study = Study::from_trials(vec![record(0, 0.52), record(1, 0.48)]);

        write_ledger(&study, &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                "number",
                "value",
                "datetime_start",
                "datetime_complete",
                "duration_secs",
                "params_feature_fraction",
                "params_num_leaves",
                "state"
            ]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][0], "1");
        assert_eq!(&rows[1][1], "0.48");
        assert_eq!(&rows[1][2], "2024-05-01 13:45:00.000000");
        assert_eq!(&rows[1][4], "1.500000");
        assert_eq!(&rows[1][6], "32");
        assert_eq!(&rows[1][7], "COMPLETE");
    }

    #[test]
    fn test_archive_names_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        fs::create_dir_all(ws.studies_dir()).unwrap();
        fs::write(ws.ledger_path(), "number,value\n0,0.5\n").unwrap();

        let now = Local.with_ymd_and_hms(2024, 5, 1, 13, 45, 0).unwrap();
        let first = archive_ledger(&ws, now).unwrap();
        let second = archive_ledger(&ws, now).unwrap();

        assert_eq!(first, ws.archive_path("2024-05-01_13-45-00"));
        assert_eq!(second, ws.archive_path("2024-05-01_13-45-00_1"));
        assert_eq!(fs::read(&second).unwrap(), fs::read(ws.ledger_path()).unwrap());
    }

    #[test]
    fn test_promoting_missing_model_fails() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        fs::create_dir_all(ws.models_dir()).unwrap();

        assert!(matches!(
            promote_model(&ws, 3),
            Err(TunerError::Publish { .. })
        ));
    }

    #[test]
    fn test_promote_copies_bytes() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        fs::create_dir_all(ws.models_dir()).unwrap();
        fs::write(ws.model_path(2), "tree\nversion=v3\n").unwrap();
        fs::write(ws.promoted_model_path(), "stale").unwrap();

        promote_model(&ws, 2).unwrap();
        assert_eq!(
            fs::read(ws.promoted_model_path()).unwrap(),
            fs::read(ws.model_path(2)).unwrap()
        );
    }

    #[test]
    fn test_publish_without_trials_fails() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        assert!(matches!(
            publish_results(&Study::default(), &ws),
            Err(TunerError::NoTrials)
        ));
    }
}
