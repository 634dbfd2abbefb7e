use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Result, TunerError};
use crate::workspace::layout::Workspace;

fn workspace_error(path: &Path) -> impl FnOnce(std::io::Error) -> TunerError + '_ {
    move |source| TunerError::Workspace {
        path: path.to_path_buf(),
        source,
    }
}

/// Create `dir` if missing, otherwise delete everything inside it.
fn clear_or_create(dir: &Path, what: &str) -> Result<usize> {
    if !dir.exists() {
        info!("Creating {} directory", dir.display());
        fs::create_dir_all(dir).map_err(workspace_error(dir))?;
        return Ok(0);
    }

    info!("Removing old {} files from {} directory", what, dir.display());
    let mut removed = 0;
    for entry in fs::read_dir(dir).map_err(workspace_error(dir))? {
        let path = entry.map_err(workspace_error(dir))?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path).map_err(workspace_error(&path))?;
        } else {
            fs::remove_file(&path).map_err(workspace_error(&path))?;
        }
        removed += 1;
    }
    Ok(removed)
}

/// Prepare the output directories for a new run.
///
/// `models/` and `trials/` end up existing and empty of files; `studies/` is
/// created if needed and otherwise untouched.
pub fn reset_workspace(workspace: &Workspace) -> Result<()> {
    clear_or_create(&workspace.models_dir(), "model")?;
    clear_or_create(&workspace.trials_dir(), "trial")?;

    let studies = workspace.studies_dir();
    if !studies.exists() {
        info!("Creating {} directory", studies.display());
        fs::create_dir_all(&studies).map_err(workspace_error(&studies))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());

        reset_workspace(&ws).unwrap();

        assert!(ws.models_dir().is_dir());
        assert!(ws.trials_dir().is_dir());
        assert!(ws.studies_dir().is_dir());
    }

    #[test]
    fn test_clears_models_and_trials_but_keeps_studies() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        reset_workspace(&ws).unwrap();

        fs::write(ws.model_path(0), "old model").unwrap();
        fs::write(ws.trial_history_path(0), "old trial").unwrap();
        fs::write(ws.archive_path("2020-01-01_00-00-00"), "old study").unwrap();

        reset_workspace(&ws).unwrap();

        assert_eq!(fs::read_dir(ws.models_dir()).unwrap().count(), 0);
        assert_eq!(fs::read_dir(ws.trials_dir()).unwrap().count(), 0);
        assert!(ws.archive_path("2020-01-01_00-00-00").exists());
    }

    #[test]
    fn test_nested_directories_are_removed() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        reset_workspace(&ws).unwrap();

        let nested = ws.models_dir().join("old_run");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("LightGBM_model_000.txt"), "old model").unwrap();
        fs::create_dir_all(ws.trials_dir().join("empty")).unwrap();

        reset_workspace(&ws).unwrap();

        assert_eq!(fs::read_dir(ws.models_dir()).unwrap().count(), 0);
        assert_eq!(fs::read_dir(ws.trials_dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        reset_workspace(&ws).unwrap();
        reset_workspace(&ws).unwrap();
        assert!(ws.models_dir().is_dir());
    }

    #[test]
    fn test_file_in_place_of_directory_is_a_workspace_error() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path());
        fs::write(ws.models_dir(), "not a directory").unwrap();

        assert!(matches!(
            reset_workspace(&ws),
            Err(TunerError::Workspace { .. })
        ));
    }
}
