mod layout;
mod reset;

pub use layout::{
    Workspace, LEDGER_FILE, MODELS_DIR, PROMOTED_MODEL_FILE, STUDIES_DIR, TRIALS_DIR,
};
pub use reset::reset_workspace;
