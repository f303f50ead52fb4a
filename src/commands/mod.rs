pub mod clear_user;
pub mod get;
pub mod init;
pub mod list;
pub mod password;
pub mod rotate_key;
pub mod set;

use std::path::Path;

use anyhow::{Context, Result};

use idleprefs::backend::FileBackend;
use idleprefs::{config, logging, Settings};

/// Set up logging from `--verbose`, else the configured level, else `info`.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        config::project_root()
            .and_then(|root| config::read(&root))
            .map(|cfg| cfg.log_level)
            .unwrap_or_else(|_| "info".to_string())
    };
    logging::init_logging(&level);
}

/// Open the store under `root`, running any pending migrations.
pub fn open_settings(root: &Path) -> Result<Settings<FileBackend>> {
    config::open_settings(root).context("Failed to open preference store")
}
