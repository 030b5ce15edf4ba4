//! Where parley keeps per-user files: run logs and the fallback config.
//!
//! Everything lives under one `.parley` folder inside the OS config directory.
//! Setting `PARLEY_CONFIG_HOME` moves that folder's parent, which is how tests
//! and portable installs keep their files out of the user profile.

use std::ffi::OsString;
use std::path::PathBuf;

use directories::BaseDirs;
use thiserror::Error;

pub const APP_DIR_NAME: &str = ".parley";
/// Environment variable replacing the OS config directory as the base.
pub const CONFIG_HOME_ENV: &str = "PARLEY_CONFIG_HOME";
const LOGS_DIR_NAME: &str = "logs";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("No config directory could be determined for parley files")]
    NoBaseDir,
    #[error("Failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The `.parley` folder, created on first use.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let base = base_dir().ok_or(AppDirError::NoBaseDir)?;
    create(base.join(APP_DIR_NAME))
}

/// Directory receiving one log file per trainer run.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    create(app_root_dir()?.join(LOGS_DIR_NAME))
}

/// `.parley/config.toml`; nothing is created, the file may not exist.
pub fn fallback_config_path() -> Option<PathBuf> {
    base_dir().map(|base| base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn base_dir() -> Option<PathBuf> {
    choose_base(
        std::env::var_os(CONFIG_HOME_ENV),
        BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf()),
    )
}

// An empty override counts as unset.
fn choose_base(env_override: Option<OsString>, os_default: Option<PathBuf>) -> Option<PathBuf> {
    env_override
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or(os_default)
}

fn create(path: PathBuf) -> Result<PathBuf, AppDirError> {
    match std::fs::create_dir_all(&path) {
        Ok(()) => Ok(path),
        Err(source) => Err(AppDirError::CreateDir { path, source }),
    }
}
