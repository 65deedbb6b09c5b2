use anyhow::Result;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "cluster-wizard";
const CONFIG_FILE_NAME: &str = "cluster-wizard.toml";
const LOG_DIR_NAME: &str = "logs";

/// Resolve the folder the executable runs from (absolute path)
pub fn resolve_deployment_folder() -> PathBuf {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(dir) = exe_path.parent() {
            return dir.to_path_buf();
        }
    }

    // Fallback: current working directory
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Default location of the user configuration file, if a config dir exists on this platform.
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE_NAME))
}

/// Resolve log folder (absolute path), creating it when missing.
///
/// An explicitly configured folder wins. Otherwise logs go under the user's local data
/// dir, falling back to a folder next to the executable.
pub fn resolve_log_folder(configured: Option<&Path>) -> Result<PathBuf> {
    let log_dir = match configured {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => match dirs::data_local_dir() {
            Some(d) => d.join(APP_DIR).join(LOG_DIR_NAME),
            None => resolve_deployment_folder().join(LOG_DIR_NAME),
        },
    };

    std::fs::create_dir_all(&log_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create log folder {:?}: {}", log_dir, e))?;
    Ok(log_dir)
}
