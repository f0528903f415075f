use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::WorkspaceResult;
use super::atomic::write_bytes_atomic;

/// Planner and run settings read from `strata.toml`.
///
/// Missing keys fall back to their defaults, so a partial file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataSettings {
    pub default_schema: String,
    pub strict_rename_batches: bool,
    pub log_level: String,
    pub run_dir: PathBuf,
}

impl Default for StrataSettings {
    fn default() -> Self {
        Self {
            default_schema: "public".to_string(),
            strict_rename_batches: false,
            log_level: "info".to_string(),
            run_dir: PathBuf::from("runs"),
        }
    }
}

pub fn load_or_create_settings(path: &Path) -> WorkspaceResult<StrataSettings> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let settings: StrataSettings = toml::from_str(&content)?;
        return Ok(settings);
    }

    let settings = StrataSettings::default();
    save_settings(path, &settings)?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &StrataSettings) -> WorkspaceResult<()> {
    let encoded = toml::to_string_pretty(settings)?;
    write_bytes_atomic(path, encoded.as_bytes())
}
