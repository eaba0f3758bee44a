use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Remembered between runs so the game folder only has to be given once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub game_dir: Option<PathBuf>,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "us".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            game_dir: None,
            language: default_language(),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    let mut base = dirs::config_dir().or_else(dirs::data_dir)?;
    base.push("BattleVoice");
    base.push("settings.json");
    Some(base)
}

pub fn load_config() -> CliConfig {
    if let Some(path) = config_path() {
        if let Ok(data) = fs::read_to_string(&path) {
            match serde_json::from_str::<CliConfig>(&data) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!("ignoring unreadable settings {}: {}", path.display(), e),
            }
        }
    }
    CliConfig::default()
}

pub fn save_config(cfg: &CliConfig) {
    if let Some(path) = config_path() {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(cfg) {
            Ok(data) => {
                if let Err(e) = fs::write(&path, data) {
                    log::warn!("could not save settings to {}: {}", path.display(), e);
                }
            }
            Err(e) => log::warn!("could not serialise settings: {}", e),
        }
    }
}
