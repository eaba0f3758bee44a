use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::Result;

pub const MANIFEST_FILE: &str = "mod.yml";

/// Mod manager manifest. Written as JSON, which YAML readers accept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModManifest {
    pub title: String,
    pub description: String,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(rename = "source", default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Asset>>,
}

impl Asset {
    /// An asset that replaces the game file at `name` with the mod's copy.
    pub fn copy(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: None,
            method: Some("copy".to_string()),
            sources: Some(vec![Asset {
                name: name.to_string(),
                kind: None,
                method: None,
                sources: None,
            }]),
        }
    }
}

impl ModManifest {
    pub fn battle_voices(written: &[String]) -> Self {
        Self {
            title: "Battle Voice Randomizer".to_string(),
            description: "Randomizes voices in battle.".to_string(),
            assets: written.iter().map(|name| Asset::copy(name)).collect(),
        }
    }

    pub fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        fs::write(dir.join(MANIFEST_FILE), self.to_text()?)?;
        Ok(())
    }
}
