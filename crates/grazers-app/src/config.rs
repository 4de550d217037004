use std::{fs, path::Path};

use anyhow::{Context, Result};
use grazers_core::GrazersConfig;

/// Read a JSON configuration file; keys it omits keep their defaults.
pub fn load(path: Option<&Path>) -> Result<GrazersConfig> {
    let Some(path) = path else {
        return Ok(GrazersConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}
