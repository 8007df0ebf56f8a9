use crate::model::Rule;
use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

/// `<config dir>/linkroute/config.json`, or `config.json` when the platform
/// has no config directory.
pub fn default_config_path() -> PathBuf {
    match ProjectDirs::from("org", "linkroute", "linkroute") {
        Some(dirs) => dirs.config_dir().join(CONFIG_FILE),
        None => PathBuf::from(CONFIG_FILE),
    }
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(rest),
        None => path.to_path_buf(),
    }
}

/// Reads the ordered rule list from a JSON file.
pub fn load_rules(path: &Path) -> Result<Vec<Rule>> {
    let path = expand_home(path);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_rules(&content).with_context(|| format!("failed to parse config {}", path.display()))
}

pub fn parse_rules(content: &str) -> Result<Vec<Rule>> {
    let rules: Vec<Rule> = serde_json::from_str(content)?;
    Ok(rules)
}
