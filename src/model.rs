use regex::Regex;
use serde::{Deserialize, Deserializer};

/// Kind of thing a desktop entry describes.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryKind {
    #[default]
    Unknown,
    Application,
    Link,
    Directory,
}

impl EntryKind {
    /// Maps a `Type=` value, ignoring case. Unrecognized values yield `None`.
    pub fn from_value(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "application" => Some(Self::Application),
            "link" => Some(Self::Link),
            "directory" => Some(Self::Directory),
            _ => None,
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesktopEntry {
    pub kind: EntryKind,
    pub name: String,         // Display name
    pub working_dir: String,  // Path= value, may be empty
    pub exec: Vec<String>,    // Tokenized Exec= value, may hold field codes
}

/// A URL pattern and the desktop entry that should handle matching URLs.
#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    #[serde(rename = "regex", deserialize_with = "deserialize_regex")]
    pub pattern: Regex,
    pub target: String,
}

#[cfg(test)]
impl Rule {
    pub fn new(pattern: Regex, target: impl Into<String>) -> Self {
        Self { pattern, target: target.into() }
    }
}

fn deserialize_regex<'de, D>(deserializer: D) -> Result<Regex, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Regex::new(&raw).map_err(|e| serde::de::Error::custom(format!("invalid pattern {raw:?}: {e}")))
}
