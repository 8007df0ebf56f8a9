use crate::error::ResolveError;
use directories::BaseDirs;
use log::debug;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

const DEFAULT_DATA_DIRS: &str = "/usr/local/share:/usr/share";

/// Ordered base directories searched for `applications/<name>`.
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut unique: Vec<PathBuf> = Vec::new();
        for dir in dirs {
            if !unique.contains(&dir) {
                unique.push(dir);
            }
        }
        Self { dirs: unique }
    }

    /// The user data directory followed by `$XDG_DATA_DIRS`.
    pub fn from_env() -> Self {
        let data_home = BaseDirs::new().map(|dirs| dirs.data_dir().to_path_buf());
        let data_dirs = env::var("XDG_DATA_DIRS").ok();
        Self::from_parts(data_home, data_dirs.as_deref())
    }

    /// Builds the search path from the data home and a raw `XDG_DATA_DIRS`
    /// value. Unset or empty falls back to the system defaults.
    fn from_parts(data_home: Option<PathBuf>, data_dirs: Option<&str>) -> Self {
        let data_dirs = data_dirs
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_DATA_DIRS);

        let system = data_dirs
            .split(':')
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Self::new(data_home.into_iter().chain(system))
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Opens the first readable `<base>/applications/<name>`.
    pub fn resolve(&self, name: &str) -> Result<(PathBuf, File), ResolveError> {
        for dir in &self.dirs {
            let candidate = desktop_file_path(dir, name);
            match File::open(&candidate) {
                Ok(file) => {
                    debug!("Found desktop entry {:?}", candidate);
                    return Ok((candidate, file));
                }
                Err(e) => debug!("Skipping {:?}: {}", candidate, e),
            }
        }

        Err(ResolveError::NotFound { name: name.to_string() })
    }
}

fn desktop_file_path(base: &Path, name: &str) -> PathBuf {
    base.join("applications").join(name)
}
