use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("section header [Desktop Entry] not found")]
    MissingHeader,

    #[error("unable to split Exec value: {0:?}")]
    Tokenize(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("desktop entry for {name} not found")]
    NotFound { name: String },
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("couldn't open desktop entry file: {0}")]
    Resolve(#[from] ResolveError),

    #[error("couldn't parse desktop entry file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("desktop entry {name} has no Exec command")]
    EmptyCommand { name: String },

    #[error("working directory {} of {name} does not exist", dir.display())]
    MissingWorkingDir { name: String, dir: PathBuf },

    #[error("couldn't find executable {program} in $PATH")]
    ExecutableNotFound { program: String },

    #[error("failed to exec {}: {source}", program.display())]
    Exec {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}
