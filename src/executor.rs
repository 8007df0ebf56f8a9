use crate::desktop;
use crate::error::LaunchError;
use crate::resolver::SearchPath;
use log::{debug, info, warn};
use nix::unistd;
use std::env;
use std::ffi::{CString, OsStr, OsString};
use std::fs;
use std::io::{self, BufReader};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{self, Stdio};

/// A fully resolved command, ready to hand to a [`ProcessRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub program: PathBuf,            // Absolute path of the executable
    pub argv: Vec<String>,           // Full argument vector, argv[0] included
    pub working_dir: Option<PathBuf>,
}

/// Transfers control to a resolved command.
pub trait ProcessRunner {
    fn run(&self, cmd: &Command) -> io::Result<()>;
}

/// Starts the command as a detached child and returns.
pub struct SpawnDetached;

impl ProcessRunner for SpawnDetached {
    fn run(&self, cmd: &Command) -> io::Result<()> {
        let mut command = process::Command::new(&cmd.program);
        if let Some((arg0, rest)) = cmd.argv.split_first() {
            command.arg0(arg0).args(rest);
        }
        if let Some(dir) = &cmd.working_dir {
            command.current_dir(dir);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0);

        let child = command.spawn()?;
        info!("Started {:?} (pid {})", cmd.program, child.id());
        Ok(())
    }
}

/// Replaces the current process image. Only returns on failure, with the
/// working directory left as it was.
pub struct ReplaceProcess;

impl ProcessRunner for ReplaceProcess {
    fn run(&self, cmd: &Command) -> io::Result<()> {
        let path = to_cstring(cmd.program.as_os_str().as_encoded_bytes())?;
        let argv = cmd
            .argv
            .iter()
            .map(|arg| to_cstring(arg.as_bytes()))
            .collect::<io::Result<Vec<_>>>()?;

        let previous_dir = match &cmd.working_dir {
            Some(dir) => {
                let previous = env::current_dir()?;
                env::set_current_dir(dir)?;
                Some(previous)
            }
            None => None,
        };

        info!("Executing {:?}", cmd.program);
        let errno = match unistd::execv(&path, argv.as_slice()) {
            Ok(never) => match never {},
            Err(errno) => errno,
        };

        if let Some(previous) = previous_dir {
            if let Err(e) = env::set_current_dir(&previous) {
                warn!("Couldn't return to {:?}: {}", previous, e);
            }
        }
        Err(io::Error::from(errno))
    }
}

/// Prints the command instead of running it.
pub struct DryRun;

impl ProcessRunner for DryRun {
    fn run(&self, cmd: &Command) -> io::Result<()> {
        println!("{}", cmd.program.display());
        for arg in &cmd.argv {
            println!("  {}", arg);
        }
        Ok(())
    }
}

fn to_cstring(bytes: &[u8]) -> io::Result<CString> {
    CString::new(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

/// Runs desktop entries by name.
pub struct Launcher<R> {
    search_path: SearchPath,
    runner: R,
    exec_path: Option<OsString>,
}

impl<R: ProcessRunner> Launcher<R> {
    pub fn new(search_path: SearchPath, runner: R) -> Self {
        Self {
            search_path,
            runner,
            exec_path: None,
        }
    }

    #[cfg(test)]
    pub fn with_exec_path(mut self, path: impl Into<OsString>) -> Self {
        self.exec_path = Some(path.into());
        self
    }

    #[cfg(test)]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Resolves, parses and expands `name`, then runs its command with `args`
    /// filled into the field codes.
    pub fn launch<S: AsRef<str>>(&self, name: &str, args: &[S]) -> Result<(), LaunchError> {
        let cmd = self.prepare(name, args)?;
        debug!("Launching {} as {:?}", name, cmd.argv);

        self.runner.run(&cmd).map_err(|source| LaunchError::Exec {
            program: cmd.program.clone(),
            source,
        })
    }

    fn prepare<S: AsRef<str>>(&self, name: &str, args: &[S]) -> Result<Command, LaunchError> {
        let (path, file) = self.search_path.resolve(name)?;

        let mut entry = desktop::parse(BufReader::new(file))
            .map_err(|source| LaunchError::Parse { path, source })?;

        let argv = entry.expand_exec(args).to_vec();
        let Some(program) = argv.first() else {
            return Err(LaunchError::EmptyCommand { name: name.to_string() });
        };

        let path_var = self.exec_path.clone().or_else(|| env::var_os("PATH"));
        let program = find_executable(program, path_var.as_deref()).ok_or_else(|| {
            LaunchError::ExecutableNotFound {
                program: program.clone(),
            }
        })?;

        let working_dir = (!entry.working_dir.is_empty()).then(|| PathBuf::from(&entry.working_dir));
        if let Some(dir) = &working_dir {
            if !dir.is_dir() {
                return Err(LaunchError::MissingWorkingDir {
                    name: name.to_string(),
                    dir: dir.clone(),
                });
            }
        }

        Ok(Command {
            program,
            argv,
            working_dir,
        })
    }
}

/// Looks `program` up the way a shell would: names containing a slash are
/// used as given, anything else is searched for in `path_var`.
pub fn find_executable(program: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    if program.contains('/') {
        let path = PathBuf::from(program);
        return is_executable(&path).then_some(path);
    }

    env::split_paths(path_var?)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
