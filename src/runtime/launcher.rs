//! Hand-off from vault-env to the target program

use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::{Error, Result};

const PATH_VARIABLE: &str = "PATH";

/// Fully resolved invocation of the target program
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Launch {
    /// Absolute path found on `PATH`
    pub program: PathBuf,
    /// Arguments as given to vault-env, `argv[0]` included
    pub argv: Vec<OsString>,
    /// The complete environment of the new image
    pub env: Vec<(OsString, OsString)>,
}

impl Launch {
    /// Resolve the target named by the first argument
    ///
    /// The lookup uses the `PATH` of `env`, the environment the target will
    /// run with, and the current directory for relative names.
    pub fn resolve(argv: Vec<OsString>, env: Vec<(OsString, OsString)>) -> Result<Self> {
        let Some(target) = argv.first() else {
            return Err(Error::LaunchError(
                "No command is given, vault-env can't determine the entrypoint (command), \
                 please specify it explicitly"
                    .to_string(),
            ));
        };

        let search_path = env
            .iter()
            .find(|(name, _)| name.as_os_str() == PATH_VARIABLE)
            .map(|(_, value)| value.clone());
        let cwd = std::env::current_dir().map_err(|e| {
            Error::LaunchError(format!("Failed to determine working directory: {}", e))
        })?;

        let program = which::which_in(target, search_path, cwd).map_err(|e| {
            Error::LaunchError(format!(
                "Binary not found: {}: {}",
                target.to_string_lossy(),
                e
            ))
        })?;

        Ok(Self { program, argv, env })
    }
}

/// Replace the current process image; only returns on failure
pub fn exec(launch: Launch) -> Error {
    debug!(program = %launch.program.display(), args = ?launch.argv, "Running command using exec");

    let mut command = Command::new(&launch.program);
    if let Some((arg0, rest)) = launch.argv.split_first() {
        command.arg0(arg0).args(rest);
    }
    command.env_clear().envs(launch.env);

    let err = command.exec();
    Error::LaunchError(format!(
        "Failed to exec process '{}': {}",
        launch.program.display(),
        err
    ))
}
