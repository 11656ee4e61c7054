//! Cloning repositories with the `git` command-line tool.
//!
//! The clone runs in the current working directory with the terminal's
//! standard streams attached, so progress output is visible to the user.

use std::ffi::{OsStr, OsString};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::{Error, Result};

/// Runs `<program> clone <url>`.
///
/// # Examples
///
/// ```no_run
/// use bbpr_bitbucket::GitCloner;
///
/// # async fn example() -> bbpr_bitbucket::Result<()> {
/// GitCloner::new()
///     .clone_repository("https://bitbucket.org/acme/widgets.git")
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GitCloner {
    program: OsString,
}

impl Default for GitCloner {
    fn default() -> Self {
        Self {
            program: OsString::from("git"),
        }
    }
}

impl GitCloner {
    /// Creates a cloner that runs `git` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cloner that runs a different program.
    #[must_use]
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Returns the program that is invoked.
    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Clones `clone_url` into the current directory and waits for the
    /// command to finish.
    ///
    /// The URL is passed as a single argument; no shell is involved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CloneSpawn`] if the program cannot be started and
    /// [`Error::CloneFailed`] if it exits unsuccessfully.
    #[instrument(skip(self), fields(program = ?self.program))]
    pub async fn clone_repository(&self, clone_url: &str) -> Result<()> {
        let status = Command::new(&self.program)
            .arg("clone")
            .arg(clone_url)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| Error::CloneSpawn {
                program: self.program.to_string_lossy().into_owned(),
                source,
            })?;

        debug!(?status, "clone command finished");
        if status.success() {
            Ok(())
        } else {
            Err(Error::CloneFailed {
                code: status.code(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_git() {
        assert_eq!(GitCloner::new().program(), OsStr::new("git"));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let cloner = GitCloner::with_program("bbpr-definitely-not-a-real-program");
        let err = cloner
            .clone_repository("https://example.invalid/repo.git")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CloneSpawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_reported() {
        let cloner = GitCloner::with_program("false");
        let err = cloner
            .clone_repository("https://example.invalid/repo.git")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CloneFailed { code: Some(1) }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn zero_exit_is_success() {
        let cloner = GitCloner::with_program("true");
        cloner
            .clone_repository("https://example.invalid/repo.git")
            .await
            .unwrap();
    }
}
