//! Committing and pushing the feed file. The monitor only sees the [Repository] trait;
//! [GitCli] implements it by running the `git` executable.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;

pub const DEFAULT_COMMIT_MESSAGE: &str = "Update RSS feed";
pub const DEFAULT_REMOTE: &str = "origin";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Could not run `{command}`: {source}. Is git installed and on PATH?")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Narrow version-control surface needed to publish the feed.
pub trait Repository {
    fn stage(&mut self, path: &Path) -> Result<(), RepositoryError>;

    /// True when the staged content of `path` differs from the last commit.
    fn has_pending_changes(&mut self, path: &Path) -> Result<bool, RepositoryError>;

    fn current_branch(&mut self) -> Result<String, RepositoryError>;

    /// Commit `path` alone (other staged work stays staged) and push it to `branch`.
    /// Returns whether a push happened.
    fn commit_and_push(
        &mut self,
        branch: &str,
        message: &str,
        path: &Path,
    ) -> Result<bool, RepositoryError>;
}

/// Stage `path`; if it changed, commit with `message` and push to the checked-out branch.
///
/// Returns `Ok(false)` without committing when the staged file matches the last commit.
pub fn synchronize_to_repository<R: Repository + ?Sized>(
    repo: &mut R,
    path: &Path,
    message: &str,
) -> Result<bool, RepositoryError> {
    repo.stage(path)?;
    if !repo.has_pending_changes(path)? {
        log::info!("{} unchanged since last commit; nothing to push", path.display());
        return Ok(false);
    }
    let branch = repo.current_branch()?;
    let pushed = repo.commit_and_push(&branch, message, path)?;
    if pushed {
        log::info!("Pushed {} to {}", path.display(), branch);
    }
    Ok(pushed)
}

/// `git` subprocess runner rooted at a working directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
    remote: String,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>, remote: impl Into<String>) -> Self {
        Self {
            workdir: workdir.into(),
            remote: remote.into(),
        }
    }

    fn command_line(args: &[&str]) -> String {
        format!("git {}", args.join(" "))
    }

    fn output(&self, args: &[&str]) -> Result<Output, RepositoryError> {
        log::debug!("{}", Self::command_line(args));
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| RepositoryError::Spawn {
                command: Self::command_line(args),
                source: e,
            })
    }

    fn failed(args: &[&str], output: &Output) -> RepositoryError {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let msg = if stderr.trim().is_empty() { stdout } else { stderr };
        RepositoryError::Failed {
            command: Self::command_line(args),
            status: output.status.to_string(),
            stderr: msg.trim().to_string(),
        }
    }

    /// Run and require success; returns trimmed stdout.
    fn run(&self, args: &[&str]) -> Result<String, RepositoryError> {
        let output = self.output(args)?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(Self::failed(args, &output))
        }
    }
}

impl Repository for GitCli {
    fn stage(&mut self, path: &Path) -> Result<(), RepositoryError> {
        let p = path.to_string_lossy();
        self.run(&["add", "--", &*p]).map(|_| ())
    }

    fn has_pending_changes(&mut self, path: &Path) -> Result<bool, RepositoryError> {
        let p = path.to_string_lossy();
        let args = ["diff", "--cached", "--quiet", "--", &*p];
        let output = self.output(&args)?;
        // --quiet: 0 = no differences, 1 = differences, anything else is an error
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(Self::failed(&args, &output)),
        }
    }

    fn current_branch(&mut self) -> Result<String, RepositoryError> {
        // symbolic-ref also works on an unborn branch and fails on a detached HEAD
        self.run(&["symbolic-ref", "--short", "HEAD"])
    }

    fn commit_and_push(
        &mut self,
        branch: &str,
        message: &str,
        path: &Path,
    ) -> Result<bool, RepositoryError> {
        let p = path.to_string_lossy();
        // a pathspec limits the commit to the feed even if other changes are staged
        self.run(&["commit", "-m", message, "--", &*p])?;
        self.run(&["push", self.remote.as_str(), branch])?;
        Ok(true)
    }
}
