//! Publishing of the archive directory to a git remote using [Git].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use derive_more::{Display, Error, From};

use super::Context;
use crate::config::Remote;
use crate::journal::{JournalError, LogSink};
use crate::process::{CommandError, CommandRunner, Invocation};

/// Format of the commit message, e.g. `2024-03-01 04:00:00 Friday`.
const COMMIT_MESSAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %A";

#[derive(Debug, Display, Error, From)]
/// Errors on interacting with the git repository of the archive directory.
pub enum GitError {
    /// A remote is configured but no commit author.
    #[display("github link provided but no author or email, add to .env: github_author=<username> and github_email=<email>")]
    MissingIdentity,
    #[display("git command failed: {_0}")]
    #[from]
    Command(CommandError),
    #[display("{_0}")]
    #[from]
    Journal(JournalError),
}

/// Commit message of a backup created at `now`.
pub fn commit_message(now: &DateTime<Local>) -> String {
    now.format(COMMIT_MESSAGE_FORMAT).to_string()
}

/// Interaction with the git working copy in the archive directory.
#[derive(Debug, Clone)]
pub struct Git {
    /// The git executable.
    program: String,
    work_tree: PathBuf,
}

impl Git {
    pub fn new(program: &str, work_tree: &Path) -> Self {
        Self {
            program: program.to_string(),
            work_tree: work_tree.to_path_buf(),
        }
    }

    fn execute_command<R: CommandRunner, S: LogSink>(
        &self,
        ctx: &Context<'_, R, S>,
        args: &[&str],
    ) -> Result<(), GitError> {
        let invocation = Invocation::new(&self.program, args.iter().copied())
            .current_dir(&self.work_tree);
        ctx.execute::<GitError>(&invocation)?;
        Ok(())
    }

    /// Turns the archive directory into a git repository pushing to `remote`.
    pub fn init_repository<R: CommandRunner, S: LogSink>(
        &self,
        ctx: &Context<'_, R, S>,
        remote_name: &str,
        url: &str,
    ) -> Result<(), GitError> {
        log::info!(target: "backend::git", "Initialize repository in {}", self.work_tree.display());
        self.execute_command(ctx, &["init"])?;
        self.execute_command(ctx, &["remote", "add", remote_name, url])?;
        Ok(())
    }

    /// Commits the whole archive directory and force-pushes it to `branch` of `remote_name`.
    ///
    /// <div class="warning">
    /// The history of the remote branch is replaced by the local one.
    /// </div>
    pub fn publish<R: CommandRunner, S: LogSink>(
        &self,
        ctx: &Context<'_, R, S>,
        remote: &Remote,
        remote_name: &str,
        branch: &str,
        now: &DateTime<Local>,
    ) -> Result<(), GitError> {
        self.execute_command(ctx, &["add", "."])?;

        if remote.author.is_empty() || remote.email.is_empty() {
            return Err(GitError::MissingIdentity);
        }

        let message = commit_message(now);
        let author = format!("--author={} <{}>", remote.author, remote.email);
        log::debug!(target: "backend::git", "Commit archives: {message}");
        self.execute_command(ctx, &["commit", "-m", message.as_str(), author.as_str()])?;

        log::debug!(target: "backend::git", "Push to {remote_name} {branch}");
        self.execute_command(ctx, &["push", remote_name, branch, "--force"])?;

        ctx.journal
            .status("Successfully uploaded archive to github repository")?;
        Ok(())
    }
}
