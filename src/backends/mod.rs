//! Backend modules performing the individual steps of a backup run.
//!
//! - [ArchiveDir]: Directory receiving the archives.
//! - [MongoDump]: Compressed dump of every configured database.
//! - [Git]: Publishing of the archive directory to a git remote.

pub mod archive;
pub mod git;
pub mod mongodump;

pub use archive::{ArchiveDir, ArchiveError};
pub use git::{Git, GitError};
pub use mongodump::{DumpError, MongoDump};

use crate::journal::{Journal, JournalError, LogSink};
use crate::process::{CommandError, CommandOutput, CommandRunner, Invocation};

/// Environment the backends operate in.
pub struct Context<'a, R, S> {
    pub runner: &'a R,
    pub journal: &'a Journal<S>,
    /// On a dry run no files or directories are altered.
    pub dry_run: bool,
}

impl<'a, R: CommandRunner, S: LogSink> Context<'a, R, S> {
    pub fn new(runner: &'a R, journal: &'a Journal<S>, dry_run: bool) -> Self {
        Self {
            runner,
            journal,
            dry_run,
        }
    }

    /// Runs `invocation` and records its output in the debug log.
    ///
    /// Fails if the command can't be spawned or exits unsuccessfully.
    pub fn execute<E>(&self, invocation: &Invocation) -> Result<CommandOutput, E>
    where
        E: From<CommandError> + From<JournalError>,
    {
        log::debug!(target: "backend", "Execute: {invocation}");

        let output = self
            .runner
            .run(invocation)
            .map_err(|source| CommandError::Spawn {
                command: invocation.to_string(),
                source,
            })?;

        self.journal.output(&output.stdout)?;
        self.journal.output(&crate::process::redact(&output.stderr))?;

        Ok(output.check(invocation)?)
    }
}
