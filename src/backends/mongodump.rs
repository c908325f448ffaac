use std::path::{Path, PathBuf};

use derive_more::{Display, Error, From};

use super::{ArchiveDir, Context};
use crate::journal::{JournalError, LogSink};
use crate::process::{CommandError, CommandRunner, Invocation};

#[derive(Debug, Display, Error, From)]
/// Errors on dumping a database.
pub enum DumpError {
    /// `mongodump` failed, the remaining databases are skipped.
    #[display("Database dump failed: {_0}")]
    Command(CommandError),
    #[display("{_0}")]
    Journal(JournalError),
}

/// Dumps databases into gzip compressed archives using `mongodump`.
pub struct MongoDump {
    program: String,
    uri: String,
    authentication_database: String,
}

impl MongoDump {
    pub fn new(program: &str, uri: &str, authentication_database: &str) -> Self {
        Self {
            program: program.to_string(),
            uri: uri.to_string(),
            authentication_database: authentication_database.to_string(),
        }
    }

    fn invocation(&self, database: &str, archive: &Path) -> Invocation {
        Invocation::new(
            &self.program,
            [
                format!("--uri={}", self.uri),
                format!("--authenticationDatabase={}", self.authentication_database),
                format!("--db={database}"),
                format!("--archive={}", archive.display()),
                "--gzip".to_string(),
            ],
        )
    }

    /// Dumps `database` into its archive in `archive_dir`, replacing a prior archive.
    pub fn dump<R: CommandRunner, S: LogSink>(
        &self,
        ctx: &Context<'_, R, S>,
        archive_dir: &ArchiveDir,
        database: &str,
    ) -> Result<PathBuf, DumpError> {
        let archive = archive_dir.archive_path(database);
        log::info!(target: "backend::mongodump", "Create dump of database {database}");
        log::debug!(target: "backend::mongodump", "Save dump at: {}", archive.display());

        ctx.execute::<DumpError>(&self.invocation(database, &archive))?;

        ctx.journal
            .status(&format!("Successfully archived {database}"))?;
        Ok(archive)
    }

    /// Dumps every database in order, stopping at the first failure.
    pub fn dump_all<R: CommandRunner, S: LogSink>(
        &self,
        ctx: &Context<'_, R, S>,
        archive_dir: &ArchiveDir,
        databases: &[String],
    ) -> Result<Vec<PathBuf>, DumpError> {
        databases
            .iter()
            .map(|database| self.dump(ctx, archive_dir, database))
            .collect()
    }
}
