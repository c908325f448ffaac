//! Directory holding the database archives.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use derive_more::{Display, Error};

use super::Context;
use crate::journal::LogSink;
use crate::process::CommandRunner;

/// Extension of the archives written by `mongodump --gzip`.
const ARCHIVE_EXTENSION: &str = "gzip";

#[derive(Debug, Display, Error)]
/// Errors on preparing the [ArchiveDir].
pub enum ArchiveError {
    /// The archive directory couldn't be created.
    #[display("Unable to create archive directory {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },
    /// The archive path exists but is not a directory.
    #[display("Archive path is not a directory: {}", _0.display())]
    NotADirectory(#[error(ignore)] PathBuf),
}

/// Directory the archives are written to.
///
/// Whether the directory had to be created decides if a git repository is
/// initialized in it, see [`ensure`](Self::ensure).
#[derive(Debug, Clone)]
pub struct ArchiveDir {
    path: PathBuf,
}

impl ArchiveDir {
    pub fn new(path: PathBuf) -> Self {
        if path.is_relative() {
            log::warn!(target: "backend::archive", "archive directory is relative: {}", path.display());
        }

        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archive of `database`, `<dir>/<database>.gzip`.
    pub fn archive_path(&self, database: &str) -> PathBuf {
        self.path.join(format!("{database}.{ARCHIVE_EXTENSION}"))
    }

    /// Creates the directory if it doesn't exist yet.
    ///
    /// Returns `true` if the directory was absent. On a dry run nothing is
    /// created but the result is reported the same.
    pub fn ensure<R: CommandRunner, S: LogSink>(
        &self,
        ctx: &Context<'_, R, S>,
    ) -> Result<bool, ArchiveError> {
        match fs::metadata(&self.path) {
            Ok(metadata) if metadata.is_dir() => {
                log::debug!(target: "backend::archive", "Using existing archive directory {}", self.path.display());
                return Ok(false);
            }
            Ok(_) => return Err(ArchiveError::NotADirectory(self.path.clone())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ArchiveError::Create {
                    path: self.path.clone(),
                    source,
                })
            }
        }

        if ctx.dry_run {
            log::info!(target: "backend::archive", "Dry-run, not creating archive directory {}", self.path.display());
        } else {
            fs::create_dir_all(&self.path).map_err(|source| ArchiveError::Create {
                path: self.path.clone(),
                source,
            })?;
            log::info!(target: "backend::archive", "Created archive directory {}", self.path.display());
        }

        Ok(true)
    }
}
