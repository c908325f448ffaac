//! Configuration of a backup run.
//!
//! The required values come from the environment (see [`EnvArgs`]), the
//! optional [`Settings`] from a TOML file.

use std::io;
use std::path::{Path, PathBuf};

use derive_more::{Display, Error, From};

use crate::cli::EnvArgs;

/// Separator between the names in the `databases` variable.
pub const DATABASE_SEPARATOR: &str = ", ";

#[derive(Debug, Display, Error, PartialEq, Eq)]
/// Required environment values are missing.
pub enum ConfigError {
    /// `mongoURI` is unset or empty.
    #[display("Missing required .env variables: mongoURI")]
    MissingMongoUri,
    /// `databases` is unset or empty.
    #[display("Missing required .env variables: databases")]
    MissingDatabases,
}

/// Remote the archive directory is published to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    pub url: String,
    /// Commit author name. May be empty, it is checked when publishing.
    pub author: String,
    /// Commit author email. May be empty, it is checked when publishing.
    pub email: String,
}

/// Validated configuration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupConfig {
    pub mongo_uri: String,
    /// Databases in the order they are dumped.
    pub databases: Vec<String>,
    pub remote: Option<Remote>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl BackupConfig {
    pub fn from_env(env: &EnvArgs) -> Result<Self, ConfigError> {
        let mongo_uri = non_empty(&env.mongo_uri).ok_or(ConfigError::MissingMongoUri)?;
        let databases = non_empty(&env.databases).ok_or(ConfigError::MissingDatabases)?;

        let remote = non_empty(&env.github).map(|url| Remote {
            url: url.to_string(),
            author: env.github_author.clone().unwrap_or_default(),
            email: env.github_email.clone().unwrap_or_default(),
        });

        let databases = split_databases(databases);
        log::debug!(target: "config", "Databases to back up: {databases:?}");

        Ok(Self {
            mongo_uri: mongo_uri.to_string(),
            databases,
            remote,
        })
    }
}

/// Splits the `databases` variable on [`DATABASE_SEPARATOR`].
///
/// A name containing the separator itself can't be expressed.
pub fn split_databases(databases: &str) -> Vec<String> {
    databases
        .split(DATABASE_SEPARATOR)
        .map(str::to_string)
        .collect()
}

/// Optional settings, read from a TOML file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory the archives are written to.
    pub archive_dir: PathBuf,
    /// Log receiving the status of every step.
    pub log_file: PathBuf,
    /// Log additionally receiving the output of every command.
    ///
    /// Without it a single combined log is written to [`log_file`](Self::log_file).
    pub debug_log_file: Option<PathBuf>,
    /// `mongodump` executable.
    pub mongodump: String,
    /// `git` executable.
    pub git: String,
    pub authentication_database: String,
    /// Name of the git remote.
    pub remote: String,
    /// Branch that is force-pushed.
    pub branch: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            archive_dir: "archive".into(),
            log_file: "databaseBackup.log".into(),
            debug_log_file: Some("databaseBackup.debug.log".into()),
            mongodump: "mongodump".into(),
            git: "git".into(),
            authentication_database: "admin".into(),
            remote: "origin".into(),
            branch: "master".into(),
        }
    }
}

#[derive(Debug, Display, Error, From)]
/// Reading the [Settings] failed.
pub enum SettingsError {
    #[display("Reading the settings file failed: {_0}")]
    Io(io::Error),
    #[display("Parsing the settings file failed: {_0}")]
    Parse(toml::de::Error),
}

impl Settings {
    /// Reads the settings from `path`.
    ///
    /// A missing file is created with the default settings.
    pub fn load_or_create(path: &Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(settings) => Ok(toml::from_str(&settings)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!(
                    target: "config",
                    "Writing default settings to {} because it doesn't exist yet",
                    path.display()
                );
                let settings = Settings::default();
                match toml::to_string_pretty(&settings) {
                    Ok(settings_str) => {
                        if let Err(e) = std::fs::write(path, settings_str) {
                            log::warn!(
                                target: "config",
                                "Writing default settings to {} failed {e}",
                                path.display()
                            );
                        }
                    }
                    Err(e) => log::warn!(target: "config", "Serializing default settings failed: {e}"),
                }
                Ok(settings)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Archive directory resolved against `working_dir`.
    pub fn archive_dir(&self, working_dir: &Path) -> PathBuf {
        working_dir.join(&self.archive_dir)
    }

    pub fn log_file(&self, working_dir: &Path) -> PathBuf {
        working_dir.join(&self.log_file)
    }

    /// `None` if a single combined log is configured.
    pub fn debug_log_file(&self, working_dir: &Path) -> Option<PathBuf> {
        self.debug_log_file
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| working_dir.join(p))
    }
}
