//! A single backup run.
//!
//! The stages are executed strictly in order:
//! configuration, archive directory (and repository on first use), one dump
//! per database, and publishing if a remote is configured. The first error
//! aborts the run.

use std::path::{Path, PathBuf};

use chrono::Local;
use derive_more::{Display, Error, From};

use crate::backends::{ArchiveDir, ArchiveError, Context, DumpError, Git, GitError, MongoDump};
use crate::cli::EnvArgs;
use crate::config::{BackupConfig, ConfigError, Settings};
use crate::journal::{JournalError, LogSink};
use crate::process::CommandRunner;

#[derive(Debug, Display, Error, From)]
/// Fatal error of a run.
pub enum RunError {
    Config(ConfigError),
    Archive(ArchiveError),
    Dump(DumpError),
    Git(GitError),
    Journal(JournalError),
}

/// What a successful run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Archive per database, in configured order.
    pub archives: Vec<PathBuf>,
    /// A git repository was initialized in the archive directory.
    pub repository_initialized: bool,
    /// The archives were pushed to the remote.
    pub published: bool,
}

/// Backup of the configured databases below a working directory.
pub struct Backup<'a, R, S> {
    working_dir: &'a Path,
    settings: &'a Settings,
    ctx: Context<'a, R, S>,
}

impl<'a, R: CommandRunner, S: LogSink> Backup<'a, R, S> {
    pub fn new(working_dir: &'a Path, settings: &'a Settings, ctx: Context<'a, R, S>) -> Self {
        Self {
            working_dir,
            settings,
            ctx,
        }
    }

    /// Runs all stages.
    ///
    /// A fatal error is written to the run log followed by the banner
    /// before it is returned.
    pub fn run(&self, env: &EnvArgs) -> Result<RunReport, RunError> {
        let result = self.stages(env);
        if let Err(e) = &result {
            let journal = self.ctx.journal;
            if let Err(journal_err) = journal.fatal(&e.to_string()) {
                log::error!(target: "run", "Recording the failure failed: {journal_err}");
            }
        }
        result
    }

    fn stages(&self, env: &EnvArgs) -> Result<RunReport, RunError> {
        let Self {
            working_dir,
            settings,
            ctx,
        } = self;

        let config = BackupConfig::from_env(env)?;
        let mut report = RunReport::default();

        let archive_dir = ArchiveDir::new(settings.archive_dir(working_dir));
        let created = archive_dir.ensure(ctx)?;

        let git = Git::new(&settings.git, archive_dir.path());
        if let (Some(remote), true) = (&config.remote, created) {
            git.init_repository(ctx, &settings.remote, &remote.url)?;
            report.repository_initialized = true;
        }

        let mongodump = MongoDump::new(
            &settings.mongodump,
            &config.mongo_uri,
            &settings.authentication_database,
        );
        report.archives = mongodump.dump_all(ctx, &archive_dir, &config.databases)?;

        if let Some(remote) = &config.remote {
            git.publish(ctx, remote, &settings.remote, &settings.branch, &Local::now())?;
            report.published = true;
        }

        ctx.journal.banner()?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{Channel, Journal, MemorySink, BANNER};
    use crate::process::fake::RecordingRunner;

    fn env(uri: &str, databases: &str, github: &str, author: &str, email: &str) -> EnvArgs {
        EnvArgs {
            mongo_uri: Some(uri.into()),
            databases: Some(databases.into()),
            github: Some(github.into()),
            github_author: Some(author.into()),
            github_email: Some(email.into()),
        }
    }

    fn programs(runner: &RecordingRunner) -> Vec<String> {
        runner
            .commands()
            .into_iter()
            .map(|c| c[..2.min(c.len())].join(" "))
            .collect()
    }

    #[test]
    fn dumps_without_remote() {
        let root = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let runner = RecordingRunner::default();
        let journal = Journal::new(MemorySink::default());
        let backup = Backup::new(
            root.path(),
            &settings,
            Context::new(&runner, &journal, false),
        );

        let report = backup
            .run(&env("mongodb://localhost:27017", "users, orders", "", "", ""))
            .unwrap();

        let archive = root.path().join("archive");
        assert_eq!(
            report,
            RunReport {
                archives: vec![archive.join("users.gzip"), archive.join("orders.gzip")],
                repository_initialized: false,
                published: false,
            }
        );
        assert!(archive.is_dir());
        assert_eq!(
            programs(&runner),
            vec!["mongodump --uri=mongodb://localhost:27017"; 2]
        );
        assert_eq!(
            journal.sink().messages(Channel::Main),
            vec![
                "Successfully archived users",
                "Successfully archived orders",
                BANNER
            ]
        );
    }

    #[test]
    fn missing_uri_runs_nothing() {
        let root = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let runner = RecordingRunner::default();
        let journal = Journal::new(MemorySink::default());
        let backup = Backup::new(
            root.path(),
            &settings,
            Context::new(&runner, &journal, false),
        );

        let err = backup
            .run(&env("", "users", "git@host:backup.git", "bot", "bot@acme.io"))
            .unwrap_err();

        assert!(matches!(err, RunError::Config(ConfigError::MissingMongoUri)));
        assert!(runner.invocations.borrow().is_empty());
        assert!(!root.path().join("archive").exists());
        assert_eq!(
            journal.sink().messages(Channel::Main),
            vec![
                "ERROR - Missing required .env variables: mongoURI".to_string(),
                BANNER.to_string()
            ]
        );
    }

    #[test]
    fn missing_databases_runs_nothing() {
        let root = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let runner = RecordingRunner::default();
        let journal = Journal::new(MemorySink::default());
        let backup = Backup::new(
            root.path(),
            &settings,
            Context::new(&runner, &journal, false),
        );

        let err = backup
            .run(&env("mongodb://localhost:27017", "", "", "", ""))
            .unwrap_err();

        assert!(matches!(err, RunError::Config(ConfigError::MissingDatabases)));
        assert!(runner.invocations.borrow().is_empty());
        assert!(!root.path().join("archive").exists());
        assert_eq!(
            journal.sink().messages(Channel::Main),
            vec![
                "ERROR - Missing required .env variables: databases".to_string(),
                BANNER.to_string()
            ]
        );
    }

    #[test]
    fn repository_initialized_on_first_run_only() {
        let root = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let env = env("mongodb://db", "users", "git@host:backup.git", "bot", "bot@acme.io");

        let first = RecordingRunner::default();
        let journal = Journal::new(MemorySink::default());
        let report = Backup::new(root.path(), &settings, Context::new(&first, &journal, false))
            .run(&env)
            .unwrap();
        assert!(report.repository_initialized);
        assert!(report.published);
        assert_eq!(
            programs(&first),
            vec![
                "git init",
                "git remote",
                "mongodump --uri=mongodb://db",
                "git add",
                "git commit",
                "git push",
            ]
        );

        let second = RecordingRunner::default();
        let report = Backup::new(root.path(), &settings, Context::new(&second, &journal, false))
            .run(&env)
            .unwrap();
        assert!(!report.repository_initialized);
        assert_eq!(
            programs(&second),
            vec![
                "mongodump --uri=mongodb://db",
                "git add",
                "git commit",
                "git push",
            ]
        );
        assert_eq!(
            journal
                .sink()
                .messages(Channel::Main)
                .iter()
                .filter(|m| *m == BANNER)
                .count(),
            2
        );
    }

    #[test]
    fn missing_identity_aborts_after_staging() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("archive")).unwrap();
        let settings = Settings::default();
        let runner = RecordingRunner::default();
        let journal = Journal::new(MemorySink::default());
        let backup = Backup::new(
            root.path(),
            &settings,
            Context::new(&runner, &journal, false),
        );

        let err = backup
            .run(&env("mongodb://db", "users", "git@host:backup.git", "", ""))
            .unwrap_err();

        assert!(matches!(err, RunError::Git(GitError::MissingIdentity)));
        assert_eq!(
            programs(&runner),
            vec!["mongodump --uri=mongodb://db", "git add"]
        );
        let main = journal.sink().messages(Channel::Main);
        assert_eq!(main.last().map(String::as_str), Some(BANNER));
        assert!(main[main.len() - 2].starts_with("ERROR - github link provided"));
    }

    #[test]
    fn settings_change_paths_and_branch() {
        let root = tempfile::tempdir().unwrap();
        let settings = Settings {
            archive_dir: "dumps".into(),
            branch: "main".into(),
            ..Settings::default()
        };
        let runner = RecordingRunner::default();
        let journal = Journal::new(MemorySink::default());
        let backup = Backup::new(
            root.path(),
            &settings,
            Context::new(&runner, &journal, false),
        );

        let report = backup
            .run(&env("mongodb://db", "users", "git@host:backup.git", "bot", "bot@acme.io"))
            .unwrap();

        assert_eq!(report.archives, vec![root.path().join("dumps/users.gzip")]);
        assert_eq!(
            runner.commands().last().unwrap(),
            &vec!["git", "push", "origin", "main", "--force"]
        );
    }
}
