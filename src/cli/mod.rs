use std::path::PathBuf;

use clap::{Args, Parser};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Verbosity of the command output.
    #[arg(long)]
    pub verbose: Option<LevelFilter>,

    /// TOML file with additional settings. Written with defaults if missing.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Simulative backup run.
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub env: EnvArgs,
}

/// Values usually provided through the environment or the `.env` file.
///
/// All of them are optional for clap so that a missing value is reported
/// through the run log instead of the argument parser.
#[derive(Args, Debug, Default, Clone)]
pub struct EnvArgs {
    /// Connection string passed to `mongodump --uri`.
    #[arg(long = "mongo-uri", env = "mongoURI", hide_env_values = true)]
    pub mongo_uri: Option<String>,

    /// Databases to dump, separated by ", ".
    #[arg(long, env = "databases")]
    pub databases: Option<String>,

    /// Git remote the archive directory is force-pushed to.
    #[arg(long, env = "github", hide_env_values = true)]
    pub github: Option<String>,

    /// Author name of the backup commits.
    #[arg(long = "github-author", env = "github_author")]
    pub github_author: Option<String>,

    /// Author email of the backup commits.
    #[arg(long = "github-email", env = "github_email")]
    pub github_email: Option<String>,
}
