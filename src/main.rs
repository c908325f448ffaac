use std::process::ExitCode;

use mongo_backup_lib::backends::Context;
use mongo_backup_lib::cli::Cli;
use mongo_backup_lib::config::Settings;
use mongo_backup_lib::journal::{FileSink, Journal};
use mongo_backup_lib::process::{CommandRunner, DryRunner, SystemRunner};
use mongo_backup_lib::run::Backup;

use clap::Parser;

fn main() -> ExitCode {
    let working_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Unable to determine the working directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    // values already present in the environment take precedence over the file
    let dotenv = dotenvy::from_path(working_dir.join(".env"));

    let cli = Cli::parse();

    // init logger
    let mut env_logger = env_logger::builder();
    if let Some(level) = cli.verbose {
        env_logger.filter_level(level);
    }
    if let Err(e) = env_logger.try_init() {
        eprintln!("Initializing the logger failed: {e}");
    }

    match dotenv {
        Ok(()) => log::debug!(target: "config", "Loaded .env from {}", working_dir.display()),
        Err(e) if e.not_found() => log::debug!(target: "config", "No .env file found"),
        Err(e) => log::warn!(target: "config", "Loading .env failed: {e}"),
    }

    let settings = match &cli.config {
        Some(path) => Settings::load_or_create(path),
        None => Ok(Settings::default()),
    };
    let (settings, settings_err) = match settings {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    let journal = Journal::new(FileSink::new(
        settings.log_file(&working_dir),
        settings.debug_log_file(&working_dir),
    ));

    if let Some(e) = settings_err {
        if let Err(e) = journal.fatal(&e.to_string()) {
            log::error!(target: "config", "{e}");
        }
        return ExitCode::FAILURE;
    }

    let runner: Box<dyn CommandRunner> = if cli.dry_run {
        log::warn!("Running in dry-run mode");
        Box::new(DryRunner)
    } else {
        Box::new(SystemRunner)
    };

    let ctx = Context::new(&runner, &journal, cli.dry_run);
    match Backup::new(&working_dir, &settings, ctx).run(&cli.env) {
        Ok(report) => {
            log::info!(
                target: "run",
                "Backup of {} database(s) finished{}",
                report.archives.len(),
                if report.published { ", published to remote" } else { "" }
            );
            ExitCode::SUCCESS
        }
        // already recorded in the run log
        Err(_) => ExitCode::FAILURE,
    }
}
