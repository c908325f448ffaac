//! Append-only run log.
//!
//! Lines are written to a [LogSink] and mirrored to the [`log`] facade.
//! The [FileSink] keeps a main log with the status of every step and an
//! optional debug log which additionally receives the output of every
//! external command.

use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use derive_more::{Display, Error, From};

/// Delimits consecutive runs in the log files.
pub const BANNER: &str =
    "------------------------ mongodb-backup-script ------------------------";

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Log a line is destined to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Main,
    Debug,
}

/// Destination of the formatted log lines.
pub trait LogSink {
    /// Appends `line` once to each of `channels`.
    fn append(&self, channels: &[Channel], line: &str) -> io::Result<()>;
}

/// Appends to the log files, opening and closing them on every write.
#[derive(Debug, Clone)]
pub struct FileSink {
    log_file: PathBuf,
    debug_log_file: Option<PathBuf>,
}

impl FileSink {
    /// Without a `debug_log_file` both channels are written to `log_file`.
    pub fn new(log_file: PathBuf, debug_log_file: Option<PathBuf>) -> Self {
        Self {
            log_file,
            debug_log_file,
        }
    }

    fn path(&self, channel: Channel) -> &Path {
        match (channel, &self.debug_log_file) {
            (Channel::Debug, Some(debug_log_file)) => debug_log_file,
            (Channel::Debug, None) | (Channel::Main, _) => &self.log_file,
        }
    }
}

impl LogSink for FileSink {
    fn append(&self, channels: &[Channel], line: &str) -> io::Result<()> {
        let mut written: Vec<&Path> = Vec::with_capacity(channels.len());
        for channel in channels {
            let path = self.path(*channel);
            if written.contains(&path) {
                continue;
            }

            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{line}")?;
            written.push(path);
        }
        Ok(())
    }
}

/// Keeps the lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: RefCell<Vec<(Channel, String)>>,
}

impl MemorySink {
    /// Messages written to `channel` without their timestamp.
    pub fn messages(&self, channel: Channel) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, line)| match line.split_once(" | ") {
                Some((_, message)) => message.to_string(),
                None => line.clone(),
            })
            .collect()
    }
}

impl LogSink for MemorySink {
    fn append(&self, channels: &[Channel], line: &str) -> io::Result<()> {
        let mut lines = self.lines.borrow_mut();
        for channel in channels {
            lines.push((*channel, line.to_string()));
        }
        Ok(())
    }
}

/// Appending to the run log failed.
#[derive(Debug, Display, Error, From)]
#[display("Writing the run log failed: {_0}")]
pub struct JournalError(io::Error);

/// Run log shared by all stages.
#[derive(Debug)]
pub struct Journal<S> {
    sink: S,
}

impl<S: LogSink> Journal<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn write(&self, channels: &[Channel], message: &str) -> Result<(), JournalError> {
        let line = format!("{} | {message}", Local::now().format(TIMESTAMP_FORMAT));
        Ok(self.sink.append(channels, &line)?)
    }

    /// Progress of a stage.
    pub fn status(&self, message: &str) -> Result<(), JournalError> {
        log::info!(target: "journal", "{message}");
        self.write(&[Channel::Main, Channel::Debug], message)
    }

    /// Output of an external command, one entry per line.
    pub fn output(&self, output: &str) -> Result<(), JournalError> {
        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            log::debug!(target: "journal", "{line}");
            self.write(&[Channel::Debug], line)?;
        }
        Ok(())
    }

    pub fn error(&self, message: &str) -> Result<(), JournalError> {
        log::error!(target: "journal", "{message}");
        self.write(&[Channel::Main, Channel::Debug], &format!("ERROR - {message}"))
    }

    /// Records an error that ends the run and closes the run.
    pub fn fatal(&self, message: &str) -> Result<(), JournalError> {
        self.error(message)?;
        self.banner()
    }

    /// Closes the run in both logs.
    pub fn banner(&self) -> Result<(), JournalError> {
        self.write(&[Channel::Main, Channel::Debug], BANNER)
    }
}
