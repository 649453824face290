//! Console and file logging for the command line tool
//!
//! [`Logger`] implements [`log::Log`], echoing records to stderr and appending
//! them to a log file. Without a log file the CLI falls back to `env_logger`.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};

pub struct Logger {
    file: Mutex<File>,
    level: LevelFilter,
}

impl Logger {
    /// Creates a logger writing to `log_file`, truncating it
    pub fn new(log_file: &Path, level: LevelFilter) -> io::Result<Self> {
        let file = File::create(log_file)?;
        Ok(Logger {
            file: Mutex::new(file),
            level,
        })
    }

    /// Installs the global logger
    ///
    /// # Arguments
    /// * `log_file` - File to mirror records into; `env_logger` is used when absent
    /// * `verbose` - Lower the level from `info` to `debug`
    pub fn init(log_file: Option<&Path>, verbose: bool) -> io::Result<()> {
        let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
        match log_file {
            Some(path) => {
                let logger = Logger::new(path, level)?;
                if log::set_boxed_logger(Box::new(logger)).is_err() {
                    eprintln!("Warning: global logger was already initialized");
                }
                log::set_max_level(level);
            }
            None => {
                let _ = env_logger::Builder::new()
                    .filter_level(level)
                    .parse_default_env()
                    .try_init();
            }
        }
        Ok(())
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        writeln!(file, "{}", line)?;
        file.flush()
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let line = format!("[{}] {}: {}", record.level(), record.target(), record.args());
            let _ = self.write_line(&line);
            eprintln!("{}", line);
        }
    }

    fn flush(&self) {}
}
