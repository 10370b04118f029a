//! File logger for stdio deployments
//!
//! When the server runs under an MCP host, stderr may be swallowed; a log
//! file is the only way to see what happened.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use super::traits::{LogLevel, Logger};
use crate::types::now_unix;

/// Appends timestamped lines to a log file. Writes that fail are dropped
/// silently; logging must never take the server down.
pub struct FileLogger {
    file: Mutex<File>,
    min_level: LogLevel,
}

impl FileLogger {
    /// Open (or create) the log file in append mode.
    pub fn create(path: impl AsRef<Path>, min_level: LogLevel) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            file: Mutex::new(file),
            min_level,
        })
    }

}

impl Logger for FileLogger {
    fn log(&self, level: LogLevel, message: &str) {
        if level < self.min_level {
            return;
        }
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{} {} {}", now_unix(), level.as_str(), message);
        }
    }
}
