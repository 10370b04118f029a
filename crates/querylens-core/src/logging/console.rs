//! Stderr logger

use super::traits::{LogLevel, Logger};

/// Writes prefixed lines to stderr.
///
/// Every level goes to stderr, never stdout: stdout carries the protocol
/// stream when the server runs over stdio, and a stray log line there
/// corrupts the framing.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    prefix: String,
    min_level: LogLevel,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self::with_prefix("[querylens]")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            min_level: LogLevel::Debug,
        }
    }

    /// Drop lines below `level`.
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, level: LogLevel, message: &str) {
        if level < self.min_level {
            return;
        }
        eprintln!("{} {}: {}", self.prefix, level.as_str(), message);
    }
}
