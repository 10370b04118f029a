//! Logging abstractions
//!
//! The server speaks its protocol on stdout, so nothing in this crate may
//! log there. Components take an `Arc<dyn Logger>` and stay agnostic about
//! where the output lands (stderr, a file, or nowhere).

mod console;
mod file;
mod noop;
mod traits;

pub use console::ConsoleLogger;
pub use file::FileLogger;
pub use noop::NoOpLogger;
pub use traits::{LogLevel, Logger, SharedLogger};
