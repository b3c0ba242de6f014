//! Logging abstractions
//!
//! The registry and the façade report through an injected `Logger`; the
//! precedence resolver traces into the global `file_logger`.

mod traits;
mod noop;
mod console;
mod memory;
pub mod file_logger;

pub use traits::{Logger, SharedLogger};
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;
pub use memory::MemoryLogger;
pub use file_logger::LogLevel;
