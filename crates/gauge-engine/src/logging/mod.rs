//! Logging utilities.
//!
//! Everything in the engine logs through the `log` facade. This module only
//! installs `env_logger` for binaries that do not bring their own logger.

mod init;

pub use init::{init_logging, LoggingConfig};
