//! Logger setup shared by the stk binaries.
mod config;
pub use config::{LEVEL_ENV, LoggerConfig};

mod error;
pub use error::{LoggerError, LoggerResult};

mod format;
pub use format::LoggerFormat;

mod install;
pub use install::init_logger;

mod level;
pub use level::LoggerLevel;

mod timer;
pub use timer::{LoggerRfc3339, LoggerTimeZone, init_local_offset};
