use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::{LoggerError, LoggerFormat, LoggerLevel, LoggerTimeZone};

/// Environment variable whose filter expression overrides the configured level.
pub const LEVEL_ENV: &str = "STK_LOG";

/// Logger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// Filter expression, e.g. `"info"` or `"stk_core=debug,info"`.
    pub level: LoggerLevel,
    pub tz: LoggerTimeZone,
    /// Include the module path of each record.
    pub with_targets: bool,
    /// ANSI colors for text output; ignored when stdout is not a terminal.
    pub use_color: bool,
    /// Log when instrumented operations (deploy, teardown, backoff runs) close, with their
    /// busy and idle time.
    pub span_events: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            tz: LoggerTimeZone::default(),
            with_targets: true,
            use_color: true,
            span_events: false,
        }
    }
}

impl LoggerConfig {
    pub fn should_use_color(&self) -> bool {
        self.format == LoggerFormat::Text && self.use_color && std::io::stdout().is_terminal()
    }

    /// Replace the level with the value of [`LEVEL_ENV`], when set.
    pub fn with_env_level(self) -> Result<Self, LoggerError> {
        match std::env::var(LEVEL_ENV) {
            Ok(expr) => self.with_level(&expr),
            Err(_) => Ok(self),
        }
    }

    pub fn with_level(mut self, expr: &str) -> Result<Self, LoggerError> {
        self.level = expr.parse()?;
        Ok(self)
    }
}
