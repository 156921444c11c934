//! Injectable logging capability.
//!
//! The client never reaches for a process-wide logger on its own: a
//! [`ClientLogger`] is handed to it through [`ClientOptions`](crate::ClientOptions)
//! and shared with the device facade and the batch/monitor callers.

use std::fmt;
use std::sync::Arc;

/// Default `log` target used by [`LogFacade`].
pub const DEFAULT_LOG_TARGET: &str = "iotsdk";

/// Sink for SDK diagnostics.
pub trait ClientLogger: Send + Sync + fmt::Debug {
    /// Verbose diagnostics such as raw response bodies. Ignored unless overridden.
    fn debug(&self, _message: &str) {}
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Shared handle to a logger.
pub type SharedLogger = Arc<dyn ClientLogger>;

/// Forwards SDK diagnostics to the `log` facade under a fixed target.
#[derive(Debug, Clone)]
pub struct LogFacade {
    target: String,
}

impl LogFacade {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Default for LogFacade {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_TARGET)
    }
}

impl ClientLogger for LogFacade {
    fn debug(&self, message: &str) {
        log::debug!(target: self.target.as_str(), "{}", message);
    }

    fn info(&self, message: &str) {
        log::info!(target: self.target.as_str(), "{}", message);
    }

    fn warn(&self, message: &str) {
        log::warn!(target: self.target.as_str(), "{}", message);
    }

    fn error(&self, message: &str) {
        log::error!(target: self.target.as_str(), "{}", message);
    }
}

/// Logger used when the caller does not inject one.
pub fn default_logger() -> SharedLogger {
    Arc::new(LogFacade::default())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::ClientLogger;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Level {
        Info,
        Warn,
        Error,
    }

    /// Captures log lines so tests can assert on them.
    #[derive(Debug, Default)]
    pub struct RecordingLogger {
        lines: Mutex<Vec<(Level, String)>>,
    }

    impl RecordingLogger {
        pub fn lines(&self) -> Vec<(Level, String)> {
            self.lines.lock().unwrap().clone()
        }

        pub fn messages_at(&self, level: Level) -> Vec<String> {
            self.lines()
                .into_iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, m)| m)
                .collect()
        }

        fn push(&self, level: Level, message: &str) {
            self.lines.lock().unwrap().push((level, message.to_string()));
        }
    }

    impl ClientLogger for RecordingLogger {
        fn info(&self, message: &str) {
            self.push(Level::Info, message);
        }

        fn warn(&self, message: &str) {
            self.push(Level::Warn, message);
        }

        fn error(&self, message: &str) {
            self.push(Level::Error, message);
        }
    }
}
