//! Configuration port for service launch options.

/// Source of launch-time configuration for the service process.
///
/// Implementations read whatever configuration store the host application
/// uses. The supervisor consults this on every spawn, so changes take
/// effect at the next start.
pub trait ServiceSettings: Send + Sync {
    /// Log level to forward to the service as `--logLevel <value>`.
    ///
    /// Returning `None` omits the flag entirely.
    fn log_level(&self) -> Option<String>;
}

/// Fixed settings for tests and embedders without a config store.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    log_level: Option<String>,
}

impl StaticSettings {
    /// Settings with no log level configured.
    #[must_use]
    pub const fn new() -> Self {
        Self { log_level: None }
    }

    /// Settings with a fixed log level.
    pub fn with_log_level(level: impl Into<String>) -> Self {
        Self {
            log_level: Some(level.into()),
        }
    }
}

impl ServiceSettings for StaticSettings {
    fn log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}
