//! Error types for supervisor operations.
//!
//! Only spawn failure propagates to the caller of `start()`; every other
//! process-level failure is contained by the supervisor and converted to
//! notifications and log entries.

use thiserror::Error;

/// Errors surfaced by the supervisor's public operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The service process could not be created at all.
    ///
    /// Negotiation state is rolled back before this is returned, so a
    /// later `start()` can retry.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        /// Program that was being launched.
        program: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The viewer host could not open a display surface.
    #[error(transparent)]
    Viewer(#[from] ViewerError),
}

/// Errors from the log viewer host port.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The host cannot create surfaces right now.
    #[error("log viewer unavailable: {0}")]
    Unavailable(String),
}
