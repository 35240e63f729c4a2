//! Core domain types and port definitions for pipekeeper.
//!
//! The supervised service is a single long-running child process that
//! announces a named-pipe endpoint on its standard output. This crate holds
//! the domain vocabulary (lifecycle states, captured log entries, errors)
//! and the ports the supervisor expects its host application to implement.
//! Ports contain no implementation details and use only domain types.

pub mod error;
pub mod log;
pub mod ports;
pub mod state;

// Re-export commonly used types for convenience
pub use error::{SupervisorError, ViewerError};
pub use log::{LogEntry, LogSource};
pub use ports::{
    EndpointResolver, IdentityResolver, LogViewerHost, LogViewerSurface, NoopNotifier,
    NoopViewerHost, NoticeSeverity, ServiceSettings, StaticSettings, UserNotifier,
};
pub use state::ServiceState;
