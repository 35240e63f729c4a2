//! Lifecycle events for host applications.
//!
//! The supervisor publishes these on a broadcast channel so hosts can keep
//! a synchronized view of the service without polling `state()`.

use serde::{Deserialize, Serialize};

/// Lifecycle event published by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServiceEvent {
    /// A process has been spawned; the handshake is in flight.
    Starting,
    /// The ready line arrived and the endpoint is resolved.
    Running {
        /// Resolved connection address.
        endpoint: String,
    },
    /// The service was stopped explicitly.
    Stopped,
    /// The process exited on its own, before or after becoming ready.
    Exited {
        /// Exit code when the process returned one.
        code: Option<i32>,
    },
}

impl ServiceEvent {
    pub(crate) fn running(endpoint: impl Into<String>) -> Self {
        Self::Running {
            endpoint: endpoint.into(),
        }
    }

    pub(crate) const fn exited(code: Option<i32>) -> Self {
        Self::Exited { code }
    }
}
