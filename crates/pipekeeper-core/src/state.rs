//! Lifecycle states of the supervised service.

use serde::{Deserialize, Serialize};

/// Lifecycle state of the supervised service process.
///
/// The supervisor's `state()` is a pure projection of its internal flags
/// onto these three values; there are no intermediate states visible to
/// callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    /// No process and no start in flight.
    Stopped,
    /// A start has been requested; the ready line has not arrived yet.
    Starting,
    /// The process announced its endpoint and is accepting connections.
    Running,
}
