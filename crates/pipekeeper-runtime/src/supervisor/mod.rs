//! Supervision of the service process.
//!
//! # Structure
//!
//! - `controller` - the Stopped/Starting/Running state machine
//! - `classifier` - stdout/stderr line classification and ready detection
//! - `recorder` - bounded rolling capture of service output
//! - `viewer` - on-demand log viewer bridge
//! - `command` - launch command assembly
//! - `shutdown` - SIGTERM → SIGKILL teardown
//! - `events` - broadcast lifecycle events

mod classifier;
mod command;
mod controller;
mod events;
mod recorder;
mod shutdown;
mod viewer;

// Re-export commonly used types
pub use classifier::READY_MARKER;
pub use command::LaunchSpec;
pub use controller::{ReadyCallback, ServiceSupervisor};
pub use events::ServiceEvent;
pub use recorder::MAX_LOG_LINES;
