//! Process lifecycle and handshake supervision for pipekeeper.
//!
//! The supervised service is a single long-running child process that
//! announces its connection endpoint on stdout. [`ServiceSupervisor`]
//! starts it at most once per negotiation even under concurrent start
//! requests, releases queued callbacks when the ready line arrives,
//! captures output into a bounded rolling log, and tears down cleanly on
//! stop or process exit.

#![deny(unsafe_code)]

pub mod supervisor;

pub use supervisor::{
    LaunchSpec, MAX_LOG_LINES, READY_MARKER, ReadyCallback, ServiceEvent, ServiceSupervisor,
};
