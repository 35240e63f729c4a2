//! Port definitions (trait abstractions) for the host application.
//!
//! Ports define the interfaces the supervisor expects from its
//! surroundings: configuration, endpoint resolution, user notification and
//! the log display surface. They contain no implementation details and use
//! only domain types.
//!
//! # Design Rules
//!
//! - Every call is sync and non-blocking; implementations defer real work
//! - No UI or transport types in any signature
//! - Each port ships a Noop/static implementation for tests and headless
//!   contexts

pub mod endpoint_resolver;
pub mod log_viewer;
pub mod notifier;
pub mod settings;

pub use endpoint_resolver::{EndpointResolver, IdentityResolver};
pub use log_viewer::{LogViewerHost, LogViewerSurface, NoopViewerHost};
pub use notifier::{NoopNotifier, NoticeSeverity, UserNotifier};
pub use settings::{ServiceSettings, StaticSettings};
