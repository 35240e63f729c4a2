//! Log viewer port.

use std::sync::Arc;

use crate::error::ViewerError;

/// A passive, read-only display surface showing captured log lines.
///
/// Surfaces are owned by their host (an editor tab, a TUI pane) and can be
/// closed at any moment without the supervisor's involvement. The recorder
/// therefore holds surfaces weakly and re-checks `is_open` before every
/// write.
pub trait LogViewerSurface: Send + Sync {
    /// Whether the surface is still visible to the user.
    fn is_open(&self) -> bool;

    /// Append one rendered line at the end of the surface.
    fn append_line(&self, line: &str);

    /// Scroll so the newest line is visible.
    fn scroll_to_end(&self);
}

/// Factory for viewer surfaces.
///
/// The supervisor keeps at most one surface at a time; a new one is only
/// requested once the previous one has been closed or the service
/// restarted.
pub trait LogViewerHost: Send + Sync {
    /// Open a new read-only surface with the given title.
    fn open_viewer(&self, title: &str) -> Result<Arc<dyn LogViewerSurface>, ViewerError>;
}

/// Host for headless contexts; opening a viewer always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopViewerHost;

impl LogViewerHost for NoopViewerHost {
    fn open_viewer(&self, _title: &str) -> Result<Arc<dyn LogViewerSurface>, ViewerError> {
        Err(ViewerError::Unavailable(
            "no viewer host configured".to_string(),
        ))
    }
}
