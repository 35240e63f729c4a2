//! On-demand log viewer bridge.
//!
//! Creates at most one passive display surface at a time, feeds it the
//! buffered output, and leaves it attached so live lines keep streaming in
//! until the surface closes or the service restarts.

use std::sync::Arc;

use chrono::Local;
use pipekeeper_core::{LogViewerHost, NoticeSeverity, SupervisorError, UserNotifier};
use tracing::debug;

use super::recorder::LogRecorder;

/// Open the captured output in a new viewer surface.
///
/// Informational outcomes (nothing captured yet, viewer already open) are
/// reported through the notifier and change nothing.
pub(crate) fn open_log_viewer(
    recorder: &LogRecorder,
    service_name: &str,
    host: &dyn LogViewerHost,
    notifier: &dyn UserNotifier,
) -> Result<(), SupervisorError> {
    if recorder.is_empty() {
        notifier.notify(NoticeSeverity::Info, "No logs have been captured yet");
        return Ok(());
    }
    if recorder.has_live_viewer() {
        notifier.notify(NoticeSeverity::Info, "Log viewer is already open");
        return Ok(());
    }

    let entries = recorder.snapshot();
    let title = format!(
        "{service_name} logs ({})",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    let surface = host.open_viewer(&title)?;
    for entry in &entries {
        surface.append_line(&entry.render());
    }
    surface.scroll_to_end();
    recorder.attach_viewer(Arc::downgrade(&surface));
    debug!(lines = entries.len(), title = %title, "opened log viewer");
    Ok(())
}
