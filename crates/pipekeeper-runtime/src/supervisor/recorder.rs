//! Bounded rolling buffer of captured service output.

use std::collections::VecDeque;
use std::sync::{Mutex, Weak};

use pipekeeper_core::{LogEntry, LogSource, LogViewerSurface};
use tracing::debug;

/// Maximum number of log lines to keep in the ring buffer.
pub const MAX_LOG_LINES: usize = 5000;

struct RecorderState {
    entries: VecDeque<LogEntry>,
    viewer: Option<Weak<dyn LogViewerSurface>>,
}

/// Append-only, size-bounded recorder for service output.
///
/// Appends are sync and never block, so they can run directly on the
/// classifier tasks. Mirroring a new line into an attached viewer is
/// deferred onto the runtime; the surface may be closed by its host
/// between scheduling and execution, so liveness is re-checked inside the
/// deferred task.
pub struct LogRecorder {
    state: Mutex<RecorderState>,
}

impl LogRecorder {
    /// Create an empty recorder with no attached viewer.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RecorderState {
                entries: VecDeque::new(),
                viewer: None,
            }),
        }
    }

    /// Record one output line, evicting the oldest entry past the cap.
    ///
    /// Empty lines are dropped: no entry, no viewer write.
    pub fn append(&self, source: LogSource, line: &str) {
        if line.is_empty() {
            return;
        }
        let entry = LogEntry::new(source, line);
        let viewer = {
            let mut state = self.state.lock().unwrap();
            if state.entries.len() >= MAX_LOG_LINES {
                state.entries.pop_front();
            }
            state.entries.push_back(entry.clone());
            state.viewer.clone()
        };
        if let Some(weak) = viewer {
            mirror_to_viewer(weak, entry.render());
        }
    }

    /// Forget everything from the previous process instance.
    ///
    /// Also ends the stream into an attached viewer; a restart gets a
    /// fresh surface on the next dump.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.entries.clear();
        if state.viewer.take().is_some() {
            debug!("log recorder reset; detaching viewer");
        }
    }

    /// Snapshot of the buffered entries in insertion order.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.state.lock().unwrap().entries.iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().entries.is_empty()
    }

    /// Whether an attached surface is still alive and open.
    pub fn has_live_viewer(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .viewer
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|surface| surface.is_open())
    }

    /// Attach a surface; new lines stream into it until it closes or the
    /// recorder is reset.
    pub fn attach_viewer(&self, surface: Weak<dyn LogViewerSurface>) {
        self.state.lock().unwrap().viewer = Some(surface);
    }
}

impl Default for LogRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Push a line into the attached viewer without blocking the caller.
fn mirror_to_viewer(weak: Weak<dyn LogViewerSurface>, rendered: String) {
    // Outside a runtime (plain std thread) the buffer still records; only
    // the live mirror is skipped.
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        return;
    };
    handle.spawn(async move {
        if let Some(surface) = weak.upgrade() {
            if surface.is_open() {
                surface.append_line(&rendered);
            }
        }
    });
}
