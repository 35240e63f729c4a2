//! Output stream classification for the supervised process.
//!
//! Byte-based line reading with lossy UTF-8 decoding: native services can
//! emit invalid UTF-8 on stdout/stderr, and `BufReader::lines()` would
//! terminate the reader task on the first bad byte. Each stream gets its
//! own task; ordering is only guaranteed within a stream, never across the
//! two.

use std::sync::Weak;

use pipekeeper_core::LogSource;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tracing::{debug, warn};

use super::controller::ServiceSupervisor;

/// Literal stdout prefix announcing the service endpoint.
pub const READY_MARKER: &str = "Named pipe server started: ";

/// Extract the raw endpoint name if `line` carries the ready marker.
///
/// The marker may appear anywhere in the line; everything after it,
/// trimmed of surrounding whitespace, is the announced name.
fn extract_ready_name(line: &str) -> Option<&str> {
    line.find(READY_MARKER)
        .map(|idx| line[idx + READY_MARKER.len()..].trim())
}

/// Wire both output streams of a freshly spawned child to classifier tasks.
pub(crate) fn spawn_classifiers(child: &mut Child, supervisor: Weak<ServiceSupervisor>) {
    if let Some(stdout) = child.stdout.take() {
        spawn_stream_classifier(stdout, LogSource::Stdout, supervisor.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_stream_classifier(stderr, LogSource::Stderr, supervisor);
    }
}

/// Classify one stream line by line until EOF, a read error, or the
/// supervisor going away.
fn spawn_stream_classifier(
    stream: impl AsyncRead + Unpin + Send + 'static,
    source: LogSource,
    supervisor: Weak<ServiceSupervisor>,
) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    // Trim trailing newline(s)
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }
                    let line = String::from_utf8_lossy(&buf);
                    let Some(supervisor) = supervisor.upgrade() else {
                        break;
                    };
                    classify_line(&supervisor, source, &line).await;
                }
                Err(e) => {
                    debug!(?source, error = %e, "stream classifier exiting on read error");
                    break;
                }
            }
        }
        debug!(?source, "stream classifier task exiting");
    });
}

async fn classify_line(supervisor: &ServiceSupervisor, source: LogSource, line: &str) {
    if line.is_empty() {
        return;
    }
    supervisor.recorder().append(source, line);
    match source {
        LogSource::Stdout => {
            if let Some(raw_name) = extract_ready_name(line) {
                supervisor.handle_ready(raw_name).await;
            }
        }
        LogSource::Stderr => {
            warn!(line = %line, "service wrote to stderr");
        }
        LogSource::System => {}
    }
}
