//! Launch command assembly for the service process.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use pipekeeper_core::ServiceSettings;
use tokio::process::Command;

/// Fixed command line used to launch the service.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    program: PathBuf,
    args: Vec<String>,
    display_name: String,
}

impl LaunchSpec {
    /// Launch spec for the given executable.
    ///
    /// The display name defaults to the executable's file stem and is used
    /// in notifications and viewer titles.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let display_name = program.file_stem().map_or_else(
            || "service".to_string(),
            |stem| stem.to_string_lossy().into_owned(),
        );
        Self {
            program,
            args: Vec::new(),
            display_name,
        }
    }

    /// Add fixed arguments passed on every launch.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Override the human-readable service name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// Build the spawn command: fixed program and arguments, piped output
/// streams, and the configured log level forwarded as `--logLevel <value>`.
pub(crate) fn build_command(spec: &LaunchSpec, settings: &dyn ServiceSettings) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args);
    if let Some(level) = settings.log_level() {
        cmd.arg("--logLevel").arg(level);
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // Normally reaped by the monitor task; this covers runtime teardown
        .kill_on_drop(true);
    cmd
}
