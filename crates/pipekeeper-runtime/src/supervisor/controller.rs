//! Lifecycle controller for the supervised service process.
//!
//! One [`ServiceSupervisor`] owns the whole Stopped → Starting → Running
//! state machine: it spawns the process at most once per negotiation,
//! queues start callbacks until the ready line arrives, and tears
//! everything down on stop or process exit. All state mutation is
//! serialized through a single lock, so concurrent `start`/`stop` calls
//! and stream classification cannot interleave unsafely.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use pipekeeper_core::{
    EndpointResolver, LogEntry, LogSource, LogViewerHost, NoticeSeverity, ServiceSettings,
    ServiceState, SupervisorError, UserNotifier,
};
use tokio::process::Child;
use tokio::sync::{Mutex, broadcast, oneshot};
use tracing::{debug, info, warn};

use super::classifier::spawn_classifiers;
use super::command::{LaunchSpec, build_command};
use super::events::ServiceEvent;
use super::recorder::LogRecorder;
use super::shutdown::shutdown_child;
use super::viewer::open_log_viewer;

/// Queued continuation released when the service becomes ready.
pub type ReadyCallback = Box<dyn FnOnce() + Send + 'static>;

/// Broadcast channel capacity for lifecycle events
const EVENT_CAPACITY: usize = 64;

/// Handle to the currently spawned process.
struct ProcessHandle {
    pid: u32,
    /// Spawn generation; exit reports from older generations are stale.
    generation: u64,
    /// Signals the monitor task to terminate the child.
    kill_tx: Option<oneshot::Sender<()>>,
}

/// Mutable supervisor state. Invariants:
///
/// - at most one live process handle at any time
/// - `ready` and `negotiating` are never both true
/// - `pending` is non-empty only while `negotiating`
#[derive(Default)]
struct SupervisorInner {
    process: Option<ProcessHandle>,
    ready: bool,
    negotiating: bool,
    endpoint: Option<String>,
    pending: Vec<ReadyCallback>,
    generation: u64,
}

impl SupervisorInner {
    /// Pure projection of the flags onto the public state machine.
    fn project(&self) -> ServiceState {
        if self.ready && self.process.is_some() {
            ServiceState::Running
        } else if self.negotiating {
            ServiceState::Starting
        } else {
            ServiceState::Stopped
        }
    }
}

/// Supervises a single long-running service process that announces its
/// endpoint on stdout.
///
/// Construct with [`ServiceSupervisor::new`] and share the `Arc`; there is
/// no ambient global. The supervisor never restarts the service on its own
/// and keeps no process pool.
pub struct ServiceSupervisor {
    inner: Mutex<SupervisorInner>,
    recorder: LogRecorder,
    launch: LaunchSpec,
    settings: Arc<dyn ServiceSettings>,
    resolver: Arc<dyn EndpointResolver>,
    notifier: Arc<dyn UserNotifier>,
    viewer_host: Arc<dyn LogViewerHost>,
    events: broadcast::Sender<ServiceEvent>,
    /// Handed to classifier and monitor tasks so they never keep the
    /// supervisor alive on their own.
    weak_self: Weak<Self>,
}

impl ServiceSupervisor {
    /// Create a supervisor for the given launch spec and host ports.
    pub fn new(
        launch: LaunchSpec,
        settings: Arc<dyn ServiceSettings>,
        resolver: Arc<dyn EndpointResolver>,
        notifier: Arc<dyn UserNotifier>,
        viewer_host: Arc<dyn LogViewerHost>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new_cyclic(|weak_self| Self {
            inner: Mutex::new(SupervisorInner::default()),
            recorder: LogRecorder::new(),
            launch,
            settings,
            resolver,
            notifier,
            viewer_host,
            events,
            weak_self: weak_self.clone(),
        })
    }

    /// Request the service and run `callback` once it is ready.
    ///
    /// Never blocks on the handshake: when the service is already running
    /// the callback is invoked before this returns; otherwise it is queued
    /// and released by the ready line. Concurrent calls while a start is in
    /// flight coalesce onto the same process.
    ///
    /// # Errors
    ///
    /// [`SupervisorError::Spawn`] when the process cannot be created at
    /// all; queued callbacks are dropped and a later call may retry.
    pub async fn start(
        &self,
        callback: impl FnOnce() + Send + 'static,
    ) -> Result<(), SupervisorError> {
        let mut inner = self.inner.lock().await;
        match inner.project() {
            ServiceState::Running => {
                drop(inner);
                invoke_isolated(Box::new(callback));
                Ok(())
            }
            ServiceState::Starting => {
                inner.pending.push(Box::new(callback));
                Ok(())
            }
            ServiceState::Stopped => {
                inner.pending.push(Box::new(callback));
                inner.negotiating = true;
                // Logs reflect only the current process instance
                self.recorder.reset();
                inner.generation += 1;
                let generation = inner.generation;
                match self.spawn_service(generation) {
                    Ok(handle) => {
                        debug!(pid = handle.pid, generation, "service process spawned");
                        inner.process = Some(handle);
                        let _ = self.events.send(ServiceEvent::Starting);
                        Ok(())
                    }
                    Err(err) => {
                        inner.negotiating = false;
                        let dropped = inner.pending.len();
                        inner.pending.clear();
                        if dropped > 0 {
                            warn!(dropped, "spawn failed; dropping queued start callbacks");
                        }
                        Err(err)
                    }
                }
            }
        }
    }

    /// Tear the service down and drop any queued callbacks.
    ///
    /// Idempotent: stopping an already stopped supervisor does nothing, no
    /// notification, no error.
    pub async fn stop(&self) {
        let (mut handle, dropped) = {
            let mut inner = self.inner.lock().await;
            let Some(handle) = inner.process.take() else {
                return;
            };
            inner.ready = false;
            inner.negotiating = false;
            inner.endpoint = None;
            let dropped = inner.pending.len();
            inner.pending.clear();
            (handle, dropped)
        };
        if dropped > 0 {
            debug!(
                dropped,
                "stop requested mid-negotiation; discarding queued callbacks"
            );
        }
        info!(pid = handle.pid, "stopping service");
        if let Some(kill_tx) = handle.kill_tx.take() {
            let _ = kill_tx.send(());
        }
        let _ = self.events.send(ServiceEvent::Stopped);
    }

    /// Current lifecycle state. Pure projection, no side effects.
    pub async fn state(&self) -> ServiceState {
        self.inner.lock().await.project()
    }

    /// Resolved endpoint address while the service is running.
    pub async fn endpoint(&self) -> Option<String> {
        self.inner.lock().await.endpoint.clone()
    }

    /// Snapshot of the captured output in insertion order.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.recorder.snapshot()
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServiceEvent> {
        self.events.subscribe()
    }

    /// Open the captured output in a viewer surface.
    ///
    /// With nothing captured yet, or with a viewer already open, this only
    /// notifies the user and leaves everything untouched.
    ///
    /// # Errors
    ///
    /// [`SupervisorError::Viewer`] when the host cannot open a surface.
    pub fn dump_logs(&self) -> Result<(), SupervisorError> {
        open_log_viewer(
            &self.recorder,
            self.launch.display_name(),
            self.viewer_host.as_ref(),
            self.notifier.as_ref(),
        )
    }

    pub(crate) fn recorder(&self) -> &LogRecorder {
        &self.recorder
    }

    /// Spawn the process and wire up classifier and monitor tasks.
    fn spawn_service(&self, generation: u64) -> Result<ProcessHandle, SupervisorError> {
        let mut command = build_command(&self.launch, self.settings.as_ref());
        let program = self.launch.program().display().to_string();
        let mut child = command.spawn().map_err(|source| SupervisorError::Spawn {
            program: program.clone(),
            source,
        })?;
        let Some(pid) = child.id() else {
            let _ = child.start_kill();
            return Err(SupervisorError::Spawn {
                program,
                source: std::io::Error::other("child has no PID"),
            });
        };

        spawn_classifiers(&mut child, self.weak_self.clone());

        let (kill_tx, kill_rx) = oneshot::channel();
        self.spawn_monitor(child, generation, kill_rx);

        Ok(ProcessHandle {
            pid,
            generation,
            kill_tx: Some(kill_tx),
        })
    }

    /// Watch the child until it exits, or terminate it on a stop signal.
    fn spawn_monitor(&self, mut child: Child, generation: u64, mut kill_rx: oneshot::Receiver<()>) {
        let weak = self.weak_self.clone();
        tokio::spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status,
                _ = &mut kill_rx => {
                    debug!(generation, "stop requested; shutting the service down");
                    shutdown_child(child).await
                }
            };
            if let Some(supervisor) = weak.upgrade() {
                supervisor.handle_exit(generation, status).await;
            }
        });
    }

    /// Ready-line transition. One-shot per negotiation: duplicate ready
    /// lines and lines arriving after a stop are ignored.
    pub(crate) async fn handle_ready(&self, raw_name: &str) {
        let endpoint = self.resolver.resolve(raw_name);
        let callbacks = {
            let mut inner = self.inner.lock().await;
            if !inner.negotiating || inner.process.is_none() {
                debug!(raw_name, "ignoring ready line outside an active negotiation");
                return;
            }
            inner.ready = true;
            inner.negotiating = false;
            inner.endpoint = Some(endpoint.clone());
            std::mem::take(&mut inner.pending)
        };
        info!(endpoint = %endpoint, "service is ready");
        let _ = self.events.send(ServiceEvent::running(endpoint));
        let released = callbacks.len();
        for callback in callbacks {
            invoke_isolated(callback);
        }
        debug!(released, "released queued start callbacks");
    }

    /// Process-exit transition. Reports from a superseded spawn generation
    /// are ignored; pending callbacks are dropped, never invoked.
    pub(crate) async fn handle_exit(
        &self,
        generation: u64,
        status: std::io::Result<std::process::ExitStatus>,
    ) {
        let dropped = {
            let mut inner = self.inner.lock().await;
            match &inner.process {
                Some(handle) if handle.generation == generation => {}
                _ => {
                    debug!(generation, "ignoring exit report from a superseded process");
                    return;
                }
            }
            inner.process = None;
            inner.ready = false;
            inner.negotiating = false;
            inner.endpoint = None;
            std::mem::take(&mut inner.pending)
        };
        if !dropped.is_empty() {
            debug!(
                count = dropped.len(),
                "service exited before ready; dropping queued callbacks"
            );
        }
        let name = self.launch.display_name();
        match status {
            Ok(status) => {
                let message = match status.code() {
                    Some(code) => format!("{name} exited with code {code}"),
                    None => format!("{name} exited: {status}"),
                };
                let severity = if status.success() {
                    NoticeSeverity::Info
                } else {
                    NoticeSeverity::Error
                };
                info!(%status, "service process exited");
                self.recorder.append(LogSource::System, &message);
                self.notifier.notify(severity, &message);
                let _ = self.events.send(ServiceEvent::exited(status.code()));
            }
            Err(err) => {
                let message = format!("{name} exited with unknown status: {err}");
                warn!(error = %err, "failed to collect service exit status");
                self.recorder.append(LogSource::System, &message);
                self.notifier.notify(NoticeSeverity::Error, &message);
                let _ = self.events.send(ServiceEvent::exited(None));
            }
        }
    }
}

/// Run one queued callback inside its own failure boundary.
///
/// A panicking callback must not take down the remaining queue or the task
/// draining it.
fn invoke_isolated(callback: ReadyCallback) {
    if catch_unwind(AssertUnwindSafe(callback)).is_err() {
        warn!("start callback panicked; continuing");
    }
}
