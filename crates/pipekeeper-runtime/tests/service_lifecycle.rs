//! End-to-end lifecycle tests driving real child processes through the
//! ready handshake.

#![cfg(unix)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pipekeeper_core::{
    EndpointResolver, LogSource, NoopViewerHost, NoticeSeverity, ServiceState, StaticSettings,
    UserNotifier,
};
use pipekeeper_runtime::{LaunchSpec, READY_MARKER, ServiceEvent, ServiceSupervisor};
use tokio::time::sleep;

/// Announces after a beat, then stays up until stopped.
const READY_SCRIPT: &str = r#"sleep 0.5; echo "Named pipe server started:  svcpipe42 "; sleep 30"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn sh(script: &str) -> LaunchSpec {
    LaunchSpec::new("/bin/sh")
        .with_args(["-c", script])
        .with_display_name("testsvc")
}

struct PrefixResolver;

impl EndpointResolver for PrefixResolver {
    fn resolve(&self, raw_name: &str) -> String {
        format!("/run/pipes/{raw_name}")
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notes: Mutex<Vec<(NoticeSeverity, String)>>,
}

impl RecordingNotifier {
    fn notes(&self) -> Vec<(NoticeSeverity, String)> {
        self.notes.lock().unwrap().clone()
    }
}

impl UserNotifier for RecordingNotifier {
    fn notify(&self, severity: NoticeSeverity, message: &str) {
        self.notes.lock().unwrap().push((severity, message.to_string()));
    }
}

fn supervisor_with(
    script: &str,
    notifier: Arc<RecordingNotifier>,
) -> Arc<ServiceSupervisor> {
    init_tracing();
    ServiceSupervisor::new(
        sh(script),
        Arc::new(StaticSettings::new()),
        Arc::new(PrefixResolver),
        notifier,
        Arc::new(NoopViewerHost),
    )
}

async fn wait_for_state(supervisor: &ServiceSupervisor, state: ServiceState) {
    for _ in 0..200 {
        if supervisor.state().await == state {
            return;
        }
        sleep(Duration::from_millis(25)).await;
    }
    panic!(
        "timed out waiting for {state:?}, still {:?}",
        supervisor.state().await
    );
}

async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        sleep(Duration::from_millis(25)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn handshake_releases_queued_callbacks_in_order() {
    let notifier = Arc::new(RecordingNotifier::default());
    let supervisor = supervisor_with(READY_SCRIPT, notifier);

    let order = Arc::new(Mutex::new(Vec::new()));
    let (o1, o2) = (order.clone(), order.clone());
    supervisor
        .start(move || o1.lock().unwrap().push(1))
        .await
        .unwrap();
    assert_eq!(supervisor.state().await, ServiceState::Starting);
    supervisor
        .start(move || o2.lock().unwrap().push(2))
        .await
        .unwrap();

    wait_for_state(&supervisor, ServiceState::Running).await;
    {
        let order = order.clone();
        wait_until(move || order.lock().unwrap().len() == 2).await;
    }
    assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    assert_eq!(
        supervisor.endpoint().await.as_deref(),
        Some("/run/pipes/svcpipe42")
    );

    // Exactly one process announced itself
    let ready_lines = supervisor
        .logs()
        .iter()
        .filter(|entry| entry.message.contains(READY_MARKER))
        .count();
    assert_eq!(ready_lines, 1);

    supervisor.stop().await;
}

#[tokio::test]
async fn start_after_running_fires_inline() {
    let notifier = Arc::new(RecordingNotifier::default());
    let supervisor = supervisor_with(READY_SCRIPT, notifier);

    supervisor.start(|| {}).await.unwrap();
    wait_for_state(&supervisor, ServiceState::Running).await;

    let fired = Arc::new(AtomicUsize::new(0));
    let f = fired.clone();
    supervisor
        .start(move || {
            f.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(supervisor.state().await, ServiceState::Running);

    supervisor.stop().await;
}

#[tokio::test]
async fn ordinary_output_does_not_complete_the_handshake() {
    let notifier = Arc::new(RecordingNotifier::default());
    let supervisor = supervisor_with(
        r#"echo "loading modules"; echo "listening soon"; sleep 30"#,
        notifier,
    );

    let fired = Arc::new(AtomicUsize::new(0));
    let f = fired.clone();
    supervisor
        .start(move || {
            f.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

    sleep(Duration::from_millis(600)).await;
    assert_eq!(supervisor.state().await, ServiceState::Starting);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert!(supervisor.endpoint().await.is_none());

    supervisor.stop().await;
}

#[tokio::test]
async fn crash_before_ready_drops_callbacks_and_notifies() {
    let notifier = Arc::new(RecordingNotifier::default());
    let supervisor = supervisor_with(r#"echo "starting up"; exit 3"#, notifier.clone());

    let fired = Arc::new(AtomicUsize::new(0));
    let f = fired.clone();
    supervisor
        .start(move || {
            f.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

    {
        let notifier = notifier.clone();
        wait_until(move || !notifier.notes().is_empty()).await;
    }
    assert_eq!(supervisor.state().await, ServiceState::Stopped);
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    let notes = notifier.notes();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].0, NoticeSeverity::Error);
    assert!(notes[0].1.contains("code 3"), "note: {}", notes[0].1);
}

#[tokio::test]
async fn clean_exit_notifies_at_info_severity() {
    let notifier = Arc::new(RecordingNotifier::default());
    let supervisor = supervisor_with(r#"echo "nothing to do"; exit 0"#, notifier.clone());

    supervisor.start(|| {}).await.unwrap();
    {
        let notifier = notifier.clone();
        wait_until(move || !notifier.notes().is_empty()).await;
    }
    let notes = notifier.notes();
    assert_eq!(notes[0].0, NoticeSeverity::Info);
    assert!(notes[0].1.contains("code 0"), "note: {}", notes[0].1);
}

#[tokio::test]
async fn stop_tears_down_a_running_service() {
    let notifier = Arc::new(RecordingNotifier::default());
    let supervisor = supervisor_with(READY_SCRIPT, notifier.clone());

    supervisor.start(|| {}).await.unwrap();
    wait_for_state(&supervisor, ServiceState::Running).await;

    supervisor.stop().await;
    assert_eq!(supervisor.state().await, ServiceState::Stopped);
    assert!(supervisor.endpoint().await.is_none());

    // An explicit stop is not an abnormal exit
    sleep(Duration::from_millis(300)).await;
    assert!(notifier.notes().is_empty());
}

#[tokio::test]
async fn stop_on_a_stopped_supervisor_is_a_noop() {
    let notifier = Arc::new(RecordingNotifier::default());
    let supervisor = supervisor_with(READY_SCRIPT, notifier.clone());

    supervisor.stop().await;
    supervisor.stop().await;
    assert_eq!(supervisor.state().await, ServiceState::Stopped);
    assert!(notifier.notes().is_empty());
}

#[tokio::test]
async fn stderr_output_is_captured_with_its_own_tag() {
    let notifier = Arc::new(RecordingNotifier::default());
    let supervisor = supervisor_with(
        r#"echo "oops" 1>&2; echo "Named pipe server started: p1"; sleep 30"#,
        notifier,
    );

    supervisor.start(|| {}).await.unwrap();
    wait_for_state(&supervisor, ServiceState::Running).await;
    {
        let supervisor = supervisor.clone();
        wait_until(move || {
            supervisor
                .logs()
                .iter()
                .any(|entry| entry.source == LogSource::Stderr && entry.message == "oops")
        })
        .await;
    }

    supervisor.stop().await;
}

#[tokio::test]
async fn restart_starts_from_an_empty_log_buffer() {
    let notifier = Arc::new(RecordingNotifier::default());
    // Each instance logs its own shell PID before announcing
    let supervisor = supervisor_with(
        r#"echo "instance $$"; echo "Named pipe server started: p1"; sleep 30"#,
        notifier,
    );

    supervisor.start(|| {}).await.unwrap();
    wait_for_state(&supervisor, ServiceState::Running).await;
    let first_instance = supervisor
        .logs()
        .iter()
        .find(|entry| entry.message.starts_with("instance "))
        .map(|entry| entry.message.clone())
        .expect("first instance line captured");

    supervisor.stop().await;
    wait_for_state(&supervisor, ServiceState::Stopped).await;

    supervisor.start(|| {}).await.unwrap();
    wait_for_state(&supervisor, ServiceState::Running).await;

    let logs = supervisor.logs();
    assert!(
        !logs.iter().any(|entry| entry.message == first_instance),
        "previous instance's output leaked into the new buffer"
    );

    supervisor.stop().await;
}

#[tokio::test]
async fn lifecycle_events_are_broadcast() {
    let notifier = Arc::new(RecordingNotifier::default());
    let supervisor = supervisor_with(READY_SCRIPT, notifier);
    let mut events = supervisor.subscribe();

    supervisor.start(|| {}).await.unwrap();
    let first = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("no event")
        .unwrap();
    assert_eq!(first, ServiceEvent::Starting);

    let second = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("no event")
        .unwrap();
    assert_eq!(
        second,
        ServiceEvent::Running {
            endpoint: "/run/pipes/svcpipe42".to_string()
        }
    );

    supervisor.stop().await;
    let third = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("no event")
        .unwrap();
    assert_eq!(third, ServiceEvent::Stopped);
}
