//! Graceful termination of the service child process.
//!
//! SIGTERM first so the service can close its pipe cleanly, SIGKILL if it
//! does not exit within the grace period, then reap. Windows has no
//! SIGTERM equivalent, so the process is terminated immediately there.

use std::io;
use std::process::ExitStatus;

use tokio::process::Child;

#[cfg(unix)]
use std::time::Duration;
#[cfg(unix)]
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// How long the service gets to exit after SIGTERM.
#[cfg(unix)]
const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Terminate the child and reap it, returning the final exit status.
pub(crate) async fn shutdown_child(mut child: Child) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        shutdown_unix(&mut child).await
    }

    #[cfg(not(unix))]
    {
        child.kill().await?;
        child.wait().await
    }
}

#[cfg(unix)]
async fn shutdown_unix(child: &mut Child) -> io::Result<ExitStatus> {
    let Some(pid) = child.id() else {
        // Already exited; just reap
        return child.wait().await;
    };

    if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = timeout(GRACE_PERIOD, child.wait()).await {
        return result;
    }

    // Grace period elapsed; escalate to SIGKILL and reap
    child.kill().await?;
    child.wait().await
}
