//! Process termination via direct signals.
//!
//! Signals are sent with `kill(2)` through nix rather than by shelling out
//! to /bin/kill. Delivery is fire-and-forget: no waiting, no verification
//! that the target actually exited.

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::ProcessSet;

/// Which termination signal to deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillSignal {
    /// SIGTERM: ask the process to shut down.
    Term,
    /// SIGKILL: terminate immediately.
    Kill,
}

impl KillSignal {
    fn as_signal(self) -> Signal {
        match self {
            KillSignal::Term => Signal::SIGTERM,
            KillSignal::Kill => Signal::SIGKILL,
        }
    }
}

/// Sends termination signals to processes.
#[derive(Debug, Default)]
pub struct ProcessKiller;

impl ProcessKiller {
    pub fn new() -> Self {
        Self
    }

    /// Send a termination signal to one process.
    pub fn kill(&self, pid: u32, signal: KillSignal) -> Result<()> {
        let raw: i32 = pid.try_into().map_err(|_| Error::KillFailed {
            pid,
            reason: "pid out of range".to_string(),
        })?;

        debug!(pid, ?signal, "sending signal");
        match signal::kill(Pid::from_raw(raw), signal.as_signal()) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(Error::ProcessNotFound(pid)),
            Err(Errno::EPERM) => {
                warn!(pid, "permission denied");
                Err(Error::PermissionDenied(pid))
            }
            Err(e) => Err(Error::KillFailed {
                pid,
                reason: e.to_string(),
            }),
        }
    }

    /// Signal every process in the set, continuing past failures.
    ///
    /// Returns one outcome per pid, in ascending pid order.
    pub fn kill_set(&self, pids: &ProcessSet, signal: KillSignal) -> Vec<(u32, Result<()>)> {
        pids.iter()
            .map(|pid| (pid, self.kill(pid, signal)))
            .collect()
    }
}
