//! Socket rows and the pid set derived from them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// State of a socket as reported by the OS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketState {
    /// Accepting incoming connections.
    Listen,
    /// Established connection.
    Established,
    /// Any other state (SYN_SENT, TIME_WAIT, ...), carried verbatim.
    Other(String),
}

impl SocketState {
    /// Map a state label (as printed by lsof, e.g. "LISTEN") to a state.
    pub fn from_label(label: &str) -> Self {
        match label {
            "LISTEN" => SocketState::Listen,
            "ESTABLISHED" => SocketState::Established,
            other => SocketState::Other(other.to_string()),
        }
    }

    /// Whether the socket accepts incoming connections.
    pub fn is_listening(&self) -> bool {
        matches!(self, SocketState::Listen)
    }
}

/// One socket tied to its owning process.
///
/// Produced transiently per scan; never persisted. `local_port` is carried
/// natively by the scanners so consumers do not have to re-parse `address`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Name of the owning process.
    pub command: String,

    /// Process ID of the owning process.
    pub pid: u32,

    /// Username of the process owner.
    pub user: String,

    /// File descriptor label (a number on Linux, lsof's label on macOS).
    pub fd: String,

    /// Rendered endpoint: "127.0.0.1:3000", "[::1]:8080", "*:80", or
    /// "local->peer" for connected sockets.
    pub address: String,

    /// Local port the socket is bound to.
    pub local_port: u16,

    /// Socket state.
    pub state: SocketState,
}

/// Deduplicated set of process ids owning one or more sockets.
///
/// This is the unit of the kill operation: N rows sharing M distinct pids
/// yield exactly M entries, in ascending pid order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSet(BTreeSet<u32>);

impl ProcessSet {
    /// Derive the pid set from a slice of records.
    pub fn from_records(records: &[ConnectionRecord]) -> Self {
        Self(records.iter().map(|r| r.pid).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Pids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}
