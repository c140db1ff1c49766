//! Portman Core Library
//!
//! Library for inspecting and terminating OS processes bound to network
//! ports. Provides functionality to:
//! - Enumerate TCP sockets (listening, all states, or by local port)
//! - Derive the deduplicated set of owning processes
//! - Send termination signals by PID
//!
//! # Platform Support
//! - Linux: reads /proc/net/tcp{,6} and /proc/<pid>/fd directly, no
//!   external tools
//! - macOS: uses `lsof` as a portability shim

pub mod error;
pub mod killer;
pub mod models;
pub mod scanner;

pub use error::{Error, Result};
pub use killer::{KillSignal, ProcessKiller};
pub use models::{ConnectionRecord, PortQuery, ProcessSet, SocketState};
pub use scanner::{PortScanner, Scan, SocketFilter};
