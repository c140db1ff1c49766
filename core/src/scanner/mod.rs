//! Socket enumeration with platform-specific implementations.
//!
//! Linux reads the kernel socket tables under /proc directly; macOS shells
//! out to lsof as a portability shim (no stable userspace socket-table API).

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod darwin;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
compile_error!("Unsupported platform: only Linux and macOS are supported");

use crate::error::Result;
use crate::models::ConnectionRecord;

#[cfg(target_os = "linux")]
pub use linux::LinuxScanner;

#[cfg(target_os = "macos")]
pub use darwin::DarwinScanner;

/// Row filter applied during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketFilter {
    /// Sockets in the listening state only.
    Listening,
    /// Every open TCP socket, any state.
    All,
    /// Sockets bound to the given local port, any state.
    Port(u16),
}

/// Trait for platform-specific socket enumeration implementations.
pub trait Scan: Send + Sync {
    /// Enumerate TCP sockets matching the filter.
    ///
    /// An empty result is not an error; it means no socket matched.
    fn scan(
        &self,
        filter: SocketFilter,
    ) -> impl std::future::Future<Output = Result<Vec<ConnectionRecord>>> + Send;
}

/// The main socket scanner that uses platform-specific implementations.
pub struct PortScanner {
    #[cfg(target_os = "linux")]
    inner: linux::LinuxScanner,

    #[cfg(target_os = "macos")]
    inner: darwin::DarwinScanner,
}

impl PortScanner {
    /// Create a new scanner for the current platform.
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "linux")]
            inner: linux::LinuxScanner::new(),

            #[cfg(target_os = "macos")]
            inner: darwin::DarwinScanner::new(),
        }
    }

    /// Enumerate TCP sockets matching the filter.
    pub async fn scan(&self, filter: SocketFilter) -> Result<Vec<ConnectionRecord>> {
        self.inner.scan(filter).await
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}
