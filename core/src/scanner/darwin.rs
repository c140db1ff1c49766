//! macOS socket enumeration using lsof.
//!
//! macOS exposes no stable userspace socket-table API, so this scanner keeps
//! the subprocess+parse approach as a portability shim. Expected lsof output:
//!
//! ```text
//! COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
//! node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
//! ```

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use super::{Scan, SocketFilter};
use crate::error::{Error, Result};
use crate::models::{ConnectionRecord, SocketState};

/// macOS-specific socket scanner.
pub struct DarwinScanner;

impl DarwinScanner {
    /// Create a new macOS scanner.
    pub fn new() -> Self {
        Self
    }

    /// Parse lsof output into connection records.
    ///
    /// Columns: COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE NAME [(STATE)]
    fn parse_lsof_output(&self, output: &str, filter: SocketFilter) -> Vec<ConnectionRecord> {
        let mut records = Vec::new();

        // Skip header line
        for line in output.lines().skip(1) {
            if line.is_empty() {
                continue;
            }

            let components: Vec<&str> = line.split_whitespace().collect();
            if components.len() < 9 {
                continue;
            }

            // lsof escapes spaces and slashes in command names
            let command = components[0].replace("\\x20", " ").replace("\\x2f", "/");

            let pid: u32 = match components[1].parse() {
                Ok(p) => p,
                Err(_) => continue,
            };

            let user = components[2].to_string();
            let fd = components[3].to_string();

            // Trailing "(STATE)" token, when present
            let state = components
                .last()
                .and_then(|c| c.strip_prefix('('))
                .and_then(|c| c.strip_suffix(')'))
                .map(SocketState::from_label)
                .unwrap_or_else(|| SocketState::Other("UNKNOWN".to_string()));

            // Find the NAME column: search backwards for a component with ":"
            // that isn't a device or offset value
            let mut address = String::new();
            for comp in components[8..].iter().rev() {
                if comp.contains(':') && !comp.starts_with("0x") && !comp.starts_with("0t") {
                    address = comp.to_string();
                    break;
                }
            }
            if address.is_empty() {
                continue;
            }

            let Some(local_port) = local_port_of(&address) else {
                continue;
            };

            // lsof -i:<port> matches either endpoint; keep local matches only
            let keep = match filter {
                SocketFilter::Listening => state.is_listening(),
                SocketFilter::All => true,
                SocketFilter::Port(port) => local_port == port,
            };
            if !keep {
                continue;
            }

            records.push(ConnectionRecord {
                command,
                pid,
                user,
                fd,
                address,
                local_port,
                state,
            });
        }

        records.sort_by(|a, b| (a.local_port, a.pid).cmp(&(b.local_port, b.pid)));
        records
    }
}

impl Default for DarwinScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scan for DarwinScanner {
    /// Enumerate TCP sockets using lsof.
    ///
    /// Flags explained:
    /// - -iTCP: show only TCP sockets (optionally restricted to one port)
    /// - -sTCP:LISTEN: show only listening sockets
    /// - -P: show port numbers (don't resolve to service names)
    /// - -n: show IP addresses (don't resolve to hostnames)
    /// - +c 0: show full command name (unlimited length)
    async fn scan(&self, filter: SocketFilter) -> Result<Vec<ConnectionRecord>> {
        let mut args = vec!["-nP".to_string(), "+c".to_string(), "0".to_string()];
        match filter {
            SocketFilter::Listening => {
                args.push("-iTCP".to_string());
                args.push("-sTCP:LISTEN".to_string());
            }
            SocketFilter::All => args.push("-iTCP".to_string()),
            SocketFilter::Port(port) => args.push(format!("-iTCP:{port}")),
        }

        let output = Command::new("/usr/sbin/lsof")
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::ToolUnavailable { tool: "lsof" }
                } else {
                    Error::CommandFailed(format!("failed to run lsof: {e}"))
                }
            })?;

        // lsof exits non-zero when nothing matched; an empty table is fine
        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::ParseError(format!("invalid UTF-8 in lsof output: {e}")))?;

        let records = self.parse_lsof_output(&stdout, filter);
        debug!(count = records.len(), ?filter, "scan complete");
        Ok(records)
    }
}

/// Extract the local port from the trailing segment of an lsof NAME column
/// ("127.0.0.1:3000", "*:80", "[::1]:443->[::1]:52000").
fn local_port_of(address: &str) -> Option<u16> {
    let local = address.split("->").next()?;
    local.rsplit(':').next()?.parse().ok()
}
