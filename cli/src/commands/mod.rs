//! CLI commands.

pub mod kill;
pub mod list;
pub mod show;

use std::fmt::Write;

use portman_core::ConnectionRecord;

/// Render records as the COMMAND/PID/USER/FD/ADDRESS table shown by the
/// show and kill commands.
pub(crate) fn render_records(records: &[ConnectionRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:>8} {:<12} {:>6} ADDRESS",
        "COMMAND", "PID", "USER", "FD"
    );
    for r in records {
        let _ = writeln!(
            out,
            "{:<16} {:>8} {:<12} {:>6} {}",
            r.command, r.pid, r.user, r.fd, r.address
        );
    }
    out
}
