//! List command - listening ports or all open connections.

use std::collections::BTreeSet;
use std::fmt::Write;

use anyhow::Result;
use portman_core::{ConnectionRecord, PortScanner, SocketFilter};

pub async fn run(all: bool) -> Result<()> {
    let scanner = PortScanner::new();
    let filter = if all {
        SocketFilter::All
    } else {
        SocketFilter::Listening
    };
    let records = scanner.scan(filter).await?;

    let rendered = if all {
        render_all(&records)
    } else {
        render_listening(&records)
    };
    print!("{rendered}");
    Ok(())
}

/// Listening ports: deduplicated rows sorted ascending numerically by port.
/// Order among rows sharing a port is tie-broken by the remaining columns.
fn render_listening(records: &[ConnectionRecord]) -> String {
    let rows: BTreeSet<(u16, String, u32, String)> = records
        .iter()
        .map(|r| (r.local_port, r.command.clone(), r.pid, r.user.clone()))
        .collect();

    if rows.is_empty() {
        return "No listening ports found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{:<6} {:<16} {:>8} USER", "PORT", "COMMAND", "PID");
    for (port, command, pid, user) in rows {
        let _ = writeln!(out, "{port:<6} {command:<16} {pid:>8} {user}");
    }
    out
}

/// All connections: deduplicated and sorted by full row content.
fn render_all(records: &[ConnectionRecord]) -> String {
    let rows: BTreeSet<(String, u32, String, String)> = records
        .iter()
        .map(|r| (r.command.clone(), r.pid, r.user.clone(), r.address.clone()))
        .collect();

    if rows.is_empty() {
        return "No open connections found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{:<16} {:>8} {:<12} ADDRESS", "COMMAND", "PID", "USER");
    for (command, pid, user, address) in rows {
        let _ = writeln!(out, "{command:<16} {pid:>8} {user:<12} {address}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::listen_record;
    use portman_core::SocketState;

    #[test]
    fn listening_table_contains_port_pid_user() {
        let records = vec![listen_record(8080, 111, "alice", "node")];
        let out = render_listening(&records);
        assert!(out.contains("8080"));
        assert!(out.contains("111"));
        assert!(out.contains("alice"));
    }

    #[test]
    fn listening_rows_sort_numerically_by_port() {
        let records = vec![
            listen_record(8080, 1, "a", "x"),
            listen_record(80, 2, "b", "y"),
            listen_record(443, 3, "c", "z"),
            listen_record(3000, 4, "d", "w"),
        ];
        let out = render_listening(&records);
        let positions: Vec<usize> = ["80 ", "443", "3000", "8080"]
            .iter()
            .map(|p| out.find(*p).expect("port missing from output"))
            .collect();
        // 80 < 443 < 3000 < 8080 numerically (not lexicographically)
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{out}");
    }

    #[test]
    fn identical_rows_collapse() {
        // v4 and v6 sockets of the same process produce identical rows
        let records = vec![
            listen_record(8080, 111, "alice", "node"),
            listen_record(8080, 111, "alice", "node"),
        ];
        let out = render_listening(&records);
        assert_eq!(out.matches("8080").count(), 1);

        let out = render_all(&records);
        assert_eq!(out.matches("node").count(), 1);
    }

    #[test]
    fn all_table_shows_addresses() {
        let mut record = listen_record(52000, 222, "bob", "curl");
        record.address = "127.0.0.1:52000->93.184.216.34:443".to_string();
        record.state = SocketState::Established;

        let out = render_all(&[record]);
        assert!(out.starts_with("COMMAND"));
        assert!(out.contains("curl"));
        assert!(out.contains("127.0.0.1:52000->93.184.216.34:443"));
    }

    #[test]
    fn empty_results_have_messages() {
        assert_eq!(render_listening(&[]), "No listening ports found.\n");
        assert_eq!(render_all(&[]), "No open connections found.\n");
    }
}
