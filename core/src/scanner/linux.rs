//! Linux socket enumeration reading /proc directly.
//!
//! Instead of shelling out to ss/lsof and parsing their tables, this scanner
//! reads the kernel socket tables (`/proc/net/tcp`, `/proc/net/tcp6`) and
//! resolves each socket inode to its owning process by walking
//! `/proc/<pid>/fd`. The proc root is overridable via `HOST_PROC` for
//! containerized use, or via [`LinuxScanner::with_proc_root`].

use std::collections::HashMap;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;

use nix::unistd::{Uid, User};
use tracing::{debug, warn};

use super::{Scan, SocketFilter};
use crate::error::{Error, Result};
use crate::models::{ConnectionRecord, SocketState};

/// Linux-specific socket scanner.
pub struct LinuxScanner {
    proc_root: PathBuf,
}

/// One row of a kernel socket table.
struct SockEntry {
    local: (IpAddr, u16),
    peer: (IpAddr, u16),
    state: SocketState,
    uid: u32,
    inode: u64,
}

impl LinuxScanner {
    /// Create a scanner rooted at `/proc` (or `$HOST_PROC` if set).
    pub fn new() -> Self {
        let proc_root = std::env::var_os("HOST_PROC")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/proc"));
        Self { proc_root }
    }

    /// Create a scanner rooted at an explicit proc mount.
    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    /// Read and parse the socket tables, keeping rows that match the filter.
    fn socket_entries(&self, filter: SocketFilter) -> Result<Vec<SockEntry>> {
        let mut entries = Vec::new();

        for (table, required) in [("net/tcp", true), ("net/tcp6", false)] {
            let path = self.proc_root.join(table);
            let data = match fs::read_to_string(&path) {
                Ok(data) => data,
                // tcp6 is absent on v4-only kernels
                Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                    debug!(table, "socket table not present, skipping");
                    continue;
                }
                Err(e) => return Err(Error::Io(e)),
            };

            for line in data.lines() {
                let Some(entry) = parse_socket_line(line) else {
                    continue;
                };
                let keep = match filter {
                    SocketFilter::Listening => entry.state.is_listening(),
                    SocketFilter::All => true,
                    SocketFilter::Port(port) => entry.local.1 == port,
                };
                if keep {
                    entries.push(entry);
                }
            }
        }

        Ok(entries)
    }

    /// Map socket inode -> owning (pid, fd) pairs by walking /proc/<pid>/fd.
    ///
    /// A socket shared across processes (fork, SO_REUSEPORT via fd passing)
    /// yields one pair per owner. Processes we cannot inspect (other users'
    /// without root) are silently skipped.
    fn socket_owners(&self) -> HashMap<u64, Vec<(u32, String)>> {
        let mut owners: HashMap<u64, Vec<(u32, String)>> = HashMap::new();

        let proc_dir = match fs::read_dir(&self.proc_root) {
            Ok(dir) => dir,
            Err(e) => {
                warn!(error = %e, "cannot read proc root");
                return owners;
            }
        };

        for proc_entry in proc_dir.filter_map(|e| e.ok()) {
            let name = proc_entry.file_name();
            let Some(pid) = name.to_str().and_then(|s| s.parse::<u32>().ok()) else {
                continue;
            };

            let Ok(fds) = fs::read_dir(proc_entry.path().join("fd")) else {
                continue;
            };
            for fd_entry in fds.filter_map(|e| e.ok()) {
                let Ok(link) = fs::read_link(fd_entry.path()) else {
                    continue;
                };
                let Some(target) = link.to_str() else {
                    continue;
                };
                let Some(inode) = target
                    .strip_prefix("socket:[")
                    .and_then(|s| s.strip_suffix(']'))
                    .and_then(|s| s.parse::<u64>().ok())
                else {
                    continue;
                };
                let fd = fd_entry.file_name().to_string_lossy().into_owned();
                owners.entry(inode).or_default().push((pid, fd));
            }
        }

        owners
    }

    /// Process name from /proc/<pid>/comm, or "-" if unreadable.
    fn read_comm(&self, pid: u32) -> String {
        fs::read_to_string(self.proc_root.join(pid.to_string()).join("comm"))
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| "-".to_string())
    }
}

impl Default for LinuxScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scan for LinuxScanner {
    async fn scan(&self, filter: SocketFilter) -> Result<Vec<ConnectionRecord>> {
        let entries = self.socket_entries(filter)?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let owners = self.socket_owners();
        let mut records = Vec::new();

        for entry in &entries {
            let Some(owner_list) = owners.get(&entry.inode) else {
                // Socket whose owner we cannot see; nothing to report or kill
                debug!(inode = entry.inode, "no visible owner for socket");
                continue;
            };
            for (pid, fd) in owner_list {
                records.push(ConnectionRecord {
                    command: self.read_comm(*pid),
                    pid: *pid,
                    user: resolve_user(entry.uid),
                    fd: fd.clone(),
                    address: format_endpoint(entry),
                    local_port: entry.local.1,
                    state: entry.state.clone(),
                });
            }
        }

        records.sort_by(|a, b| (a.local_port, a.pid).cmp(&(b.local_port, b.pid)));
        debug!(count = records.len(), ?filter, "scan complete");
        Ok(records)
    }
}

/// Parse one data row of /proc/net/tcp{,6}. Returns None for the header and
/// malformed rows.
fn parse_socket_line(line: &str) -> Option<SockEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 10 || !fields[0].ends_with(':') {
        return None;
    }

    Some(SockEntry {
        local: parse_hex_addr(fields[1])?,
        peer: parse_hex_addr(fields[2])?,
        state: state_from_hex(fields[3]),
        uid: fields[7].parse().ok()?,
        inode: fields[9].parse().ok()?,
    })
}

/// Decode a kernel "ADDR:PORT" pair, both hex. IPv4 addresses are a single
/// little-endian u32; IPv6 addresses are four little-endian u32 groups.
fn parse_hex_addr(s: &str) -> Option<(IpAddr, u16)> {
    let (addr, port) = s.split_once(':')?;
    let port = u16::from_str_radix(port, 16).ok()?;

    let ip = match addr.len() {
        8 => {
            let raw = u32::from_str_radix(addr, 16).ok()?;
            IpAddr::V4(Ipv4Addr::from(raw.swap_bytes()))
        }
        32 => {
            let mut octets = [0u8; 16];
            for (i, chunk) in octets.chunks_exact_mut(4).enumerate() {
                let word = u32::from_str_radix(&addr[i * 8..(i + 1) * 8], 16).ok()?;
                chunk.copy_from_slice(&word.to_le_bytes());
            }
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        _ => return None,
    };

    Some((ip, port))
}

/// Map the kernel state nibble to a socket state.
fn state_from_hex(st: &str) -> SocketState {
    match st {
        "0A" => SocketState::Listen,
        "01" => SocketState::Established,
        "02" => SocketState::Other("SYN_SENT".to_string()),
        "03" => SocketState::Other("SYN_RECV".to_string()),
        "04" => SocketState::Other("FIN_WAIT1".to_string()),
        "05" => SocketState::Other("FIN_WAIT2".to_string()),
        "06" => SocketState::Other("TIME_WAIT".to_string()),
        "07" => SocketState::Other("CLOSE".to_string()),
        "08" => SocketState::Other("CLOSE_WAIT".to_string()),
        "09" => SocketState::Other("LAST_ACK".to_string()),
        "0B" => SocketState::Other("CLOSING".to_string()),
        other => SocketState::Other(other.to_string()),
    }
}

/// Render the endpoint the way lsof would: local address for unconnected
/// sockets, "local->peer" for connected ones, "*" for the wildcard address.
fn format_endpoint(entry: &SockEntry) -> String {
    let local = format_addr_port(entry.local);
    if entry.peer.1 == 0 {
        local
    } else {
        format!("{}->{}", local, format_addr_port(entry.peer))
    }
}

fn format_addr_port((ip, port): (IpAddr, u16)) -> String {
    if ip.is_unspecified() {
        return format!("*:{port}");
    }
    match ip {
        IpAddr::V4(v4) => format!("{v4}:{port}"),
        IpAddr::V6(v6) => format!("[{v6}]:{port}"),
    }
}

/// Resolve a uid to a username, falling back to the numeric uid.
fn resolve_user(uid: u32) -> String {
    match User::from_uid(Uid::from_raw(uid)) {
        Ok(Some(user)) => user.name,
        _ => uid.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    const HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode";

    fn tcp_row(sl: u32, local: &str, peer: &str, st: &str, uid: u32, inode: u64) -> String {
        format!(
            "   {sl}: {local} {peer} {st} 00000000:00000000 00:00000000 00000000 {uid:>5}        0 {inode} 1 0000000000000000 100 0 0 10 0"
        )
    }

    /// Build a fake proc tree: a socket table plus the fd symlinks and comm
    /// files needed to attribute each socket to a process.
    fn fake_proc(rows: &[String], procs: &[(u32, &str, &[(u32, u64)])]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("net")).unwrap();
        let mut table = String::from(HEADER);
        for row in rows {
            table.push('\n');
            table.push_str(row);
        }
        table.push('\n');
        fs::write(dir.path().join("net/tcp"), table).unwrap();

        for (pid, comm, fds) in procs {
            let pid_dir = dir.path().join(pid.to_string());
            fs::create_dir_all(pid_dir.join("fd")).unwrap();
            fs::write(pid_dir.join("comm"), format!("{comm}\n")).unwrap();
            for (fd, inode) in *fds {
                symlink(
                    format!("socket:[{inode}]"),
                    pid_dir.join("fd").join(fd.to_string()),
                )
                .unwrap();
            }
        }

        dir
    }

    #[test]
    fn parses_ipv4_hex_address() {
        let (ip, port) = parse_hex_addr("0100007F:1F90").unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(port, 8080);

        let (ip, port) = parse_hex_addr("00000000:0050").unwrap();
        assert!(ip.is_unspecified());
        assert_eq!(port, 80);
    }

    #[test]
    fn parses_ipv6_hex_address() {
        let (ip, port) = parse_hex_addr("00000000000000000000000001000000:0BB8").unwrap();
        assert_eq!(ip, IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(port, 3000);
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(parse_hex_addr("0100007F").is_none());
        assert!(parse_hex_addr("XYZ:1F90").is_none());
        assert!(parse_hex_addr("0100:1F90").is_none());
    }

    #[test]
    fn skips_header_line() {
        assert!(parse_socket_line(HEADER).is_none());
        assert!(parse_socket_line("").is_none());
    }

    #[test]
    fn parses_listen_row() {
        let row = tcp_row(0, "0100007F:1F90", "00000000:0000", "0A", 0, 99999);
        let entry = parse_socket_line(&row).unwrap();
        assert_eq!(entry.local.1, 8080);
        assert_eq!(entry.state, SocketState::Listen);
        assert_eq!(entry.uid, 0);
        assert_eq!(entry.inode, 99999);
    }

    #[test]
    fn formats_endpoints() {
        let listen = SockEntry {
            local: (IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
            peer: (IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            state: SocketState::Listen,
            uid: 0,
            inode: 1,
        };
        assert_eq!(format_endpoint(&listen), "127.0.0.1:8080");

        let established = SockEntry {
            peer: (IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)), 443),
            state: SocketState::Established,
            ..listen
        };
        assert_eq!(format_endpoint(&established), "127.0.0.1:8080->10.0.0.2:443");

        let wildcard = (IpAddr::V6(Ipv6Addr::UNSPECIFIED), 80);
        assert_eq!(format_addr_port(wildcard), "*:80");
    }

    #[tokio::test]
    async fn scans_listening_sockets_from_fake_tree() {
        let rows = vec![
            tcp_row(0, "0100007F:1F90", "00000000:0000", "0A", 0, 99999),
            // Established connection on the same port, different socket
            tcp_row(1, "0100007F:1F90", "0100007F:D431", "01", 0, 88888),
        ];
        let procs: &[(u32, &str, &[(u32, u64)])] = &[
            (4242, "node", &[(7, 99999)]),
            (4243, "curl", &[(3, 88888)]),
        ];
        let dir = fake_proc(&rows, procs);
        let scanner = LinuxScanner::with_proc_root(dir.path());

        let records = scanner.scan(SocketFilter::Listening).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pid, 4242);
        assert_eq!(records[0].command, "node");
        assert_eq!(records[0].user, "root");
        assert_eq!(records[0].local_port, 8080);
        assert_eq!(records[0].fd, "7");
        assert_eq!(records[0].address, "127.0.0.1:8080");
        assert!(records[0].state.is_listening());
    }

    #[tokio::test]
    async fn port_filter_matches_any_state() {
        let rows = vec![
            tcp_row(0, "0100007F:1F90", "00000000:0000", "0A", 0, 99999),
            tcp_row(1, "0100007F:1F90", "0100007F:D431", "01", 0, 88888),
            tcp_row(2, "0100007F:0BB8", "00000000:0000", "0A", 0, 77777),
        ];
        let procs: &[(u32, &str, &[(u32, u64)])] = &[
            (4242, "node", &[(7, 99999)]),
            (4243, "curl", &[(3, 88888)]),
            (4244, "python", &[(5, 77777)]),
        ];
        let dir = fake_proc(&rows, procs);
        let scanner = LinuxScanner::with_proc_root(dir.path());

        let records = scanner.scan(SocketFilter::Port(8080)).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.local_port == 8080));

        let records = scanner.scan(SocketFilter::Port(3000)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pid, 4244);

        // No socket on this port: empty, not an error
        let records = scanner.scan(SocketFilter::Port(9999)).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn shared_socket_yields_one_record_per_owner() {
        let rows = vec![tcp_row(0, "0100007F:1F90", "00000000:0000", "0A", 0, 99999)];
        let procs: &[(u32, &str, &[(u32, u64)])] = &[
            (100, "nginx", &[(6, 99999)]),
            (101, "nginx", &[(6, 99999)]),
        ];
        let dir = fake_proc(&rows, procs);
        let scanner = LinuxScanner::with_proc_root(dir.path());

        let records = scanner.scan(SocketFilter::All).await.unwrap();
        assert_eq!(records.len(), 2);
        let mut pids: Vec<u32> = records.iter().map(|r| r.pid).collect();
        pids.sort_unstable();
        assert_eq!(pids, vec![100, 101]);
    }

    #[tokio::test]
    async fn unowned_sockets_are_skipped() {
        let rows = vec![tcp_row(0, "0100007F:1F90", "00000000:0000", "0A", 0, 55555)];
        let dir = fake_proc(&rows, &[]);
        let scanner = LinuxScanner::with_proc_root(dir.path());

        let records = scanner.scan(SocketFilter::Listening).await.unwrap();
        assert!(records.is_empty());
    }
}
