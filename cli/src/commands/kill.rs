//! Kill command - terminate the process(es) owning a port.

use std::io;

use anyhow::{bail, Result};
use portman_core::{
    ConnectionRecord, Error, KillSignal, PortQuery, PortScanner, ProcessKiller, ProcessSet,
    SocketFilter,
};

use crate::confirm;

pub async fn run(port: PortQuery, force: bool) -> Result<()> {
    let scanner = PortScanner::new();
    let records = scanner.scan(SocketFilter::Port(port.get())).await?;
    execute(port, force, &records, confirm::ask_on_tty)
}

/// Kill control flow, separated from scanning and terminal I/O so the
/// confirmation path is testable.
fn execute(
    port: PortQuery,
    force: bool,
    records: &[ConnectionRecord],
    ask: impl Fn(&str) -> io::Result<bool>,
) -> Result<()> {
    if records.is_empty() {
        println!("No process found on port {port}.");
        return Ok(());
    }

    print!("{}", super::render_records(records));
    let pids = ProcessSet::from_records(records);

    if !force {
        let prompt = format!(
            "Kill {} process(es) on port {}?",
            pids.len(),
            port
        );
        if !ask(&prompt)? {
            println!("Aborted.");
            return Ok(());
        }
    }

    let killer = ProcessKiller::new();
    let mut killed = 0usize;
    let mut failed = 0usize;
    for (pid, outcome) in killer.kill_set(&pids, KillSignal::Term) {
        match outcome {
            Ok(()) => {
                println!("Killed process {pid}");
                killed += 1;
            }
            // Already gone counts as done; the port is free either way
            Err(Error::ProcessNotFound(_)) => {
                println!("Process {pid} already exited");
                killed += 1;
            }
            Err(e) => {
                eprintln!("Failed to kill process {pid}: {e}");
                failed += 1;
            }
        }
    }

    println!("{killed} killed, {failed} failed");
    if failed > 0 {
        bail!("failed to kill {failed} of {} process(es)", killed + failed);
    }
    Ok(())
}
