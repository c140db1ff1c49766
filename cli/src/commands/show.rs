//! Show command - which process owns a port.

use anyhow::Result;
use portman_core::{ConnectionRecord, PortQuery, PortScanner, SocketFilter};

pub async fn run(port: PortQuery) -> Result<()> {
    let scanner = PortScanner::new();
    let records = scanner.scan(SocketFilter::Port(port.get())).await?;
    print!("{}", render(port, &records));
    Ok(())
}

fn render(port: PortQuery, records: &[ConnectionRecord]) -> String {
    if records.is_empty() {
        return format!("No process found on port {port}.\n");
    }
    super::render_records(records)
}
