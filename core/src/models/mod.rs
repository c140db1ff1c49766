//! Data models for socket and process information.

mod port;
mod record;

pub use port::PortQuery;
pub use record::{ConnectionRecord, ProcessSet, SocketState};
