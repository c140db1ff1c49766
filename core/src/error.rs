//! Error types for the portman-core library.

use thiserror::Error;

/// Result type alias for portman operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during socket enumeration and process termination.
#[derive(Error, Debug)]
pub enum Error {
    /// The supplied port is empty, non-numeric, or outside [1, 65535].
    #[error("invalid port number '{input}': {reason}")]
    InvalidPort { input: String, reason: String },

    /// A required external tool is not installed.
    #[error("required tool '{tool}' is not installed")]
    ToolUnavailable { tool: &'static str },

    /// Failed to execute a system command.
    #[error("command execution failed: {0}")]
    CommandFailed(String),

    /// Failed to parse command output or a kernel table.
    #[error("failed to parse output: {0}")]
    ParseError(String),

    /// Signal target does not exist.
    #[error("process with PID {0} not found")]
    ProcessNotFound(u32),

    /// Not allowed to signal the target process.
    #[error("permission denied to kill process {0}")]
    PermissionDenied(u32),

    /// Signal delivery was rejected for another reason.
    #[error("failed to kill process {pid}: {reason}")]
    KillFailed { pid: u32, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
