//! Interactive confirmation on the controlling terminal.
//!
//! The answer is read from /dev/tty, not stdin, so the prompt still reaches
//! a human when stdin is piped or redirected. Destructive actions must not
//! be confirmable by piped input.

use std::fs::OpenOptions;
use std::io::{self, BufRead, BufReader, Write};

/// Ask a yes/no question on the controlling terminal. Defaults to no.
///
/// Blocks until a line arrives; fails if the process has no controlling
/// terminal.
pub fn ask_on_tty(prompt: &str) -> io::Result<bool> {
    let mut tty_out = OpenOptions::new().write(true).open("/dev/tty")?;
    let tty_in = OpenOptions::new().read(true).open("/dev/tty")?;

    write!(tty_out, "{prompt} [y/N] ")?;
    tty_out.flush()?;

    let mut answer = String::new();
    BufReader::new(tty_in).read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

/// Only "y" and "yes" (case-insensitive) count as consent.
pub(crate) fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
