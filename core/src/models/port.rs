//! Validated port number.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A port number validated to lie in [1, 65535].
///
/// Construct via [`PortQuery::parse`]; a value of this type is always a
/// usable port number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortQuery(u16);

impl PortQuery {
    /// Parse and validate user input as a port number.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidPort {
                input: input.to_string(),
                reason: "port must not be empty".to_string(),
            });
        }

        let value: u32 = trimmed.parse().map_err(|_| Error::InvalidPort {
            input: input.to_string(),
            reason: "port must be a number".to_string(),
        })?;

        if value == 0 || value > u16::MAX as u32 {
            return Err(Error::InvalidPort {
                input: input.to_string(),
                reason: "port must be between 1 and 65535".to_string(),
            });
        }

        Ok(Self(value as u16))
    }

    /// The validated port number.
    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for PortQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
