//! Passcode
//!
//! Six-digit numeric string that is both the remote key and the only
//! credential for a habit list.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{DomainError, DomainResult};

pub const PASSCODE_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Passcode(String);

impl Passcode {
    /// Uniform draw over 100000..=999999
    pub fn generate() -> Self {
        let n: u32 = rand::thread_rng().gen_range(100_000..=999_999);
        Passcode(n.to_string())
    }

    /// Accept exactly six ASCII digits. Leading zeros are valid input even
    /// though `generate` never produces them.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let raw = raw.trim();
        if raw.len() == PASSCODE_LEN && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Passcode(raw.to_string()))
        } else {
            Err(DomainError::Validation(format!(
                "Passcode must be {} digits, got '{}'",
                PASSCODE_LEN, raw
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Passcode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Passcode::parse(s)
    }
}

impl TryFrom<String> for Passcode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Passcode::parse(&value)
    }
}

impl From<Passcode> for String {
    fn from(passcode: Passcode) -> Self {
        passcode.0
    }
}

impl fmt::Display for Passcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
