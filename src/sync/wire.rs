//! Remote Wire Format
//!
//! JSON bodies exchanged with the key-value endpoint.

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::domain::{HabitList, Passcode};

/// Body of `POST /` and `PUT /{passcode}`
#[derive(Debug, Serialize)]
pub struct HabitPayload<'a> {
    pub passcode: &'a Passcode,
    pub habits: Vec<String>,
}

impl<'a> HabitPayload<'a> {
    pub fn new(passcode: &'a Passcode, habits: &HabitList) -> Self {
        Self {
            passcode,
            habits: codec::encode_all(habits),
        }
    }
}

/// Body of a successful `GET /{passcode}`. Every field is optional so that a
/// store answering `{}` for an unknown key can be told apart from a bad body.
#[derive(Debug, Default, Deserialize)]
pub struct RemoteRecord {
    #[serde(default)]
    pub passcode: Option<String>,
    /// Kept as raw values so one malformed entry only costs that entry
    #[serde(default)]
    pub habits: Option<Vec<serde_json::Value>>,
    /// Store-assigned record id, opaque to the client
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}
