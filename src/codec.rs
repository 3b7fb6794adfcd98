//! Habit Codec
//!
//! Each habit travels and rests as standard base64 of its JSON form. The
//! transform only makes the text storage-neutral; it hides nothing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use serde_json::Value;

use crate::domain::{DomainError, DomainResult, Habit, HabitList};

pub fn encode(habit: &Habit) -> String {
    // Serializing a struct of plain fields cannot fail
    let json = serde_json::to_string(habit).unwrap_or_default();
    STANDARD.encode(json.as_bytes())
}

pub fn decode(text: &str) -> DomainResult<Habit> {
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|e| DomainError::Decode(format!("invalid base64: {}", e)))?;
    let json = String::from_utf8(bytes)
        .map_err(|e| DomainError::Decode(format!("invalid UTF-8: {}", e)))?;
    serde_json::from_str(&json).map_err(|e| DomainError::Decode(format!("invalid habit: {}", e)))
}

pub fn encode_all(habits: &HabitList) -> Vec<String> {
    habits.iter().map(encode).collect()
}

/// One entry of a stored `habits` array. Anything but a string is malformed.
pub fn decode_entry(entry: &Value) -> DomainResult<Habit> {
    match entry.as_str() {
        Some(text) => decode(text),
        None => Err(DomainError::Decode(format!("expected an encoded string, got {}", entry))),
    }
}

/// Decode every entry, dropping the unreadable ones and keeping the order of
/// the rest.
pub fn decode_all(entries: &[Value]) -> HabitList {
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match decode_entry(entry) {
            Ok(habit) => Some(habit),
            Err(e) => {
                log::warn!("Skipping habit entry {}: {}", index, e);
                None
            }
        })
        .collect()
}
