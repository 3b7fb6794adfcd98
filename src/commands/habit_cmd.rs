//! Commands for Habit CRUD
//!
//! Local edits to the session list. Each one is mirrored before it returns.

use crate::domain::{DomainError, Habit, SessionView, TimeOfDay};
use crate::AppState;

use super::session_guard;

/// Start a new, empty list under a fresh passcode. Any unsaved local list
/// is dropped.
pub fn new_list(state: &AppState) -> Result<String, String> {
    let mut session = session_guard(state)?;
    session.discard().map_err(|e| e.to_string())?;
    Ok(session.passcode().to_string())
}

/// Add a habit, or update `editing_id` in place when given
pub fn submit_habit(
    state: &AppState,
    description: &str,
    time: &str,
    editing_id: Option<i64>,
) -> Result<Habit, String> {
    if description.trim().is_empty() || time.trim().is_empty() {
        return Err(DomainError::Validation("Please fill out both fields!".to_string()).to_string());
    }
    let time: TimeOfDay = time.parse().map_err(|e: DomainError| e.to_string())?;

    let mut session = session_guard(state)?;
    let habit = match editing_id {
        Some(id) => session.edit(id, description, time),
        None => session.add(description, time),
    }
    .map_err(|e| e.to_string())?;
    Ok(habit)
}

pub fn delete_habit(state: &AppState, id: i64) -> Result<Habit, String> {
    let mut session = session_guard(state)?;
    session.delete(id).map_err(|e| e.to_string())
}

pub fn toggle_habit(state: &AppState, id: i64) -> Result<Habit, String> {
    let mut session = session_guard(state)?;
    session.toggle(id).map_err(|e| e.to_string())
}

/// Habits in insertion order
pub fn list_habits(state: &AppState) -> Result<Vec<Habit>, String> {
    let session = session_guard(state)?;
    Ok(session.habits().as_slice().to_vec())
}

/// Habits sorted by time of day
pub fn list_sorted_habits(state: &AppState) -> Result<Vec<Habit>, String> {
    let session = session_guard(state)?;
    Ok(session.sorted())
}

/// Habits grouped into morning / afternoon / evening
pub fn session_view(state: &AppState) -> Result<SessionView, String> {
    let session = session_guard(state)?;
    Ok(session.view())
}

pub fn current_passcode(state: &AppState) -> Result<String, String> {
    let session = session_guard(state)?;
    Ok(session.passcode().to_string())
}
