//! Commands Layer
//!
//! Handlers a UI calls in response to user events. Errors come back as
//! user-facing strings.

mod habit_cmd;
mod sync_cmd;

pub use habit_cmd::*;
pub use sync_cmd::*;

use tokio::sync::MutexGuard;

use crate::domain::DomainError;
use crate::session::HabitSession;
use crate::AppState;

/// Take the session, or refuse while a sync call holds it
fn session_guard(state: &AppState) -> Result<MutexGuard<'_, HabitSession>, String> {
    state
        .session
        .try_lock()
        .map_err(|_| DomainError::Busy.to_string())
}
