//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has NO I/O (serde for serialization, rand/chrono for passcodes
//! and ids).

mod entity;
mod habit;
mod habit_list;
mod passcode;

pub use entity::{DomainError, DomainResult, Entity};
pub use habit::{Habit, TimeOfDay};
pub use habit_list::{HabitList, SessionView};
pub use passcode::{Passcode, PASSCODE_LEN};
