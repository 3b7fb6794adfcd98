//! Habit Entity
//!
//! A single trackable routine tied to a time of day.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::entity::{DomainError, DomainResult, Entity};

/// Time of day a habit belongs to. Ordering is morning < afternoon < evening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 3] = [TimeOfDay::Morning, TimeOfDay::Afternoon, TimeOfDay::Evening];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        }
    }

    /// Capitalised form shown next to a habit
    pub fn label(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(TimeOfDay::Morning),
            "afternoon" => Ok(TimeOfDay::Afternoon),
            "evening" => Ok(TimeOfDay::Evening),
            "" => Err(DomainError::Validation(
                "Please select a time of day".to_string(),
            )),
            other => Err(DomainError::Validation(format!(
                "Unknown time of day '{}', expected morning, afternoon or evening",
                other
            ))),
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A habit record. Field order is the wire order of the encoded form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique within its list; creation time in epoch milliseconds
    pub id: i64,
    pub description: String,
    pub time: TimeOfDay,
    pub completed: bool,
}

impl Habit {
    /// Create a new, not yet completed habit
    pub fn new(id: i64, description: String, time: TimeOfDay) -> Self {
        Self {
            id,
            description,
            time,
            completed: false,
        }
    }

    /// Validate raw form input
    pub fn validate_description(description: &str) -> DomainResult<String> {
        let trimmed = description.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation(
                "Please enter a habit description".to_string(),
            ));
        }
        Ok(trimmed.to_string())
    }
}

impl Entity for Habit {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_habit_creation() {
        let habit = Habit::new(1, "Drink water".to_string(), TimeOfDay::Morning);
        assert_eq!(habit.id(), 1);
        assert_eq!(habit.description, "Drink water");
        assert!(!habit.completed);
    }

    #[test]
    fn test_time_of_day_parsing() {
        assert_eq!("evening".parse::<TimeOfDay>().unwrap(), TimeOfDay::Evening);
        assert_eq!(" Afternoon ".parse::<TimeOfDay>().unwrap(), TimeOfDay::Afternoon);
        assert!(matches!("noon".parse::<TimeOfDay>(), Err(DomainError::Validation(_))));
        assert!(matches!("".parse::<TimeOfDay>(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_time_of_day_order() {
        assert!(TimeOfDay::Morning < TimeOfDay::Afternoon);
        assert!(TimeOfDay::Afternoon < TimeOfDay::Evening);
        assert_eq!(TimeOfDay::Evening.label(), "Evening");
    }

    #[test]
    fn test_empty_description_rejected() {
        assert!(Habit::validate_description("   ").is_err());
        assert_eq!(Habit::validate_description(" Stretch ").unwrap(), "Stretch");
    }
}
