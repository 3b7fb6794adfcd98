//! Habit List
//!
//! Ordered collection of habits owned by one passcode. Insertion order is
//! preserved; time-of-day ordering only exists in derived views.

use super::entity::{DomainError, DomainResult, Entity};
use super::habit::{Habit, TimeOfDay};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitList {
    habits: Vec<Habit>,
}

/// Habits grouped by time of day, each group in list order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionView {
    pub morning: Vec<Habit>,
    pub afternoon: Vec<Habit>,
    pub evening: Vec<Habit>,
}

impl SessionView {
    pub fn group(&self, time: TimeOfDay) -> &[Habit] {
        match time {
            TimeOfDay::Morning => &self.morning,
            TimeOfDay::Afternoon => &self.afternoon,
            TimeOfDay::Evening => &self.evening,
        }
    }
}

impl HabitList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Habit> {
        self.habits.iter()
    }

    pub fn as_slice(&self) -> &[Habit] {
        &self.habits
    }

    pub fn into_vec(self) -> Vec<Habit> {
        self.habits
    }

    pub fn find(&self, id: i64) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id() == id)
    }

    fn position(&self, id: i64) -> DomainResult<usize> {
        self.habits
            .iter()
            .position(|habit| habit.id() == id)
            .ok_or_else(|| DomainError::Validation(format!("No habit with id {}", id)))
    }

    /// Id for a habit created at `now_ms`, bumped past existing ids on a clash
    fn next_id(&self, now_ms: i64) -> DomainResult<i64> {
        if self.find(now_ms).is_none() {
            return Ok(now_ms);
        }
        let max = self.habits.iter().map(|habit| habit.id).max().unwrap_or(now_ms);
        max.checked_add(1).ok_or_else(|| {
            DomainError::Validation(format!("No habit id left after {}", max))
        })
    }

    /// Append a new habit stamped with the current time
    pub fn add(&mut self, description: &str, time: TimeOfDay) -> DomainResult<&Habit> {
        self.add_at(chrono::Utc::now().timestamp_millis(), description, time)
    }

    pub(crate) fn add_at(
        &mut self,
        now_ms: i64,
        description: &str,
        time: TimeOfDay,
    ) -> DomainResult<&Habit> {
        let description = Habit::validate_description(description)?;
        let id = self.next_id(now_ms)?;
        self.habits.push(Habit::new(id, description, time));
        let index = self.habits.len() - 1;
        Ok(&self.habits[index])
    }

    /// Replace description and time in place. The id is kept and the habit
    /// starts over as not completed.
    pub fn edit(&mut self, id: i64, description: &str, time: TimeOfDay) -> DomainResult<&Habit> {
        let description = Habit::validate_description(description)?;
        let index = self.position(id)?;
        self.habits[index] = Habit::new(id, description, time);
        Ok(&self.habits[index])
    }

    pub fn delete(&mut self, id: i64) -> DomainResult<Habit> {
        let index = self.position(id)?;
        Ok(self.habits.remove(index))
    }

    pub fn toggle(&mut self, id: i64) -> DomainResult<&Habit> {
        let index = self.position(id)?;
        self.habits[index].completed = !self.habits[index].completed;
        Ok(&self.habits[index])
    }

    /// Stable sort by time of day
    pub fn sorted_by_time(&self) -> Vec<Habit> {
        let mut sorted = self.habits.clone();
        sorted.sort_by_key(|habit| habit.time);
        sorted
    }

    pub fn grouped(&self) -> SessionView {
        let mut view = SessionView::default();
        for habit in &self.habits {
            let group = match habit.time {
                TimeOfDay::Morning => &mut view.morning,
                TimeOfDay::Afternoon => &mut view.afternoon,
                TimeOfDay::Evening => &mut view.evening,
            };
            group.push(habit.clone());
        }
        view
    }
}

impl From<Vec<Habit>> for HabitList {
    fn from(habits: Vec<Habit>) -> Self {
        Self { habits }
    }
}

impl FromIterator<Habit> for HabitList {
    fn from_iter<I: IntoIterator<Item = Habit>>(iter: I) -> Self {
        Self {
            habits: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a HabitList {
    type Item = &'a Habit;
    type IntoIter = std::slice::Iter<'a, Habit>;

    fn into_iter(self) -> Self::IntoIter {
        self.habits.iter()
    }
}
