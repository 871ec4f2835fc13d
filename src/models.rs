// Data models for TodoStore

use crate::record::Record;
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a todo item (milliseconds since epoch at creation)
pub type TodoId = i64;

/// A single entry in the todo list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: TodoId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl TodoItem {
    pub fn new(id: TodoId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
        }
    }

    /// Creation time, recovered from the id
    pub fn created_at(&self) -> Option<DateTime<Local>> {
        Local.timestamp_millis_opt(self.id).single()
    }
}

impl Record for TodoItem {
    fn collection_name() -> &'static str {
        "todos"
    }
}

/// Source of the current time in milliseconds
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        now_ms()
    }
}

/// Issues strictly increasing ids derived from the clock
///
/// Two adds inside the same millisecond (or a clock that steps backwards) would collide
/// on a raw timestamp, so the generator never issues an id at or below the last one.
/// Seeding with the largest existing id keeps ids unique across reloads.
pub struct IdGenerator {
    clock: Box<dyn Clock>,
    last: TodoId,
}

impl IdGenerator {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self { clock, last: 0 }
    }

    /// Make sure future ids stay above `id`
    pub fn observe(&mut self, id: TodoId) {
        self.last = self.last.max(id);
    }

    /// Next id, or `None` once the id space above the last issued id is used up
    pub fn next_id(&mut self) -> Option<TodoId> {
        let id = self.clock.now_ms().max(self.last.checked_add(1)?);
        self.last = id;
        Some(id)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(Box::new(SystemClock))
    }
}

impl std::fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdGenerator").field("last", &self.last).finish()
    }
}

/// Helper function to get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
