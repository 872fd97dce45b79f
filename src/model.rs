use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::due::{format_for_input, input_to_payload, normalize_input, parse_due};
use crate::error::ValidationError;
use crate::priority::{normalize_or_default, Priority, PriorityInput};

/// Server-assigned identifier. The backend uses numbers but the client
/// treats ids as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TodoId {
    Number(i64),
    Text(String),
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TodoId::Number(n) => write!(f, "{n}"),
            TodoId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for TodoId {
    fn from(value: i64) -> Self {
        TodoId::Number(value)
    }
}

impl From<&str> for TodoId {
    fn from(value: &str) -> Self {
        TodoId::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    #[serde(default)]
    pub todo_nm: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "truthy")]
    pub achievement: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Todo {
    pub fn title(&self) -> &str {
        self.todo_nm.as_deref().unwrap_or_default()
    }

    /// The due date as a timestamp; `None` when absent or unreadable.
    pub fn due_at(&self) -> Option<NaiveDateTime> {
        self.due_date.as_deref().and_then(parse_due)
    }
}

fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// The body sent on create and update. Every field is always present;
/// `dueDate` is `null` when there is no deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPayload {
    pub todo_nm: String,
    pub description: String,
    pub priority: Priority,
    pub achievement: bool,
    pub due_date: Option<String>,
}

/// Assembles a [`TodoPayload`] field by field.
///
/// Unset fields fall back to `""` for text, the default priority, no due
/// date, and `false` for completion. [`PayloadBuilder::over`] layers one
/// builder on top of another so overrides can be applied to a record or a
/// draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadBuilder {
    todo_nm: Option<String>,
    description: Option<String>,
    priority: Option<Priority>,
    due_date: Option<Option<String>>,
    achievement: Option<bool>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn todo_nm(mut self, value: impl Into<String>) -> Self {
        self.todo_nm = Some(value.into());
        self
    }

    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    pub fn priority<T: PriorityInput + ?Sized>(mut self, value: &T) -> Self {
        self.priority = Some(normalize_or_default(value));
        self
    }

    /// `None` clears the deadline. The string is sent exactly as given.
    pub fn due_date(mut self, value: Option<String>) -> Self {
        self.due_date = Some(value);
        self
    }

    pub fn achievement(mut self, value: bool) -> Self {
        self.achievement = Some(value);
        self
    }

    /// Fields set on `self` win; the rest are taken from `base`.
    pub fn over(self, base: PayloadBuilder) -> PayloadBuilder {
        PayloadBuilder {
            todo_nm: self.todo_nm.or(base.todo_nm),
            description: self.description.or(base.description),
            priority: self.priority.or(base.priority),
            due_date: self.due_date.or(base.due_date),
            achievement: self.achievement.or(base.achievement),
        }
    }

    pub fn build(self) -> TodoPayload {
        TodoPayload {
            todo_nm: self.todo_nm.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            achievement: self.achievement.unwrap_or(false),
            due_date: self.due_date.flatten(),
        }
    }
}

impl From<&Todo> for PayloadBuilder {
    fn from(todo: &Todo) -> Self {
        PayloadBuilder {
            todo_nm: todo.todo_nm.clone(),
            description: todo.description.clone(),
            priority: Some(todo.priority),
            due_date: Some(todo.due_date.clone()),
            achievement: Some(todo.achievement),
        }
    }
}

/// Drafts hold the form representation of the due date, so this is where it
/// gets its seconds appended.
impl From<&Draft> for PayloadBuilder {
    fn from(draft: &Draft) -> Self {
        PayloadBuilder {
            todo_nm: Some(draft.todo_nm.clone()),
            description: Some(draft.description.clone()),
            priority: Some(draft.priority),
            due_date: Some(input_to_payload(&draft.due_date)),
            achievement: Some(draft.achievement),
        }
    }
}

/// Merge `overrides` over `current` into a complete payload.
pub fn build_payload(current: impl Into<PayloadBuilder>, overrides: PayloadBuilder) -> TodoPayload {
    overrides.over(current.into()).build()
}

/// The editable form. `due_date` is either empty or `YYYY-MM-DDTHH:MM`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub todo_nm: String,
    pub description: String,
    pub due_date: String,
    pub priority: Priority,
    pub achievement: bool,
}

impl Draft {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn is_blank(&self) -> bool {
        *self == Self::blank()
    }

    /// Accepts anything [`parse_due`] understands; an empty string clears
    /// the deadline.
    pub fn set_due_date(&mut self, typed: &str) -> Result<(), ValidationError> {
        if typed.trim().is_empty() {
            self.due_date.clear();
            return Ok(());
        }
        match normalize_input(typed) {
            Some(formatted) => {
                self.due_date = formatted;
                Ok(())
            }
            None => Err(ValidationError::InvalidDueDate(typed.trim().to_string())),
        }
    }

    pub fn set_priority<T: PriorityInput + ?Sized>(&mut self, value: &T) {
        self.priority = normalize_or_default(value);
    }

    /// The payload to send for this draft, with title and description
    /// trimmed. A blank title is rejected before anything is sent.
    pub fn submission(&self) -> Result<TodoPayload, ValidationError> {
        let title = self.todo_nm.trim();
        if title.is_empty() {
            return Err(ValidationError::BlankTitle);
        }
        let overrides = PayloadBuilder::new()
            .todo_nm(title)
            .description(self.description.trim());
        Ok(build_payload(self, overrides))
    }
}

/// Project a stored record into the editable form.
pub fn to_form_draft(record: &Todo) -> Draft {
    Draft {
        todo_nm: record.todo_nm.clone().unwrap_or_default(),
        description: record.description.clone().unwrap_or_default(),
        due_date: format_for_input(record.due_date.as_deref()),
        priority: normalize_or_default(&record.priority),
        achievement: record.achievement,
    }
}
