//! What the list pane shows: the filtered and sorted todos, the header
//! counts, and the due badge for each row.

use std::cmp::Ordering;

use chrono::{Duration, NaiveDateTime};

use crate::model::Todo;

pub const UPCOMING_WINDOW_HOURS: i64 = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    All,
    Active,
    Completed,
}

impl FilterMode {
    pub const MODES: [FilterMode; 3] = [FilterMode::All, FilterMode::Active, FilterMode::Completed];

    pub fn label(self) -> &'static str {
        match self {
            FilterMode::All => "All",
            FilterMode::Active => "Active",
            FilterMode::Completed => "Completed",
        }
    }

    pub fn next(self) -> FilterMode {
        match self {
            FilterMode::All => FilterMode::Active,
            FilterMode::Active => FilterMode::Completed,
            FilterMode::Completed => FilterMode::All,
        }
    }

    pub fn admits(self, todo: &Todo) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Active => !todo.achievement,
            FilterMode::Completed => todo.achievement,
        }
    }
}

/// Case-insensitive substring match on title or description. `keyword`
/// must already be trimmed and lower-cased.
fn matches_keyword(todo: &Todo, keyword: &str) -> bool {
    [todo.todo_nm.as_deref(), todo.description.as_deref()]
        .into_iter()
        .flatten()
        .filter(|value| !value.is_empty())
        .any(|value| value.to_lowercase().contains(keyword))
}

pub fn matches_search(todo: &Todo, search: &str) -> bool {
    let keyword = search.trim().to_lowercase();
    keyword.is_empty() || matches_keyword(todo, &keyword)
}

/// Open before done, then most urgent first, then earliest deadline, with
/// missing or unreadable deadlines last.
pub fn compare_todos(a: &Todo, b: &Todo) -> Ordering {
    a.achievement
        .cmp(&b.achievement)
        .then_with(|| a.priority.cmp(&b.priority))
        .then_with(|| compare_due(a.due_at(), b.due_at()))
}

fn compare_due(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Search first, then the status filter, then a stable sort.
pub fn visible_todos<'a>(todos: &'a [Todo], filter: FilterMode, search: &str) -> Vec<&'a Todo> {
    let mut visible: Vec<&Todo> = todos
        .iter()
        .filter(|todo| matches_search(todo, search))
        .filter(|todo| filter.admits(todo))
        .collect();
    visible.sort_by(|a, b| compare_todos(a, b));
    visible
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub upcoming: usize,
}

/// Open, has a readable deadline, and that deadline is today, tomorrow, or
/// anywhere before the 72 hour horizon (overdue included).
pub fn is_upcoming(todo: &Todo, now: NaiveDateTime) -> bool {
    if todo.achievement {
        return false;
    }
    let Some(due) = todo.due_at() else {
        return false;
    };
    let today = now.date();
    let due_today = due.date() == today;
    let due_tomorrow = today.succ_opt() == Some(due.date());
    due_today || due_tomorrow || due < now + Duration::hours(UPCOMING_WINDOW_HOURS)
}

/// Counts over the whole collection, regardless of filter or search.
pub fn stats(todos: &[Todo], now: NaiveDateTime) -> Stats {
    Stats {
        total: todos.len(),
        completed: todos.iter().filter(|todo| todo.achievement).count(),
        upcoming: todos.iter().filter(|todo| is_upcoming(todo, now)).count(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Accent,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueInfo {
    pub label: String,
    pub tone: Tone,
}

const BADGE_FORMAT: &str = "%b %-d %H:%M";

pub fn due_info(todo: &Todo, now: NaiveDateTime) -> DueInfo {
    let Some(raw) = todo.due_date.as_deref().filter(|raw| !raw.trim().is_empty()) else {
        return DueInfo {
            label: "No deadline".to_string(),
            tone: Tone::Neutral,
        };
    };
    let Some(due) = crate::due::parse_due(raw) else {
        return DueInfo {
            label: "Invalid date".to_string(),
            tone: Tone::Danger,
        };
    };

    let dated = format!("Due {}", due.format(BADGE_FORMAT));
    let due_today = due.date() == now.date();
    if todo.achievement {
        DueInfo { label: dated, tone: Tone::Neutral }
    } else if due_today {
        DueInfo {
            label: "Due today".to_string(),
            tone: Tone::Warning,
        }
    } else if due < now {
        DueInfo { label: dated, tone: Tone::Danger }
    } else {
        DueInfo { label: dated, tone: Tone::Accent }
    }
}
