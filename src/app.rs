//! Application state and its update cycle.
//!
//! Every interaction and every server response arrives as a [`Message`].
//! [`App::update`] folds it into the state and may hand back a [`Command`]
//! for the runtime to execute against a [`TodoStore`]; the outcome comes back
//! as another message through [`execute`].

use chrono::NaiveDateTime;

use crate::error::{TransportError, TransportResult};
use crate::model::{build_payload, to_form_draft, Draft, PayloadBuilder, Todo, TodoId, TodoPayload};
use crate::priority::Priority;
use crate::store::TodoStore;
use crate::view::{self, FilterMode, Stats};

pub const LOAD_FAILED: &str = "Couldn't load the todo list. Please check the server.";
pub const SAVE_FAILED: &str = "Failed to save your changes. Please check the input.";
pub const DELETE_FAILED: &str = "Something went wrong while deleting.";
pub const TOGGLE_FAILED: &str = "Couldn't update the completion status.";

/// Whether the form creates a new todo or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Browsing,
    Editing(TodoId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrigin {
    Submit,
    Toggle,
}

/// A request for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Create(TodoPayload),
    Update {
        id: TodoId,
        payload: TodoPayload,
        origin: UpdateOrigin,
    },
    Delete(TodoId),
}

#[derive(Debug)]
pub enum Message {
    Refresh,
    Loaded(TransportResult<Vec<Todo>>),

    // Form
    Edit(TodoId),
    CancelEdit,
    SetTitle(String),
    SetDescription(String),
    SetDueDate(String),
    SetPriority(Priority),
    RaisePriority,
    LowerPriority,
    ToggleDraftAchievement,
    Submit,
    Created(TransportResult<Todo>),
    Updated(TodoId, TransportResult<Todo>),

    // Row actions
    Toggle(TodoId),
    Toggled(TodoId, TransportResult<Todo>),
    RequestDelete(TodoId),
    ConfirmDelete,
    DismissDelete,
    Deleted(TodoId, TransportResult<()>),

    // List controls
    SetFilter(FilterMode),
    CycleFilter,
    SetSearch(String),
}

#[derive(Debug, Default)]
pub struct App {
    pub todos: Vec<Todo>,
    pub draft: Draft,
    pub edit: EditState,
    pub filter: FilterMode,
    pub search: String,
    pub loading: bool,
    pub submitting: bool,
    pub pending_delete: Option<TodoId>,
    pub error: Option<String>,
}

impl App {
    /// A fresh state together with the initial fetch.
    pub fn init() -> (App, Command) {
        let mut app = App::default();
        let command = app.update(Message::Refresh);
        (app, command.unwrap_or(Command::List))
    }

    pub fn visible(&self) -> Vec<&Todo> {
        view::visible_todos(&self.todos, self.filter, &self.search)
    }

    pub fn stats(&self, now: NaiveDateTime) -> Stats {
        view::stats(&self.todos, now)
    }

    pub fn find(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| &todo.id == id)
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.edit, EditState::Editing(_))
    }

    fn reset_form(&mut self) {
        self.draft = Draft::blank();
        self.edit = EditState::Browsing;
    }

    fn replace(&mut self, id: &TodoId, record: Todo) {
        if let Some(slot) = self.todos.iter_mut().find(|todo| &todo.id == id) {
            *slot = record;
        }
    }

    fn fail(&mut self, message: &str, err: &TransportError) {
        tracing::error!("{message} ({err})");
        self.error = Some(message.to_string());
    }

    pub fn update(&mut self, message: Message) -> Option<Command> {
        match message {
            Message::Refresh => {
                self.loading = true;
                self.error = None;
                return Some(Command::List);
            }
            Message::Loaded(result) => {
                self.loading = false;
                match result {
                    Ok(todos) => self.todos = todos,
                    Err(err) => self.fail(LOAD_FAILED, &err),
                }
            }

            Message::Edit(id) => {
                if let Some(record) = self.find(&id) {
                    self.draft = to_form_draft(record);
                    self.edit = EditState::Editing(id);
                }
            }
            Message::CancelEdit => self.reset_form(),
            Message::SetTitle(title) => self.draft.todo_nm = title,
            Message::SetDescription(description) => self.draft.description = description,
            Message::SetDueDate(typed) => {
                if let Err(err) = self.draft.set_due_date(&typed) {
                    self.error = Some(err.to_string());
                }
            }
            Message::SetPriority(priority) => self.draft.set_priority(&priority),
            Message::RaisePriority => self.draft.priority = self.draft.priority.raise(),
            Message::LowerPriority => self.draft.priority = self.draft.priority.lower(),
            Message::ToggleDraftAchievement => {
                // completion is only editable on existing todos
                if self.is_editing() {
                    self.draft.achievement = !self.draft.achievement;
                }
            }
            Message::Submit => {
                if self.submitting {
                    return None;
                }
                let payload = match self.draft.submission() {
                    Ok(payload) => payload,
                    Err(err) => {
                        self.error = Some(err.to_string());
                        return None;
                    }
                };
                self.submitting = true;
                self.error = None;
                return Some(match &self.edit {
                    EditState::Browsing => Command::Create(payload),
                    EditState::Editing(id) => Command::Update {
                        id: id.clone(),
                        payload,
                        origin: UpdateOrigin::Submit,
                    },
                });
            }
            Message::Created(result) => {
                self.submitting = false;
                match result {
                    Ok(record) => {
                        tracing::info!("created todo {}", record.id);
                        self.todos.insert(0, record);
                        self.reset_form();
                    }
                    Err(err) => self.fail(SAVE_FAILED, &err),
                }
            }
            Message::Updated(id, result) => {
                self.submitting = false;
                match result {
                    Ok(record) => {
                        tracing::info!("updated todo {id}");
                        self.replace(&id, record);
                        self.reset_form();
                    }
                    Err(err) => self.fail(SAVE_FAILED, &err),
                }
            }

            Message::Toggle(id) => {
                let record = self.find(&id)?;
                let overrides = PayloadBuilder::new().achievement(!record.achievement);
                let payload = build_payload(record, overrides);
                return Some(Command::Update {
                    id,
                    payload,
                    origin: UpdateOrigin::Toggle,
                });
            }
            Message::Toggled(id, result) => match result {
                Ok(record) => self.replace(&id, record),
                Err(err) => self.fail(TOGGLE_FAILED, &err),
            },
            Message::RequestDelete(id) => {
                if self.find(&id).is_some() {
                    self.pending_delete = Some(id);
                }
            }
            Message::ConfirmDelete => {
                return self.pending_delete.take().map(Command::Delete);
            }
            Message::DismissDelete => self.pending_delete = None,
            Message::Deleted(id, result) => match result {
                Ok(()) => {
                    tracing::info!("deleted todo {id}");
                    self.todos.retain(|todo| todo.id != id);
                    if self.edit == EditState::Editing(id) {
                        self.reset_form();
                    }
                }
                Err(err) => self.fail(DELETE_FAILED, &err),
            },

            Message::SetFilter(filter) => self.filter = filter,
            Message::CycleFilter => self.filter = self.filter.next(),
            Message::SetSearch(search) => self.search = search,
        }
        None
    }
}

/// Run `command` against `store` and report the outcome as a message.
pub async fn execute<S: TodoStore>(store: &S, command: Command) -> Message {
    match command {
        Command::List => Message::Loaded(store.list().await),
        Command::Create(payload) => Message::Created(store.create(&payload).await),
        Command::Update { id, payload, origin } => {
            let result = store.update(&id, &payload).await;
            match origin {
                UpdateOrigin::Submit => Message::Updated(id, result),
                UpdateOrigin::Toggle => Message::Toggled(id, result),
            }
        }
        Command::Delete(id) => {
            let result = store.delete(&id).await;
            Message::Deleted(id, result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::priority::normalize_or_default;
    use crate::store::memory::MemoryStore;

    fn todo(id: i64, title: &str, done: bool) -> Todo {
        Todo {
            id: TodoId::Number(id),
            todo_nm: Some(title.to_string()),
            description: Some(String::new()),
            priority: Priority::DEFAULT,
            due_date: None,
            achievement: done,
            registered_at: None,
            updated_at: None,
        }
    }

    fn offline() -> TransportError {
        TransportError::Status {
            method: "GET",
            url: "memory://todos".to_string(),
            status: 503,
        }
    }

    /// Feed `message` and keep executing commands until the state settles.
    async fn drive(app: &mut App, store: &MemoryStore, message: Message) {
        let mut next = app.update(message);
        while let Some(command) = next {
            let reply = execute(store, command).await;
            next = app.update(reply);
        }
    }

    #[tokio::test]
    async fn initial_load_fills_the_list() {
        let store = MemoryStore::with(vec![todo(1, "A", false), todo(2, "B", true)]);
        let (mut app, command) = App::init();
        assert!(app.loading);
        let reply = execute(&store, command).await;
        assert!(app.update(reply).is_none());
        assert!(!app.loading);
        assert_eq!(app.todos.len(), 2);
    }

    #[test]
    fn failed_load_keeps_previous_list() {
        let mut app = App {
            todos: vec![todo(1, "A", false)],
            ..App::default()
        };
        app.update(Message::Refresh);
        app.update(Message::Loaded(Err(offline())));
        assert_eq!(app.todos.len(), 1);
        assert_eq!(app.error.as_deref(), Some(LOAD_FAILED));
        assert!(!app.loading);
    }

    #[test]
    fn blank_title_blocks_submit() {
        let mut app = App::default();
        app.update(Message::SetTitle("   ".to_string()));
        assert_eq!(app.update(Message::Submit), None);
        assert_eq!(app.error, Some(ValidationError::BlankTitle.to_string()));
        assert!(!app.submitting);
    }

    #[tokio::test]
    async fn create_prepends_and_resets_form() {
        let store = MemoryStore::with(vec![todo(1, "Existing", false)]);
        let mut app = App::default();
        drive(&mut app, &store, Message::Refresh).await;

        app.update(Message::SetTitle("  New one ".to_string()));
        app.update(Message::RaisePriority);
        app.update(Message::SetDueDate("2025-09-01 18:00".to_string()));
        drive(&mut app, &store, Message::Submit).await;

        assert_eq!(app.todos[0].title(), "New one");
        assert_eq!(app.todos[0].priority.value(), 2);
        assert_eq!(app.todos[0].due_date.as_deref(), Some("2025-09-01T18:00:00"));
        assert!(app.draft.is_blank());
        assert!(!app.submitting);
    }

    #[test]
    fn quick_pick_due_date_and_priority_reach_the_payload() {
        let now = chrono::NaiveDate::from_ymd_opt(2025, 8, 30)
            .unwrap()
            .and_hms_opt(21, 5, 0)
            .unwrap();
        let mut app = App::default();
        app.update(Message::SetTitle("Renew passport".to_string()));
        app.update(Message::SetDueDate(crate::due::DuePreset::InAWeek.apply(now)));
        app.update(Message::SetPriority(normalize_or_default(&1_i64)));
        assert_eq!(app.error, None);

        let Some(Command::Create(payload)) = app.update(Message::Submit) else {
            panic!("expected a create command");
        };
        assert_eq!(payload.due_date.as_deref(), Some("2025-09-06T21:05:00"));
        assert_eq!(payload.priority.value(), 1);
    }

    #[test]
    fn submit_is_ignored_while_in_flight() {
        let mut app = App::default();
        app.update(Message::SetTitle("Once".to_string()));
        assert!(matches!(app.update(Message::Submit), Some(Command::Create(_))));
        assert_eq!(app.update(Message::Submit), None);
    }

    #[tokio::test]
    async fn failed_save_keeps_draft() {
        let store = MemoryStore {
            offline: true,
            ..MemoryStore::default()
        };
        let mut app = App::default();
        app.update(Message::SetTitle("Keep me".to_string()));
        drive(&mut app, &store, Message::Submit).await;
        assert_eq!(app.draft.todo_nm, "Keep me");
        assert_eq!(app.error.as_deref(), Some(SAVE_FAILED));
        assert!(!app.submitting);
    }

    #[tokio::test]
    async fn edit_then_update_replaces_record() {
        let store = MemoryStore::with(vec![todo(1, "Draft report", false)]);
        let mut app = App::default();
        drive(&mut app, &store, Message::Refresh).await;

        app.update(Message::Edit(TodoId::Number(1)));
        assert_eq!(app.edit, EditState::Editing(TodoId::Number(1)));
        assert_eq!(app.draft.todo_nm, "Draft report");

        app.update(Message::SetTitle("Final report".to_string()));
        app.update(Message::ToggleDraftAchievement);
        drive(&mut app, &store, Message::Submit).await;

        assert_eq!(app.edit, EditState::Browsing);
        assert_eq!(app.todos.len(), 1);
        assert_eq!(app.todos[0].title(), "Final report");
        assert!(app.todos[0].achievement);
    }

    #[test]
    fn achievement_is_not_editable_when_creating() {
        let mut app = App::default();
        app.update(Message::ToggleDraftAchievement);
        assert!(!app.draft.achievement);
    }

    #[test]
    fn cancel_returns_to_browsing() {
        let mut app = App {
            todos: vec![todo(4, "A", false)],
            ..App::default()
        };
        app.update(Message::Edit(TodoId::Number(4)));
        app.update(Message::CancelEdit);
        assert_eq!(app.edit, EditState::Browsing);
        assert!(app.draft.is_blank());
    }

    #[tokio::test]
    async fn toggle_flips_completion_and_keeps_fields() {
        let mut original = todo(1, "Stretch", false);
        original.priority = normalize_or_default(&1i64);
        original.due_date = Some("2025-09-01T07:00:00".to_string());
        let store = MemoryStore::with(vec![original]);
        let mut app = App::default();
        drive(&mut app, &store, Message::Refresh).await;

        drive(&mut app, &store, Message::Toggle(TodoId::Number(1))).await;
        let toggled = &app.todos[0];
        assert!(toggled.achievement);
        assert_eq!(toggled.priority.value(), 1);
        assert_eq!(toggled.due_date.as_deref(), Some("2025-09-01T07:00:00"));
    }

    #[tokio::test]
    async fn failed_toggle_reports() {
        let store = MemoryStore {
            failing: vec![TodoId::Number(1)],
            ..MemoryStore::with(vec![todo(1, "Stretch", false)])
        };
        let mut app = App::default();
        drive(&mut app, &store, Message::Refresh).await;
        drive(&mut app, &store, Message::Toggle(TodoId::Number(1))).await;
        assert!(!app.todos[0].achievement);
        assert_eq!(app.error.as_deref(), Some(TOGGLE_FAILED));
    }

    #[tokio::test]
    async fn delete_needs_confirmation() {
        let store = MemoryStore::with(vec![todo(1, "A", false)]);
        let mut app = App::default();
        drive(&mut app, &store, Message::Refresh).await;

        assert_eq!(app.update(Message::RequestDelete(TodoId::Number(1))), None);
        app.update(Message::DismissDelete);
        assert_eq!(app.update(Message::ConfirmDelete), None);
        assert_eq!(app.todos.len(), 1);

        app.update(Message::RequestDelete(TodoId::Number(1)));
        drive(&mut app, &store, Message::ConfirmDelete).await;
        assert!(app.todos.is_empty());
        assert_eq!(app.pending_delete, None);
    }

    #[tokio::test]
    async fn deleting_the_edited_record_resets_the_form() {
        let store = MemoryStore::with(vec![todo(1, "A", false), todo(2, "B", false)]);
        let mut app = App::default();
        drive(&mut app, &store, Message::Refresh).await;

        app.update(Message::Edit(TodoId::Number(2)));
        app.update(Message::SetTitle("B, edited".to_string()));
        app.update(Message::RequestDelete(TodoId::Number(2)));
        drive(&mut app, &store, Message::ConfirmDelete).await;

        assert_eq!(app.edit, EditState::Browsing);
        assert!(app.draft.is_blank());
        assert_eq!(app.todos.len(), 1);
    }

    #[tokio::test]
    async fn deleting_another_record_keeps_editing() {
        let store = MemoryStore::with(vec![todo(1, "A", false), todo(2, "B", false)]);
        let mut app = App::default();
        drive(&mut app, &store, Message::Refresh).await;

        app.update(Message::Edit(TodoId::Number(2)));
        app.update(Message::RequestDelete(TodoId::Number(1)));
        drive(&mut app, &store, Message::ConfirmDelete).await;
        assert_eq!(app.edit, EditState::Editing(TodoId::Number(2)));
    }

    #[test]
    fn failed_delete_leaves_record() {
        let mut app = App {
            todos: vec![todo(1, "A", false)],
            ..App::default()
        };
        app.update(Message::Deleted(TodoId::Number(1), Err(offline())));
        assert_eq!(app.todos.len(), 1);
        assert_eq!(app.error.as_deref(), Some(DELETE_FAILED));
    }

    #[test]
    fn late_update_still_applies() {
        let mut app = App {
            todos: vec![todo(1, "A", false)],
            ..App::default()
        };
        app.update(Message::Toggled(TodoId::Number(1), Ok(todo(1, "A", true))));
        app.update(Message::Toggled(TodoId::Number(1), Ok(todo(1, "A", false))));
        assert!(!app.todos[0].achievement);
    }

    #[test]
    fn controls_drive_the_visible_list() {
        let mut app = App {
            todos: vec![todo(1, "Milestone review", false), todo(2, "Buy milk", true)],
            ..App::default()
        };
        app.update(Message::SetSearch("MILE".to_string()));
        let titles: Vec<&str> = app.visible().iter().map(|todo| todo.title()).collect();
        assert_eq!(titles, vec!["Milestone review"]);

        app.update(Message::SetSearch(String::new()));
        app.update(Message::CycleFilter);
        assert_eq!(app.filter, FilterMode::Active);
        assert_eq!(app.visible().len(), 1);
        app.update(Message::SetFilter(FilterMode::Completed));
        assert_eq!(app.visible()[0].title(), "Buy milk");
    }
}
