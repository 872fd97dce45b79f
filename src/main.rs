use std::{
    cmp::min,
    error::Error,
    fs::{self, File},
    io::{self, Stdout},
    sync::{Arc, Mutex},
    time::Duration,
};

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, widgets::ListState, Terminal};
use tokio::{
    runtime::Runtime,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};
use todo_studio::{
    app::{execute as run_command, App, Command, Message},
    config::Config,
    due::DuePreset,
    model::TodoId,
    priority::normalize_or_default,
    store::{HttpTodoStore, TodoStore},
};

mod ui;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputField {
    Title,
    Description,
    DueDate,
    Search,
}

impl InputField {
    pub fn label(self) -> &'static str {
        match self {
            InputField::Title => "Title",
            InputField::Description => "Description",
            InputField::DueDate => "Due (YYYY-MM-DD HH:MM)",
            InputField::Search => "Search",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    List,
    Input(InputField),
}

pub struct State {
    pub app: App,
    pub mode: Mode,
    pub input: String,
    /// Last quick pick put into the due-date buffer.
    pub preset: Option<DuePreset>,
    pub list_state: ListState,
}

/// Runs store commands on the tokio runtime and posts the outcome back to
/// the UI loop.
struct Runner<S> {
    runtime: Runtime,
    store: Arc<S>,
    tx: UnboundedSender<Message>,
}

impl<S: TodoStore> Runner<S> {
    fn spawn(&self, command: Command) {
        tracing::debug!("running {command:?}");
        let store = Arc::clone(&self.store);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let message = run_command(store.as_ref(), command).await;
            // the receiver only goes away on shutdown
            tx.send(message).ok();
        });
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::parse();

    init_logging(&config)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;
    let (tx, rx) = mpsc::unbounded_channel();
    let store = HttpTodoStore::new(&config.api_base())?;
    tracing::info!("starting against {}", store.base_url());
    let runner = Runner {
        runtime,
        store: Arc::new(store),
        tx,
    };

    let (app, command) = App::init();
    runner.spawn(command);
    let state = State {
        app,
        mode: Mode::List,
        input: String::new(),
        preset: None,
        list_state: ListState::default(),
    };

    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, state, &runner, rx);
    restore_terminal(&mut terminal)?;
    result
}

fn init_logging(config: &Config) -> Result<(), Box<dyn Error>> {
    let path = config.log_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = File::options().create(true).append(true).open(&path)?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::from(config.log_level))
        .init();
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, Box<dyn Error>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    Ok(terminal.show_cursor()?)
}

fn run<S: TodoStore>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut state: State,
    runner: &Runner<S>,
    mut rx: UnboundedReceiver<Message>,
) -> Result<(), Box<dyn Error>> {
    loop {
        while let Ok(message) = rx.try_recv() {
            dispatch(&mut state, runner, message);
        }
        clamp_selection(&mut state);

        let now = chrono::Local::now().naive_local();
        terminal.draw(|frame| ui::draw(frame, &mut state, now))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let keep_going = match state.mode {
                Mode::List if state.app.pending_delete.is_some() => {
                    handle_confirm(&mut state, runner, key);
                    true
                }
                Mode::List => handle_list_key(&mut state, runner, key),
                Mode::Input(field) => {
                    handle_input_key(&mut state, runner, field, key);
                    true
                }
            };
            if !keep_going {
                break;
            }
        }
    }
    tracing::info!("bye");
    Ok(())
}

fn dispatch<S: TodoStore>(state: &mut State, runner: &Runner<S>, message: Message) {
    if let Some(command) = state.app.update(message) {
        runner.spawn(command);
    }
}

fn selected_id(state: &State) -> Option<TodoId> {
    let index = state.list_state.selected()?;
    state.app.visible().get(index).map(|todo| todo.id.clone())
}

/// Returns `false` when the user asked to quit.
fn handle_list_key<S: TodoStore>(state: &mut State, runner: &Runner<S>, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => return false,
        KeyCode::Char('j') | KeyCode::Down => todos_move_down(state),
        KeyCode::Char('k') | KeyCode::Up => todos_move_up(state),
        KeyCode::Char(' ') => {
            if let Some(id) = selected_id(state) {
                dispatch(state, runner, Message::Toggle(id));
            }
        }
        KeyCode::Char('e') | KeyCode::Enter => {
            if let Some(id) = selected_id(state) {
                dispatch(state, runner, Message::Edit(id));
            }
        }
        KeyCode::Char('D') => {
            if let Some(id) = selected_id(state) {
                dispatch(state, runner, Message::RequestDelete(id));
            }
        }
        KeyCode::Char('t') => begin_input(state, InputField::Title),
        KeyCode::Char('d') => begin_input(state, InputField::Description),
        KeyCode::Char('u') => begin_input(state, InputField::DueDate),
        KeyCode::Char('/') => begin_input(state, InputField::Search),
        KeyCode::Char('+') => dispatch(state, runner, Message::RaisePriority),
        KeyCode::Char('-') => dispatch(state, runner, Message::LowerPriority),
        KeyCode::Char(c @ '1'..='5') => {
            let priority = normalize_or_default(c.to_string().as_str());
            dispatch(state, runner, Message::SetPriority(priority));
        }
        KeyCode::Char('x') => dispatch(state, runner, Message::ToggleDraftAchievement),
        KeyCode::Char('s') => dispatch(state, runner, Message::Submit),
        KeyCode::Char('c') | KeyCode::Esc => dispatch(state, runner, Message::CancelEdit),
        KeyCode::Char('f') => {
            dispatch(state, runner, Message::CycleFilter);
            state.list_state.select(None);
        }
        KeyCode::Char('r') => dispatch(state, runner, Message::Refresh),
        _ => {}
    }
    true
}

fn handle_confirm<S: TodoStore>(state: &mut State, runner: &Runner<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') => dispatch(state, runner, Message::ConfirmDelete),
        KeyCode::Char('n') | KeyCode::Esc => dispatch(state, runner, Message::DismissDelete),
        _ => {}
    }
}

fn begin_input(state: &mut State, field: InputField) {
    let draft = &state.app.draft;
    state.input = match field {
        InputField::Title => draft.todo_nm.clone(),
        InputField::Description => draft.description.clone(),
        InputField::DueDate => draft.due_date.replacen('T', " ", 1),
        InputField::Search => state.app.search.clone(),
    };
    state.preset = None;
    state.mode = Mode::Input(field);
}

fn handle_input_key<S: TodoStore>(
    state: &mut State,
    runner: &Runner<S>,
    field: InputField,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Char(c) => state.input.push(c),
        KeyCode::Backspace => {
            state.input.pop();
        }
        KeyCode::Tab if field == InputField::DueDate => {
            let preset = DuePreset::after(state.preset);
            let now = chrono::Local::now().naive_local();
            state.input = preset.apply(now).replacen('T', " ", 1);
            state.preset = Some(preset);
            return;
        }
        KeyCode::Esc => {
            if field == InputField::Search {
                dispatch(state, runner, Message::SetSearch(String::new()));
            }
            state.input.clear();
            state.mode = Mode::List;
            return;
        }
        KeyCode::Enter => {
            let value = std::mem::take(&mut state.input);
            let message = match field {
                InputField::Title => Message::SetTitle(value),
                InputField::Description => Message::SetDescription(value),
                InputField::DueDate => Message::SetDueDate(value),
                InputField::Search => Message::SetSearch(value),
            };
            dispatch(state, runner, message);
            state.mode = Mode::List;
            return;
        }
        _ => return,
    }

    // search narrows the list as you type
    if field == InputField::Search {
        dispatch(state, runner, Message::SetSearch(state.input.clone()));
        state.list_state.select(None);
    }
}

fn clamp_selection(state: &mut State) {
    let len = state.app.visible().len();
    match state.list_state.selected() {
        Some(_) if len == 0 => state.list_state.select(None),
        Some(v) => state.list_state.select(Some(min(v, len - 1))),
        None => {}
    }
}

fn todos_move_up(state: &mut State) {
    match state.list_state.selected() {
        Some(v) => {
            let max = match v {
                0 => None,
                v => Some(v - 1),
            };
            state.list_state.select(max);
        }
        None => {
            state.list_state.select(Some(0));
        }
    }
}

fn todos_move_down(state: &mut State) {
    let len = state.app.visible().len();
    if len == 0 {
        return;
    }
    match state.list_state.selected() {
        Some(v) => {
            state.list_state.select(Some(min(v + 1, len - 1)));
        }
        None => {
            state.list_state.select(Some(0));
        }
    }
}
