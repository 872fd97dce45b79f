use chrono::NaiveDateTime;
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};
use todo_studio::{
    app::EditState,
    due::DuePreset,
    model::Todo,
    view::{due_info, FilterMode, Tone},
};

use crate::{InputField, Mode, State};

pub fn draw<B: Backend>(frame: &mut Frame<B>, state: &mut State, now: NaiveDateTime) {
    let size = frame.size();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ]
            .as_ref(),
        )
        .split(size);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Min(2)].as_ref())
        .split(rows[1]);

    draw_header(frame, state, now, rows[0]);
    draw_form(frame, state, now, columns[0]);
    draw_list(frame, state, now, columns[1]);
    draw_footer(frame, state, rows[2]);
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Neutral => Color::Gray,
        Tone::Accent => Color::Cyan,
        Tone::Warning => Color::Yellow,
        Tone::Danger => Color::Red,
    }
}

fn draw_header<B: Backend>(frame: &mut Frame<B>, state: &State, now: NaiveDateTime, area: Rect) {
    let stats = state.app.stats(now);
    let mut spans = vec![
        Span::styled("Todo Studio", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("   "),
        Span::raw(format!("Total {}", stats.total)),
        Span::raw("  "),
        Span::styled(format!("Completed {}", stats.completed), Style::default().fg(Color::Green)),
        Span::raw("  "),
        Span::styled(format!("Upcoming {}", stats.upcoming), Style::default().fg(Color::Yellow)),
    ];
    if state.app.loading {
        spans.push(Span::raw("   "));
        spans.push("Loading...".italic());
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        ),
        area,
    );
}

/// A bordered one-field box. While the field is being typed into, it shows
/// the input buffer instead of the stored value.
fn field_box<'a>(state: &'a State, field: InputField, stored: &'a str) -> Paragraph<'a> {
    let active = state.mode == Mode::Input(field);
    let (text, border) = if active {
        (state.input.as_str(), Style::default().fg(Color::Yellow))
    } else {
        (stored, Style::default())
    };
    Paragraph::new(text.to_string())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(field.label())
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(border),
        )
}

fn draw_form<B: Backend>(frame: &mut Frame<B>, state: &State, now: NaiveDateTime, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);

    let draft = &state.app.draft;
    let heading = match &state.app.edit {
        EditState::Browsing => Line::from("New todo".bold()),
        EditState::Editing(id) => Line::from(vec![
            "Edit todo ".bold(),
            Span::styled(format!("#{id}"), Style::default().fg(Color::DarkGray)),
            "  (c) new instead".italic(),
        ]),
    };
    frame.render_widget(Paragraph::new(heading), chunks[0]);

    frame.render_widget(field_box(state, InputField::Title, &draft.todo_nm), chunks[1]);
    frame.render_widget(
        field_box(state, InputField::Description, &draft.description),
        chunks[2],
    );
    let due_display = draft.due_date.replacen('T', " ", 1);
    frame.render_widget(field_box(state, InputField::DueDate, &due_display), chunks[3]);

    let mut meta = vec![Span::raw(format!("Priority {}", draft.priority))];
    if state.app.is_editing() {
        meta.push(Span::raw("   "));
        meta.push(if draft.achievement {
            Span::styled("[x] Completed", Style::default().fg(Color::Green))
        } else {
            Span::raw("[ ] Completed")
        });
    }
    if state.app.submitting {
        meta.push(Span::raw("   "));
        meta.push("Saving...".italic());
    }
    frame.render_widget(
        Paragraph::new(Line::from(meta)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        ),
        chunks[4],
    );

    let editing = match state.mode {
        Mode::Input(InputField::Title) => Some(chunks[1]),
        Mode::Input(InputField::Description) => Some(chunks[2]),
        Mode::Input(InputField::DueDate) => Some(chunks[3]),
        Mode::Input(InputField::Search) | Mode::List => None,
    };
    if let Some(area) = editing {
        place_cursor(frame, area, &state.input);
    }

    draw_details(frame, state, now, chunks[5]);
}

fn draw_details<B: Backend>(frame: &mut Frame<B>, state: &State, now: NaiveDateTime, area: Rect) {
    let visible = state.app.visible();
    let Some(todo) = state.list_state.selected().and_then(|index| visible.get(index)) else {
        return;
    };
    let due = due_info(todo, now);
    let mut lines = vec![
        Line::from(Span::styled(
            todo.title().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(todo.description.clone().unwrap_or_default()),
        Line::from(""),
        Line::from(vec![
            Span::raw("Priority: "),
            Span::raw(todo.priority.label()),
        ]),
        Line::from(vec![
            Span::raw("Due: "),
            Span::styled(due.label, Style::default().fg(tone_color(due.tone))),
        ]),
        Line::from(if todo.achievement { "Status: done" } else { "Status: in progress" }),
    ];
    let muted = Style::default().fg(Color::DarkGray);
    if let Some(registered) = &todo.registered_at {
        lines.push(Line::from(Span::styled(format!("Created: {registered}"), muted)));
    }
    if let Some(updated) = &todo.updated_at {
        lines.push(Line::from(Span::styled(format!("Updated: {updated}"), muted)));
    }
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .title("Details")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        ),
        area,
    );
}

fn todo_line(todo: &Todo, now: NaiveDateTime) -> Line<'static> {
    let due = due_info(todo, now);
    let title_style = if todo.achievement {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::raw(if todo.achievement { "[x] " } else { "[ ] " }),
        Span::styled(todo.title().to_string(), title_style),
        Span::raw("  "),
        Span::styled(
            format!("P{} {}", todo.priority.value(), todo.priority.label()),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw("  "),
        Span::styled(due.label, Style::default().fg(tone_color(due.tone))),
    ])
}

fn draw_list<B: Backend>(frame: &mut Frame<B>, state: &mut State, now: NaiveDateTime, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let selected_tab = FilterMode::MODES
        .iter()
        .position(|mode| *mode == state.app.filter)
        .unwrap_or(0);
    let titles: Vec<Line> = FilterMode::MODES.iter().map(|mode| Line::from(mode.label())).collect();
    frame.render_widget(
        Tabs::new(titles)
            .select(selected_tab)
            .block(Block::default().title("Filter (f)").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        chunks[0],
    );

    frame.render_widget(field_box(state, InputField::Search, &state.app.search), chunks[1]);

    let visible = state.app.visible();
    if visible.is_empty() {
        let message = if state.app.loading {
            "Loading..."
        } else {
            "Nothing here yet. Press (t) to write a title and (s) to add it."
        };
        frame.render_widget(
            Paragraph::new(message)
                .alignment(Alignment::Center)
                .block(Block::default().title("Todos").borders(Borders::ALL)),
            chunks[2],
        );
        return;
    }

    let items: Vec<ListItem> = visible
        .iter()
        .map(|todo| ListItem::new(todo_line(todo, now)))
        .collect();
    let list = List::new(items)
        .block(Block::default().title("Todos").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().add_modifier(Modifier::ITALIC | Modifier::BOLD))
        .highlight_symbol(">>");
    frame.render_stateful_widget(list, chunks[2], &mut state.list_state);

    if state.mode == Mode::Input(InputField::Search) {
        place_cursor(frame, chunks[1], &state.input);
    }
}

fn place_cursor<B: Backend>(frame: &mut Frame<B>, area: Rect, input: &str) {
    frame.set_cursor(cursor_x(area, input), area.y.saturating_add(1));
}

/// Just past the typed text, held inside the right border.
fn cursor_x(area: Rect, input: &str) -> u16 {
    let width = u16::try_from(input.chars().count()).unwrap_or(u16::MAX);
    area.x
        .saturating_add(1)
        .saturating_add(width)
        .min(area.x.saturating_add(area.width.saturating_sub(2)))
}

fn draw_footer<B: Backend>(frame: &mut Frame<B>, state: &State, area: Rect) {
    let help = if let Some(id) = &state.app.pending_delete {
        let title = state.app.find(id).map(Todo::title).unwrap_or_default();
        Line::from(vec![
            Span::styled(format!("Delete \"{title}\"? "), Style::default().fg(Color::Red)),
            "(y) yes  ".red().bold(),
            "(n) no".into(),
        ])
    } else {
        match state.mode {
            Mode::Input(InputField::Search) => Line::from("Type to search  (Enter) done  (Esc) clear"),
            Mode::Input(InputField::DueDate) => {
                let picks = DuePreset::PRESETS.map(DuePreset::label).join(" / ");
                Line::from(format!("(Tab) {picks}  (Enter) keep  (Esc) discard"))
            }
            Mode::Input(_) => Line::from("(Enter) keep  (Esc) discard"),
            Mode::List => Line::from(
                "(j/k) move (space) done (e) edit (D) delete (t/d/u) title/desc/due \
                 (+/-, 1-5) priority (x) completed (s) save (c) cancel (f) filter (/) search (r) refresh (q) quit",
            ),
        }
    };

    let mut lines = vec![help];
    if let Some(error) = &state.app.error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
    }
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .style(Style::default()),
        area,
    );
}
