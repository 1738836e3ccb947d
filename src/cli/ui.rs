// cli/ui.rs — `taskd ui` ratatui terminal client.
//
// Full-screen interactive TUI against a running `taskd serve`:
//   - Header: server URL + task count
//   - Scrollable task list (most recent first) with status + age badges
//   - Create/edit form (Tab between fields, Enter to save, Esc to cancel)
//   - Delete requires a y/n confirmation
//   - Failed calls show a dismissible error banner; the loaded list is kept

use anyhow::{Context as _, Result};
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Terminal,
};
use std::io;

use crate::client::state::TaskList;
use crate::client::{ApiClient, TaskInput};
use crate::tasks::TaskStatus;

/// Which form field has focus.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FormField {
    Title,
    Description,
    Status,
}

/// Create/edit form buffers. `editing` holds the task id in edit mode.
#[derive(Debug, Clone)]
struct FormState {
    editing: Option<i64>,
    title: String,
    description: String,
    status: TaskStatus,
    field: FormField,
}

impl FormState {
    fn create() -> Self {
        Self {
            editing: None,
            title: String::new(),
            description: String::new(),
            status: TaskStatus::Pending,
            field: FormField::Title,
        }
    }

    fn edit(task: &crate::tasks::Task) -> Self {
        Self {
            editing: Some(task.id),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            field: FormField::Title,
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            FormField::Title => FormField::Description,
            FormField::Description => FormField::Status,
            FormField::Status => FormField::Title,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            FormField::Title => FormField::Status,
            FormField::Description => FormField::Title,
            FormField::Status => FormField::Description,
        };
    }

    fn toggle_status(&mut self) {
        self.status = match self.status {
            TaskStatus::Pending => TaskStatus::Done,
            TaskStatus::Done => TaskStatus::Pending,
        };
    }

    fn input(&self) -> TaskInput {
        TaskInput {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
        }
    }
}

#[derive(Debug, Clone)]
enum Mode {
    Browse,
    Form(FormState),
    ConfirmDelete { id: i64, title: String },
}

/// ratatui-based interactive task client.
pub struct TaskUi {
    client: ApiClient,
}

impl TaskUi {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(base_url)?,
        })
    }

    /// Start the interactive TUI loop.
    pub async fn run(self) -> Result<()> {
        enable_raw_mode().context("enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("create terminal")?;

        let result = self.event_loop(&mut terminal).await;

        // Restore terminal regardless of result.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(
        &self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let mut list = TaskList::new();
        let mut selected: usize = 0;
        let mut mode = Mode::Browse;

        // Initial load — a failure leaves an empty list plus the banner.
        match self.client.list().await {
            Ok(tasks) => list.replace_all(tasks),
            Err(e) => list.set_error(e.to_string()),
        }

        loop {
            selected = selected.min(list.len().saturating_sub(1));
            terminal.draw(|f| draw_ui(f, &list, selected, &mode, self.client.base_url()))?;

            // Poll for terminal events (non-blocking, 50ms timeout).
            if !event::poll(std::time::Duration::from_millis(50))? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };

            // Mutations are awaited in place, so the triggering key cannot
            // fire again until the call resolves.
            match &mut mode {
                Mode::Browse => match (key.code, key.modifiers) {
                    (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('q'), _) => {
                        break;
                    }
                    (KeyCode::Esc, _) => list.dismiss_error(),
                    (KeyCode::Char('r'), _) => match self.client.list().await {
                        Ok(tasks) => {
                            list.replace_all(tasks);
                            list.dismiss_error();
                        }
                        Err(e) => list.set_error(e.to_string()),
                    },
                    (KeyCode::Up, _) => selected = selected.saturating_sub(1),
                    (KeyCode::Down, _) => {
                        if selected + 1 < list.len() {
                            selected += 1;
                        }
                    }
                    (KeyCode::Char('a'), _) => mode = Mode::Form(FormState::create()),
                    (KeyCode::Char('e'), _) => {
                        if let Some(task) = list.get(selected) {
                            mode = Mode::Form(FormState::edit(task));
                        }
                    }
                    (KeyCode::Char('d'), _) => {
                        if let Some(task) = list.get(selected) {
                            mode = Mode::ConfirmDelete {
                                id: task.id,
                                title: task.title.clone(),
                            };
                        }
                    }
                    (KeyCode::Char('t'), _) => {
                        // Toggle pending/done via a full update.
                        if let Some(task) = list.get(selected).cloned() {
                            let input = TaskInput {
                                title: task.title,
                                description: task.description,
                                status: match task.status {
                                    TaskStatus::Pending => TaskStatus::Done,
                                    TaskStatus::Done => TaskStatus::Pending,
                                },
                            };
                            match self.client.update(task.id, &input).await {
                                Ok(updated) => {
                                    list.apply_updated(updated);
                                }
                                Err(e) => list.set_error(e.to_string()),
                            }
                        }
                    }
                    _ => {}
                },

                Mode::Form(form) => match key.code {
                    KeyCode::Esc => mode = Mode::Browse,
                    KeyCode::Tab | KeyCode::Down => form.next_field(),
                    KeyCode::BackTab | KeyCode::Up => form.prev_field(),
                    KeyCode::Left | KeyCode::Right => {
                        if form.field == FormField::Status {
                            form.toggle_status();
                        }
                    }
                    KeyCode::Backspace => match form.field {
                        FormField::Title => {
                            form.title.pop();
                        }
                        FormField::Description => {
                            form.description.pop();
                        }
                        FormField::Status => {}
                    },
                    KeyCode::Enter => {
                        let input = form.input();
                        let editing = form.editing;
                        let result = match editing {
                            Some(id) => self.client.update(id, &input).await,
                            None => self.client.create(&input).await,
                        };
                        match result {
                            Ok(task) => {
                                // Form is dismissed only on confirmed success.
                                if editing.is_some() {
                                    list.apply_updated(task);
                                } else {
                                    list.apply_created(task);
                                    selected = 0;
                                }
                                list.dismiss_error();
                                mode = Mode::Browse;
                            }
                            Err(e) => list.set_error(e.to_string()),
                        }
                    }
                    KeyCode::Char(c) => match form.field {
                        FormField::Title => form.title.push(c),
                        FormField::Description => form.description.push(c),
                        FormField::Status => {
                            if c == ' ' {
                                form.toggle_status();
                            }
                        }
                    },
                    _ => {}
                },

                Mode::ConfirmDelete { id, .. } => match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => {
                        let id = *id;
                        match self.client.delete(id).await {
                            Ok(()) => {
                                list.apply_deleted(id);
                                list.dismiss_error();
                            }
                            Err(e) => list.set_error(e.to_string()),
                        }
                        mode = Mode::Browse;
                    }
                    KeyCode::Char('n') | KeyCode::Esc => mode = Mode::Browse,
                    _ => {}
                },
            }
        }

        Ok(())
    }
}

// ─── UI rendering ─────────────────────────────────────────────────────────────

fn draw_ui(f: &mut ratatui::Frame, list: &TaskList, selected: usize, mode: &Mode, server: &str) {
    let area = f.area();

    let banner_height = if list.error().is_some() { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // header
            Constraint::Length(banner_height), // error banner
            Constraint::Min(3),                // body
            Constraint::Length(1),             // help line
        ])
        .split(area);

    render_header(f, chunks[0], list.len(), server);
    if let Some(message) = list.error() {
        render_error_banner(f, chunks[1], message);
    }

    match mode {
        Mode::Form(form) => render_form(f, chunks[2], form),
        _ => render_tasks(f, chunks[2], list, selected),
    }

    render_help(f, chunks[3], mode);
}

fn render_header(f: &mut ratatui::Frame, area: Rect, count: usize, server: &str) {
    let header = Paragraph::new(format!(" taskd  {count} task(s)  {server}"))
        .style(Style::default().bg(Color::Rgb(28, 28, 40)).fg(Color::White));
    f.render_widget(header, area);
}

fn render_error_banner(f: &mut ratatui::Frame, area: Rect, message: &str) {
    let banner = Paragraph::new(format!(" ✗ {message}  (Esc to dismiss)"))
        .style(Style::default().bg(Color::Red).fg(Color::White));
    f.render_widget(banner, area);
}

fn render_tasks(f: &mut ratatui::Frame, area: Rect, list: &TaskList, selected: usize) {
    if list.is_empty() {
        let empty = Paragraph::new("No tasks yet — press 'a' to create one.")
            .block(Block::default().borders(Borders::ALL).title("Tasks"))
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(empty, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(4)])
        .split(area);

    let items: Vec<ListItem> = list
        .tasks()
        .iter()
        .enumerate()
        .map(|(i, task)| {
            let marker = match task.status {
                TaskStatus::Done => Span::styled("[done]   ", Style::default().fg(Color::Green)),
                TaskStatus::Pending => {
                    Span::styled("[pending]", Style::default().fg(Color::Yellow))
                }
            };
            let title_style = if i == selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(vec![
                Span::raw(if i == selected { "> " } else { "  " }),
                marker,
                Span::raw(" "),
                Span::styled(task.title.clone(), title_style),
                Span::styled(
                    format!("  {}", format_time_ago(&task.created_at)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let widget = List::new(items).block(Block::default().borders(Borders::ALL).title("Tasks"));
    f.render_widget(widget, chunks[0]);

    // Detail pane for the selected task.
    let detail = list
        .get(selected)
        .map(|t| t.description.clone())
        .unwrap_or_default();
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title("Description"))
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::Gray));
    f.render_widget(detail_widget, chunks[1]);
}

fn render_form(f: &mut ratatui::Frame, area: Rect, form: &FormState) {
    let title = if form.editing.is_some() {
        "Edit Task"
    } else {
        "Create Task"
    };

    let field_line = |label: &str, value: &str, focused: bool| {
        let style = if focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let cursor = if focused { "▌" } else { "" };
        Line::from(vec![
            Span::styled(format!("{label:<13}"), Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{value}{cursor}"), style),
        ])
    };

    let lines = vec![
        Line::from(""),
        field_line("Title", &form.title, form.field == FormField::Title),
        Line::from(""),
        field_line(
            "Description",
            &form.description,
            form.field == FormField::Description,
        ),
        Line::from(""),
        field_line(
            "Status",
            &format!("< {} >", form.status),
            form.field == FormField::Status,
        ),
    ];

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(widget, area);
}

fn render_help(f: &mut ratatui::Frame, area: Rect, mode: &Mode) {
    let (text, style) = match mode {
        Mode::Browse => (
            " a: add  |  e: edit  |  d: delete  |  t: toggle done  |  r: reload  |  q: quit"
                .to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        Mode::Form(_) => (
            " Tab: next field  |  ←/→: toggle status  |  Enter: save  |  Esc: cancel".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        Mode::ConfirmDelete { title, .. } => (
            format!(" Delete '{title}'? This cannot be undone.  y: confirm  |  n: cancel"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };
    f.render_widget(Paragraph::new(text).style(style), area);
}

/// Format an RFC 3339 creation timestamp as "32s ago" / "5m ago" / "3h ago"
/// / "2d ago". Unparseable input renders as "?".
fn format_time_ago(created_at: &str) -> String {
    let Ok(created) = chrono::DateTime::parse_from_rfc3339(created_at) else {
        return "?".to_string();
    };
    let seconds = (Utc::now() - created.with_timezone(&Utc)).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = seconds / 3600;
    let days = seconds / 86400;
    if seconds < 60 {
        format!("{seconds}s ago")
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else {
        format!("{days}d ago")
    }
}
