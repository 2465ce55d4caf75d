//! Event-loop state: which page is showing, what is selected, which modal
//! is open, and the transient toast. Key gestures land here and turn into
//! store operations; rendering derives everything else from this struct.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{Days, Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent};
use tracing::{info, warn};

use crate::store::{StoreError, TaskDraft, TaskPatch, TaskStore};
use crate::task::{Priority, Status, Task};
use crate::theme::{self, Theme};

const TOAST_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Board,
    Calendar,
    Analytics,
    Team,
    MyTasks,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Board,
        Page::Calendar,
        Page::Analytics,
        Page::Team,
        Page::MyTasks,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Board => "Board",
            Page::Calendar => "Calendar",
            Page::Analytics => "Analytics",
            Page::Team => "Team",
            Page::MyTasks => "My Tasks",
        }
    }

    fn next(self) -> Page {
        let i = Page::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Page::ALL[(i + 1) % Page::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Status,
    Priority,
    DueDate,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Title,
        FormField::Description,
        FormField::Status,
        FormField::Priority,
        FormField::DueDate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Description => "Description",
            FormField::Status => "Status",
            FormField::Priority => "Priority",
            FormField::DueDate => "Due date",
        }
    }

    fn next(self) -> FormField {
        let i = FormField::ALL.iter().position(|f| *f == self).unwrap_or(0);
        FormField::ALL[(i + 1) % FormField::ALL.len()]
    }

    fn prev(self) -> FormField {
        let i = FormField::ALL.iter().position(|f| *f == self).unwrap_or(0);
        FormField::ALL[(i + FormField::ALL.len() - 1) % FormField::ALL.len()]
    }
}

/// Buffers behind the add/edit modal. Dates stay text until submit.
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub editing: Option<String>,
    pub focus: FormField,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub due_date: String,
}

impl TaskForm {
    fn blank(status: Status, today: NaiveDate) -> Self {
        Self {
            editing: None,
            focus: FormField::Title,
            title: String::new(),
            description: String::new(),
            status,
            priority: Priority::Medium,
            // Tomorrow, same default the form has always offered.
            due_date: (today + Days::new(1)).format("%Y-%m-%d").to_string(),
        }
    }

    fn for_task(task: &Task) -> Self {
        Self {
            editing: Some(task.id.clone()),
            focus: FormField::Title,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            due_date: task
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Modal {
    TaskForm(TaskForm),
    Detail { id: String },
    MovePicker { id: String, selected: usize },
    ConfirmDelete { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    expires_at: Instant,
}

pub struct App {
    pub store: TaskStore,
    pub theme: Theme,
    pub page: Page,
    pub selected_column: usize,
    pub selected_card: usize,
    pub modal: Option<Modal>,
    pub toast: Option<Toast>,
    pub should_quit: bool,
    data_dir: PathBuf,
}

impl App {
    pub fn new(store: TaskStore, theme: Theme, data_dir: PathBuf) -> Self {
        Self {
            store,
            theme,
            page: Page::Board,
            selected_column: 0,
            selected_card: 0,
            modal: None,
            toast: None,
            should_quit: false,
            data_dir,
        }
    }

    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    pub fn selected_status(&self) -> Status {
        Status::ALL[self.selected_column]
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.store
            .by_status(self.selected_status())
            .get(self.selected_card)
            .copied()
    }

    /// Everything not done, due-dated first, soonest first.
    pub fn open_tasks_by_due(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .store
            .tasks()
            .iter()
            .filter(|t| t.status != Status::Done)
            .collect();
        tasks.sort_by_key(|t| (t.due_date.is_none(), t.due_date));
        tasks
    }

    /// Drop the toast once its three seconds are up.
    pub fn tick(&mut self) {
        if let Some(toast) = &self.toast {
            if Instant::now() >= toast.expires_at {
                self.toast = None;
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if let Some(modal) = self.modal.take() {
            self.on_modal_key(modal, key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('t') => self.toggle_theme(),
            KeyCode::Tab => self.page = self.page.next(),
            KeyCode::Char(c @ '1'..='5') => {
                self.page = Page::ALL[c as usize - '1' as usize];
            }
            _ => {
                if self.page == Page::Board {
                    self.on_board_key(key);
                }
            }
        }
    }

    fn on_board_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                if self.selected_column > 0 {
                    self.selected_column -= 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.selected_column < Status::ALL.len() - 1 {
                    self.selected_column += 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_card = self.selected_card.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let count = self.store.by_status(self.selected_status()).len();
                if self.selected_card + 1 < count {
                    self.selected_card += 1;
                }
            }
            KeyCode::Char('a') => {
                self.modal = Some(Modal::TaskForm(TaskForm::blank(
                    Status::Backlog,
                    self.today(),
                )));
            }
            KeyCode::Char('A') => {
                self.modal = Some(Modal::TaskForm(TaskForm::blank(
                    self.selected_status(),
                    self.today(),
                )));
            }
            KeyCode::Enter => {
                if let Some(task) = self.selected_task() {
                    self.modal = Some(Modal::Detail { id: task.id.clone() });
                }
            }
            KeyCode::Char('e') => {
                if let Some(task) = self.selected_task() {
                    self.modal = Some(Modal::TaskForm(TaskForm::for_task(task)));
                }
            }
            KeyCode::Char('m') => {
                if let Some(task) = self.selected_task() {
                    self.modal = Some(Modal::MovePicker {
                        id: task.id.clone(),
                        selected: task.status.index(),
                    });
                }
            }
            KeyCode::Char('d') => {
                if let Some(task) = self.selected_task() {
                    self.modal = Some(Modal::ConfirmDelete { id: task.id.clone() });
                }
            }
            KeyCode::Char('H') | KeyCode::Char('[') => self.move_selected(-1),
            KeyCode::Char('L') | KeyCode::Char(']') => self.move_selected(1),
            _ => {}
        }
    }

    fn on_modal_key(&mut self, modal: Modal, key: KeyEvent) {
        match modal {
            Modal::TaskForm(form) => self.on_form_key(form, key),
            Modal::Detail { id } => match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => {}
                KeyCode::Char('e') => {
                    if let Some(task) = self.store.get(&id) {
                        self.modal = Some(Modal::TaskForm(TaskForm::for_task(task)));
                    }
                }
                KeyCode::Char('m') => {
                    if let Some(task) = self.store.get(&id) {
                        self.modal = Some(Modal::MovePicker {
                            selected: task.status.index(),
                            id,
                        });
                    }
                }
                KeyCode::Char('d') => {
                    self.modal = Some(Modal::ConfirmDelete { id });
                }
                _ => self.modal = Some(Modal::Detail { id }),
            },
            Modal::MovePicker { id, selected } => match key.code {
                KeyCode::Esc => {}
                KeyCode::Up | KeyCode::Char('k') => {
                    self.modal = Some(Modal::MovePicker {
                        id,
                        selected: selected.saturating_sub(1),
                    });
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.modal = Some(Modal::MovePicker {
                        id,
                        selected: (selected + 1).min(Status::ALL.len() - 1),
                    });
                }
                KeyCode::Enter => {
                    self.apply_move(&id, Status::ALL[selected]);
                }
                _ => self.modal = Some(Modal::MovePicker { id, selected }),
            },
            Modal::ConfirmDelete { id } => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => self.delete_task(&id),
                KeyCode::Esc | KeyCode::Char('n') => {}
                _ => self.modal = Some(Modal::ConfirmDelete { id }),
            },
        }
    }

    fn on_form_key(&mut self, mut form: TaskForm, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => return,
            KeyCode::Enter => {
                self.submit_form(form);
                return;
            }
            KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
            KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.prev(),
            KeyCode::Left => match form.focus {
                FormField::Status => form.status = cycle(&Status::ALL, form.status, -1),
                FormField::Priority => form.priority = cycle(&Priority::ALL, form.priority, -1),
                _ => {}
            },
            KeyCode::Right => match form.focus {
                FormField::Status => form.status = cycle(&Status::ALL, form.status, 1),
                FormField::Priority => form.priority = cycle(&Priority::ALL, form.priority, 1),
                _ => {}
            },
            KeyCode::Backspace => {
                if let Some(buffer) = form_buffer(&mut form) {
                    buffer.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(buffer) = form_buffer(&mut form) {
                    buffer.push(c);
                }
            }
            _ => {}
        }
        self.modal = Some(Modal::TaskForm(form));
    }

    fn submit_form(&mut self, form: TaskForm) {
        let due_date = match parse_due(&form.due_date) {
            Ok(due) => due,
            Err(message) => {
                self.toast_error(message);
                self.modal = Some(Modal::TaskForm(form));
                return;
            }
        };
        let result = match &form.editing {
            Some(id) => self
                .store
                .update(
                    id,
                    TaskPatch {
                        title: Some(form.title.clone()),
                        description: Some(form.description.clone()),
                        status: Some(form.status),
                        priority: Some(form.priority),
                        due_date: Some(due_date),
                    },
                )
                .map(|task| (task, "Task updated")),
            None => self
                .store
                .create(TaskDraft {
                    title: form.title.clone(),
                    description: form.description.clone(),
                    status: Some(form.status),
                    priority: form.priority,
                    due_date,
                })
                .map(|task| (task, "Task added")),
        };
        match result {
            Ok((task, message)) => {
                info!(id = %task.id, title = %task.title, "{message}");
                self.toast_success(message);
                self.clamp_selection();
            }
            Err(err @ StoreError::Validation(_)) => {
                // Leave the form up so the field can be fixed.
                self.toast_error(err.to_string());
                self.modal = Some(Modal::TaskForm(form));
            }
            Err(err) => self.store_error(err),
        }
    }

    fn move_selected(&mut self, delta: isize) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let id = task.id.clone();
        let target = task.status.index() as isize + delta;
        if !(0..Status::ALL.len() as isize).contains(&target) {
            return;
        }
        self.apply_move(&id, Status::ALL[target as usize]);
    }

    fn apply_move(&mut self, id: &str, target: Status) {
        match self.store.move_to(id, target.as_str()) {
            Ok(status) => {
                info!(id, status = %status, "task moved");
                self.toast_success(format!("Moved to {}", status.label()));
                // Selection follows the card into its new column.
                self.selected_column = status.index();
                self.selected_card = self
                    .store
                    .by_status(status)
                    .iter()
                    .position(|t| t.id == id)
                    .unwrap_or(0);
            }
            Err(err) => self.store_error(err),
        }
    }

    fn delete_task(&mut self, id: &str) {
        match self.store.delete(id) {
            Ok(()) => {
                info!(id, "task deleted");
                self.toast_success("Task deleted");
                self.clamp_selection();
            }
            Err(err) => self.store_error(err),
        }
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        if let Err(err) = theme::save(&self.data_dir, self.theme) {
            warn!(%err, "could not save theme choice");
        }
    }

    fn clamp_selection(&mut self) {
        let count = self.store.by_status(self.selected_status()).len();
        self.selected_card = self.selected_card.min(count.saturating_sub(1));
    }

    fn store_error(&mut self, err: StoreError) {
        match &err {
            StoreError::Validation(message) => self.toast_error(message.clone()),
            StoreError::NotFound(_) => self.toast_error("That task no longer exists"),
            StoreError::Io(_) | StoreError::Serde(_) => {
                tracing::error!(%err, "persist failed");
                self.toast_error("Could not save the board");
            }
        }
    }

    fn toast_success(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            kind: ToastKind::Success,
            expires_at: Instant::now() + Duration::from_secs(TOAST_SECS),
        });
    }

    fn toast_error(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            kind: ToastKind::Error,
            expires_at: Instant::now() + Duration::from_secs(TOAST_SECS),
        });
    }
}

fn form_buffer(form: &mut TaskForm) -> Option<&mut String> {
    match form.focus {
        FormField::Title => Some(&mut form.title),
        FormField::Description => Some(&mut form.description),
        FormField::DueDate => Some(&mut form.due_date),
        FormField::Status | FormField::Priority => None,
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, delta: isize) -> T {
    let len = all.len() as isize;
    let i = all.iter().position(|v| *v == current).unwrap_or(0) as isize;
    all[((i + delta + len) % len) as usize]
}

/// Empty means no due date; anything else must be YYYY-MM-DD.
fn parse_due(buffer: &str) -> Result<Option<NaiveDate>, &'static str> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| "Due date must be YYYY-MM-DD")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TaskStore;
    use tempfile::TempDir;

    fn scratch_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();
        let data_dir = dir.path().to_path_buf();
        (dir, App::new(store, Theme::Dark, data_dir))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.on_key(KeyEvent::from(code));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn form_submit_creates_a_task_in_backlog() {
        let (_dir, mut app) = scratch_app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "ship the release");
        press(&mut app, KeyCode::Enter);
        assert!(app.modal.is_none());
        assert_eq!(app.store.tasks().len(), 1);
        assert_eq!(app.store.tasks()[0].status, Status::Backlog);
        assert_eq!(app.store.tasks()[0].title, "ship the release");
        assert_eq!(app.toast.as_ref().unwrap().kind, ToastKind::Success);
    }

    #[test]
    fn empty_title_submit_keeps_the_form_open_and_board_unchanged() {
        let (_dir, mut app) = scratch_app();
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.modal, Some(Modal::TaskForm(_))));
        assert!(app.store.tasks().is_empty());
        assert_eq!(app.toast.as_ref().unwrap().kind, ToastKind::Error);
    }

    #[test]
    fn bad_due_date_is_rejected_before_the_store_sees_it() {
        let (_dir, mut app) = scratch_app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "dated");
        // Jump to the due date field and mangle it.
        for _ in 0..4 {
            press(&mut app, KeyCode::Tab);
        }
        type_text(&mut app, "not a date");
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.modal, Some(Modal::TaskForm(_))));
        assert!(app.store.tasks().is_empty());
    }

    #[test]
    fn bracket_keys_move_the_selected_card() {
        let (_dir, mut app) = scratch_app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "movable");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.store.tasks()[0].status, Status::InProgress);
        press(&mut app, KeyCode::Char('['));
        assert_eq!(app.store.tasks()[0].status, Status::Backlog);
        // Already leftmost, a further move is a no-op.
        press(&mut app, KeyCode::Char('['));
        assert_eq!(app.store.tasks()[0].status, Status::Backlog);
    }

    #[test]
    fn delete_flow_requires_confirmation() {
        let (_dir, mut app) = scratch_app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "doomed");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.store.tasks().len(), 1);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.store.tasks().is_empty());
    }

    #[test]
    fn edit_keeps_id_and_created_at() {
        let (_dir, mut app) = scratch_app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "before");
        press(&mut app, KeyCode::Enter);
        let (id, created_at) = {
            let task = &app.store.tasks()[0];
            (task.id.clone(), task.created_at)
        };
        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, " after");
        press(&mut app, KeyCode::Enter);
        let task = &app.store.tasks()[0];
        assert_eq!(task.title, "before after");
        assert_eq!(task.id, id);
        assert_eq!(task.created_at, created_at);
    }

    #[test]
    fn number_keys_switch_pages() {
        let (_dir, mut app) = scratch_app();
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.page, Page::Analytics);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.page, Page::Team);
    }

    #[test]
    fn open_tasks_sort_due_dated_first() {
        let (_dir, mut app) = scratch_app();
        let today = app.today();
        app.store
            .create(TaskDraft {
                title: "undated".into(),
                ..TaskDraft::default()
            })
            .unwrap();
        app.store
            .create(TaskDraft {
                title: "due soon".into(),
                due_date: Some(today),
                ..TaskDraft::default()
            })
            .unwrap();
        app.store
            .create(TaskDraft {
                title: "finished".into(),
                status: Some(Status::Done),
                due_date: Some(today),
                ..TaskDraft::default()
            })
            .unwrap();
        let open = app.open_tasks_by_due();
        assert_eq!(open.len(), 2);
        assert_eq!(open[0].title, "due soon");
        assert_eq!(open[1].title, "undated");
    }
}
