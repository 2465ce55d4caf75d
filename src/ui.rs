//! Rendering. Everything here is a pure function of [`App`]: the board and
//! its pages are derived from `tasks()` and `summary()`, never the other
//! way around.

use chrono::{Datelike, Months, NaiveDate};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::{App, FormField, Modal, Page, TaskForm, ToastKind};
use crate::task::{Status, Task};
use crate::theme::Palette;

pub fn draw(f: &mut Frame, app: &App) {
    let palette = app.theme.palette();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, app, &palette, chunks[0]);
    draw_stats(f, app, &palette, chunks[1]);
    match app.page {
        Page::Board => draw_board(f, app, &palette, chunks[2]),
        Page::Calendar => draw_calendar(f, app, &palette, chunks[2]),
        Page::Analytics => draw_analytics(f, app, &palette, chunks[2]),
        Page::Team => draw_team(f, app, &palette, chunks[2]),
        Page::MyTasks => draw_my_tasks(f, app, &palette, chunks[2]),
    }
    draw_footer(f, app, &palette, chunks[3]);
    if let Some(modal) = &app.modal {
        draw_modal(f, app, &palette, modal);
    }
    if let Some(toast) = &app.toast {
        let style = match toast.kind {
            ToastKind::Success => Style::default().fg(palette.success),
            ToastKind::Error => Style::default().fg(palette.danger),
        };
        draw_toast(f, &toast.message, style, chunks[2]);
    }
}

fn draw_header(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let mut spans = vec![
        Span::styled(
            " taskdeck ",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];
    for (i, page) in Page::ALL.iter().enumerate() {
        let style = if *page == app.page {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.dim)
        };
        spans.push(Span::styled(format!("{} {}", i + 1, page.title()), style));
        spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(
        format!("[{}]", app.theme.label()),
        Style::default().fg(palette.dim),
    ));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_stats(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let summary = app.store.summary(app.today());
    let overdue_style = if summary.overdue > 0 {
        Style::default().fg(palette.danger)
    } else {
        Style::default().fg(palette.dim)
    };
    let line = Line::from(vec![
        Span::styled(
            format!(" {} tasks", summary.total),
            Style::default().fg(palette.fg),
        ),
        Span::styled(
            format!("  {} high priority", summary.high_priority),
            Style::default().fg(palette.warning),
        ),
        Span::styled(
            format!("  {} due today", summary.due_today),
            Style::default().fg(palette.fg),
        ),
        Span::styled(format!("  {} overdue", summary.overdue), overdue_style),
        Span::styled(
            format!("  {} done", summary.done),
            Style::default().fg(palette.success),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_board(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let today = app.today();
    for (i, status) in Status::ALL.iter().enumerate() {
        let tasks = app.store.by_status(*status);
        let column_selected = app.selected_column == i;
        let items: Vec<ListItem> = if tasks.is_empty() {
            vec![ListItem::new(Line::from(Span::styled(
                " no tasks",
                Style::default().fg(palette.dim),
            )))]
        } else {
            tasks
                .iter()
                .enumerate()
                .map(|(row, task)| {
                    card_item(task, today, palette, column_selected && row == app.selected_card)
                })
                .collect()
        };

        let border_style = if column_selected {
            Style::default().fg(palette.accent)
        } else {
            Style::default().fg(palette.border)
        };
        let list = List::new(items).block(
            Block::default()
                .title(format!("{} ({})", status.label(), tasks.len()))
                .borders(Borders::ALL)
                .border_style(border_style),
        );
        f.render_widget(list, chunks[i]);
    }
}

fn card_item<'a>(
    task: &'a Task,
    today: NaiveDate,
    palette: &Palette,
    selected: bool,
) -> ListItem<'a> {
    let marker = if selected { "▸ " } else { "  " };
    let title_style = if selected {
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.fg)
    };
    let first = Line::from(vec![
        Span::raw(marker),
        Span::styled("▌", Style::default().fg(palette.priority(task.priority))),
        Span::styled(&task.title, title_style),
    ]);
    let second = match task.due_date {
        Some(due) if task.is_overdue(today) => Line::from(Span::styled(
            format!("   due {due} (overdue)"),
            Style::default().fg(palette.danger),
        )),
        Some(due) => Line::from(Span::styled(
            format!("   due {due}"),
            Style::default().fg(palette.dim),
        )),
        None => Line::from(Span::styled(
            "   no due date",
            Style::default().fg(palette.dim),
        )),
    };
    ListItem::new(vec![first, second])
}

fn draw_calendar(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let today = app.today();
    let first = today.with_day(1).unwrap_or(today);
    let next_month = first + Months::new(1);
    let days_in_month = next_month.signed_duration_since(first).num_days();
    let offset = first.weekday().num_days_from_monday() as usize;

    let mut lines = vec![
        Line::from(Span::styled(
            format!(" {}", today.format("%B %Y")),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "  Mo  Tu  We  Th  Fr  Sa  Su",
            Style::default().fg(palette.dim),
        )),
    ];

    let mut cells: Vec<Span> = vec![Span::raw("    ".repeat(offset))];
    let mut weekday = offset;
    for day in 1..=days_in_month {
        let date = first + chrono::Days::new(day as u64 - 1);
        let due_count = app.store.tasks().iter().filter(|t| t.is_due_on(date)).count();
        let style = if date == today {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else if due_count > 0 {
            Style::default().fg(palette.warning)
        } else {
            Style::default().fg(palette.fg)
        };
        cells.push(Span::styled(format!("{day:>4}"), style));
        weekday += 1;
        if weekday == 7 {
            lines.push(Line::from(std::mem::take(&mut cells)));
            weekday = 0;
        }
    }
    if !cells.is_empty() {
        lines.push(Line::from(cells));
    }

    lines.push(Line::raw(""));
    let mut due_dates: Vec<(NaiveDate, usize)> = Vec::new();
    for task in app.store.tasks() {
        if let Some(due) = task.due_date {
            if due.month() == today.month() && due.year() == today.year() {
                match due_dates.iter_mut().find(|(d, _)| *d == due) {
                    Some((_, count)) => *count += 1,
                    None => due_dates.push((due, 1)),
                }
            }
        }
    }
    due_dates.sort();
    for (date, count) in due_dates {
        lines.push(Line::from(Span::styled(
            format!(" {} — {count} due", date.format("%b %e")),
            Style::default().fg(palette.fg),
        )));
    }

    let block = Block::default()
        .title("Calendar")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_analytics(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let summary = app.store.summary(app.today());
    let block = Block::default()
        .title("Analytics")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut constraints = vec![Constraint::Length(2); Status::ALL.len()];
    constraints.push(Constraint::Min(0));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (i, status) in Status::ALL.iter().enumerate() {
        let count = summary.count(*status);
        let ratio = if summary.total == 0 {
            0.0
        } else {
            count as f64 / summary.total as f64
        };
        let gauge = Gauge::default()
            .block(Block::default().title(status.label()))
            .gauge_style(Style::default().fg(palette.accent))
            .ratio(ratio)
            .label(format!("{count}/{}", summary.total));
        f.render_widget(gauge, rows[i]);
    }

    let detail = Paragraph::new(vec![
        Line::raw(""),
        Line::from(Span::styled(
            format!("high priority: {}", summary.high_priority),
            Style::default().fg(palette.warning),
        )),
        Line::from(Span::styled(
            format!("due today:     {}", summary.due_today),
            Style::default().fg(palette.fg),
        )),
        Line::from(Span::styled(
            format!("overdue:       {}", summary.overdue),
            Style::default().fg(palette.danger),
        )),
    ]);
    f.render_widget(detail, rows[Status::ALL.len()]);
}

fn draw_team(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    // Mock roster. The board has no assignee field, so the workload column
    // is simulated.
    let roster = [
        ("Ava Torres", "Design", 4),
        ("Sam Whitfield", "Frontend", 6),
        ("Priya Nair", "Backend", 5),
        ("Leo Martin", "QA", 3),
    ];
    let open = app.store.summary(app.today());
    let open_count = open.total - open.done;

    let mut lines = vec![
        Line::from(Span::styled(
            format!(" {open_count} open tasks across the team"),
            Style::default().fg(palette.fg),
        )),
        Line::raw(""),
    ];
    for (name, role, load) in roster {
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {name:<16}"),
                Style::default()
                    .fg(palette.fg)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("{role:<10}"), Style::default().fg(palette.dim)),
            Span::styled(
                format!("{} this week", "●".repeat(load)),
                Style::default().fg(palette.accent),
            ),
        ]));
    }

    let block = Block::default()
        .title("Team")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_my_tasks(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let today = app.today();
    let tasks = app.open_tasks_by_due();
    let items: Vec<ListItem> = if tasks.is_empty() {
        vec![ListItem::new(Span::styled(
            " nothing open",
            Style::default().fg(palette.dim),
        ))]
    } else {
        tasks
            .iter()
            .map(|task| {
                let due = match task.due_date {
                    Some(due) if task.is_overdue(today) => Span::styled(
                        format!("  overdue since {due}"),
                        Style::default().fg(palette.danger),
                    ),
                    Some(due) => {
                        Span::styled(format!("  due {due}"), Style::default().fg(palette.dim))
                    }
                    None => Span::styled("  no due date", Style::default().fg(palette.dim)),
                };
                ListItem::new(Line::from(vec![
                    Span::styled("▌", Style::default().fg(palette.priority(task.priority))),
                    Span::styled(&task.title, Style::default().fg(palette.fg)),
                    Span::styled(
                        format!("  [{}]", task.status.label()),
                        Style::default().fg(palette.dim),
                    ),
                    due,
                ]))
            })
            .collect()
    };
    let block = Block::default()
        .title("My Tasks")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border));
    f.render_widget(List::new(items).block(block), area);
}

fn draw_footer(f: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let hints = match &app.modal {
        Some(Modal::TaskForm(_)) => " tab field · ←/→ choose · enter save · esc cancel",
        Some(Modal::Detail { .. }) => " e edit · m move · d delete · esc close",
        Some(Modal::MovePicker { .. }) => " ↑/↓ column · enter move · esc cancel",
        Some(Modal::ConfirmDelete { .. }) => " y delete · n keep",
        None => match app.page {
            Page::Board => {
                " q quit · t theme · 1-5 page · a add · A add here · enter open · e edit · m move · d delete · [ ] shift"
            }
            _ => " q quit · t theme · 1-5 page · tab next page",
        },
    };
    f.render_widget(
        Paragraph::new(Span::styled(hints, Style::default().fg(palette.dim))),
        area,
    );
}

fn draw_modal(f: &mut Frame, app: &App, palette: &Palette, modal: &Modal) {
    match modal {
        Modal::TaskForm(form) => draw_task_form(f, palette, form),
        Modal::Detail { id } => {
            if let Some(task) = app.store.get(id) {
                draw_detail(f, app, palette, task);
            }
        }
        Modal::MovePicker { selected, .. } => draw_move_picker(f, palette, *selected),
        Modal::ConfirmDelete { id } => {
            let title = app.store.get(id).map(|t| t.title.as_str()).unwrap_or("");
            draw_confirm(f, palette, title);
        }
    }
}

fn draw_task_form(f: &mut Frame, palette: &Palette, form: &TaskForm) {
    let area = centered_rect(f.area(), 50, 9);
    f.render_widget(Clear, area);

    let mut lines = Vec::new();
    for field in FormField::ALL {
        let focused = form.focus == field;
        let value = match field {
            FormField::Title => form.title.clone(),
            FormField::Description => form.description.clone(),
            FormField::Status => format!("◂ {} ▸", form.status.label()),
            FormField::Priority => format!("◂ {} ▸", form.priority.label()),
            FormField::DueDate => form.due_date.clone(),
        };
        let cursor = if focused && !matches!(field, FormField::Status | FormField::Priority) {
            "▏"
        } else {
            ""
        };
        let value_style = if focused {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.fg)
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {:<12}", field.label()),
                Style::default().fg(palette.dim),
            ),
            Span::styled(format!("{value}{cursor}"), value_style),
        ]));
    }

    let title = if form.editing.is_some() {
        "Edit Task"
    } else {
        "Add Task"
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_detail(f: &mut Frame, app: &App, palette: &Palette, task: &Task) {
    let area = centered_rect(f.area(), 60, 12);
    f.render_widget(Clear, area);

    let due = match task.due_date {
        Some(due) if task.is_overdue(app.today()) => Span::styled(
            format!("{due} (overdue)"),
            Style::default().fg(palette.danger),
        ),
        Some(due) => Span::styled(due.to_string(), Style::default().fg(palette.fg)),
        None => Span::styled("none", Style::default().fg(palette.dim)),
    };
    let lines = vec![
        Line::from(Span::styled(
            task.title.clone(),
            Style::default()
                .fg(palette.fg)
                .add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::from(Span::styled(
            if task.description.is_empty() {
                "No description provided".to_string()
            } else {
                task.description.clone()
            },
            Style::default().fg(palette.fg),
        )),
        Line::raw(""),
        Line::from(vec![
            Span::styled("status    ", Style::default().fg(palette.dim)),
            Span::styled(task.status.label(), Style::default().fg(palette.accent)),
        ]),
        Line::from(vec![
            Span::styled("priority  ", Style::default().fg(palette.dim)),
            Span::styled(
                task.priority.label(),
                Style::default().fg(palette.priority(task.priority)),
            ),
        ]),
        Line::from(vec![
            Span::styled("due       ", Style::default().fg(palette.dim)),
            due,
        ]),
        Line::from(vec![
            Span::styled("created   ", Style::default().fg(palette.dim)),
            Span::styled(
                task.created_at.format("%Y-%m-%d %H:%M").to_string(),
                Style::default().fg(palette.fg),
            ),
        ]),
    ];
    let block = Block::default()
        .title("Task")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent));
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}

fn draw_move_picker(f: &mut Frame, palette: &Palette, selected: usize) {
    let area = centered_rect(f.area(), 30, 6);
    f.render_widget(Clear, area);

    let items: Vec<ListItem> = Status::ALL
        .iter()
        .enumerate()
        .map(|(i, status)| {
            let style = if i == selected {
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(palette.fg)
            };
            let marker = if i == selected { "▸ " } else { "  " };
            ListItem::new(Line::from(Span::styled(
                format!("{marker}{}", status.label()),
                style,
            )))
        })
        .collect();
    let block = Block::default()
        .title("Move to")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent));
    f.render_widget(List::new(items).block(block), area);
}

fn draw_confirm(f: &mut Frame, palette: &Palette, title: &str) {
    let area = centered_rect(f.area(), 44, 5);
    f.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(
            format!("Delete \"{title}\"?"),
            Style::default().fg(palette.fg),
        )),
        Line::raw(""),
        Line::from(Span::styled(
            "This cannot be undone.  y / n",
            Style::default().fg(palette.danger),
        )),
    ];
    let block = Block::default()
        .title("Delete Task")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.danger));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_toast(f: &mut Frame, message: &str, style: Style, body: Rect) {
    if body.height < 3 || body.width < 8 {
        return;
    }
    let width = (message.chars().count() as u16 + 4).min(body.width);
    let area = Rect {
        x: body.right().saturating_sub(width),
        y: body.bottom().saturating_sub(3),
        width,
        height: 3.min(body.height),
    };
    f.render_widget(Clear, area);
    let block = Block::default().borders(Borders::ALL).border_style(style);
    f.render_widget(
        Paragraph::new(Span::styled(message, style)).block(block),
        area,
    );
}

/// Fixed-size box centered in `area`, clipped to it.
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
