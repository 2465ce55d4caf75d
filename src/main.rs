mod app;
mod storage;
mod store;
mod task;
mod theme;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::App;
use store::TaskStore;
use theme::Theme;

/// Kanban task board for the terminal.
#[derive(Debug, Parser)]
#[command(name = "taskdeck", version, about)]
struct Args {
    /// Where the board lives. Defaults to ~/.taskdeck
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Force a theme for this run without saving the choice.
    #[arg(long, value_enum)]
    theme: Option<Theme>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let data_dir = storage::ensure_data_dir(args.data_dir)?;
    init_tracing(&data_dir)?;

    let mut store = TaskStore::open(storage::tasks_path(&data_dir))
        .with_context(|| format!("load board from {}", data_dir.display()))?;
    if store.is_empty() {
        store.seed_samples(Local::now().date_naive())?;
        info!("seeded a fresh board with sample tasks");
    }
    let theme = args.theme.unwrap_or_else(|| theme::load(&data_dir));
    info!(tasks = store.tasks().len(), theme = theme.label(), "starting");

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut board = App::new(store, theme, data_dir);
    let result = run_app(&mut terminal, &mut board);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // Poll rather than block so toasts can expire on time.
        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }
        app.tick();
        if app.should_quit {
            return Ok(());
        }
    }
}

/// Logs go to a file in the data directory. The board owns the terminal,
/// so nothing may write to stdout or stderr while it is up.
fn init_tracing(data_dir: &std::path::Path) -> Result<()> {
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(storage::log_path(data_dir))
        .with_context(|| format!("open log in {}", data_dir.display()))?;
    let filter = EnvFilter::try_from_env("TASKDECK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(log))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("init tracing: {err}"))?;
    Ok(())
}
