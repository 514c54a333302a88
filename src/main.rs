use abloop::app::cli::Args;
use abloop::app::config::AppConfig;
use abloop::app::events::AppEvent;
use abloop::app::{self, App};
use abloop::clock::SystemClock;
use abloop::player::dom::SimulatedPage;
use abloop::storage::{FileStorage, MemoryStorage, SharedStorage};
use abloop::ui;
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::{io, time::Duration};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

/// Logs go to a file: the terminal belongs to the UI.
fn init_logging(path: &Path, level: &str) -> Result<WorkerGuard> {
    let dir = path.parent().context("Log path has no directory")?;
    let file_name = path.file_name().context("Log path has no file name")?;
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let level = tracing::Level::from_str(level).unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_max_level(level)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();
    let args = Args::parse();

    if args.generate_config {
        println!("{}", AppConfig::default_toml()?);
        return Ok(());
    }

    let mut config = AppConfig::load();
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    let _log_guard = init_logging(&AppConfig::get_log_path(), &config.log_level)?;
    tracing::info!("abloop {} starting", env!("CARGO_PKG_VERSION"));

    let storage: SharedStorage = if args.in_memory {
        MemoryStorage::shared()
    } else {
        let path = args.storage.clone().unwrap_or_else(AppConfig::get_storage_path);
        tracing::info!("storage at {}", path.display());
        Arc::new(FileStorage::new(path))
    };

    // The simulated player tab 🎧
    let clock = SystemClock::shared();
    let sim = &config.simulator;
    let page = SimulatedPage::new(
        clock.clone(),
        args.track.as_deref().unwrap_or(&sim.track_name),
        args.duration.unwrap_or(sim.duration_secs),
    );
    page.set_labels(&sim.pause_label, &sim.play_label);
    if sim.range_max > 0.0 {
        page.set_range_max(Some(sim.range_max));
    }

    let theme = ui::theme::load_theme(&AppConfig::get_config_dir().join("theme.toml"));
    let mut app = App::new(&config, theme, page, storage, clock).await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let (tx, mut rx) = mpsc::channel(100);

    // 1. Input Event Task
    let tx_input = tx.clone();
    tokio::spawn(async move {
        let mut reader = EventStream::new();
        while let Some(Ok(event)) = reader.next().await {
            if tx_input.send(AppEvent::Input(event)).await.is_err() {
                break;
            }
        }
    });

    // 2. Popup Status Poll Task
    let tx_status = tx.clone();
    let status_poll = config.sync.status_poll();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(status_poll);
        loop {
            interval.tick().await;
            if tx_status.send(AppEvent::StatusPoll).await.is_err() {
                break;
            }
        }
    });

    // 3. Redraw Tick Task ⚡
    let tx_tick = tx;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(50));
        loop {
            interval.tick().await;
            if tx_tick.send(AppEvent::Tick).await.is_err() {
                break;
            }
        }
    });

    let result = run(&mut terminal, &mut app, &mut rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("abloop exiting");
    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mut mpsc::Receiver<AppEvent>,
) -> Result<()> {
    while app.is_running {
        terminal.draw(|f| ui::ui(f, app))?;

        let Some(event) = rx.recv().await else {
            break;
        };
        match event {
            AppEvent::Input(Event::Key(key)) => {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    app.is_running = false;
                } else {
                    app::input_handler::handle_key(key, app).await;
                }
            }
            AppEvent::Input(_) => {}
            AppEvent::StatusPoll => app.poll_status().await,
            AppEvent::Tick => app.on_tick(),
        }
    }
    Ok(())
}
