mod app;
mod ui;

use anyhow::{Context, Result};
use app::{App, Notice};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use futures::StreamExt;
use ratatui::DefaultTerminal;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use visit_heatmap::config::{Settings, SourceKind};
use visit_heatmap::coordinator::{MapSpan, RenderCoordinator};
use visit_heatmap::map::Viewport;
use visit_heatmap::position::{GpsdSource, PositionSource, SimulatedSource};
use visit_heatmap::scheduler::SamplingScheduler;
use visit_heatmap::store::{LocationStore, SqliteLocationStore};
use visit_heatmap::StoreError;

const LOG_FILE: &str = "visit-heatmap.log";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let settings = Settings::from_env();
    let data_dir = settings.data_dir.clone().ok_or(StoreError::NoDataDir)?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
    init_logging(&data_dir)?;
    settings.log_issues();

    let store: Arc<dyn LocationStore> = Arc::new(
        SqliteLocationStore::open_in(&data_dir).context("failed to initialize location store")?,
    );

    let source: Arc<dyn PositionSource> = match &settings.source {
        SourceKind::Simulated { home } => Arc::new(
            SimulatedSource::new(home.0, home.1, seed()).with_permission(settings.permission),
        ),
        SourceKind::Gpsd { addr } => Arc::new(GpsdSource::new(addr.clone())),
    };
    info!(source = source.name(), dir = %data_dir.display(), "starting");

    let scheduler = Arc::new(SamplingScheduler::new(Arc::clone(&source), Arc::clone(&store)));
    let coordinator = RenderCoordinator::new(Arc::clone(&store));

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &settings, &store, &scheduler, &coordinator, source.as_ref()).await;

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        tracing::error!(error = %e, "exiting with error");
    }
    result
}

/// Log to a file in the data directory; stdout belongs to the terminal UI
fn init_logging(dir: &Path) -> Result<()> {
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Seed for the simulated walk; varies per run
fn seed() -> u64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64
}

/// First window shown: around the newest stored sample, else the simulated
/// home, else the whole world
fn initial_viewport(settings: &Settings, store: &dyn LocationStore) -> Viewport {
    match store.latest() {
        Ok(Some(s)) => return MapSpan::around(s.latitude(), s.longitude()).to_viewport(),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "could not read latest sample"),
    }
    match settings.source {
        SourceKind::Simulated { home } => MapSpan::around(home.0, home.1).to_viewport(),
        SourceKind::Gpsd { .. } => Viewport::world(),
    }
}

async fn run(
    terminal: &mut DefaultTerminal,
    settings: &Settings,
    store: &Arc<dyn LocationStore>,
    scheduler: &Arc<SamplingScheduler>,
    coordinator: &RenderCoordinator,
    source: &dyn PositionSource,
) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(
        size.width as usize,
        size.height as usize,
        initial_viewport(settings, store.as_ref()),
    );
    app.source_name = scheduler.source_name();
    app.latest = store.latest().ok().flatten();

    let mut samples = scheduler.subscribe();
    let mut sampler_live = true;

    let permission = source.request_permission().await;
    match scheduler.arm(permission) {
        Ok(()) => {
            tokio::spawn(Arc::clone(scheduler).run());
        }
        Err(denied) => {
            warn!(error = %denied, "sampling disabled");
            app.notice = Some(Notice::permission_denied());
        }
    }

    let mut events = EventStream::new();

    loop {
        if app.needs_refresh() {
            app.refresh(coordinator);
        }
        app.sampler = scheduler.state();
        terminal.draw(|frame| ui::render(frame, &app))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => handle_event(&mut app, event),
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            changed = samples.changed(), if sampler_live => match changed {
                Ok(()) => {
                    if let Some(sample) = *samples.borrow_and_update() {
                        app.on_sample(sample);
                    }
                }
                Err(_) => sampler_live = false,
            },
        }

        if app.should_quit {
            break;
        }
    }

    info!("shutting down");
    Ok(())
}

fn handle_event(app: &mut App, event: Event) {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            // The notice swallows the key that dismisses it
            if app.notice.is_some() {
                app.dismiss_notice();
                return;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                // Pan with hjkl or arrow keys
                KeyCode::Left | KeyCode::Char('h') => app.pan_step(-1, 0),
                KeyCode::Right | KeyCode::Char('l') => app.pan_step(1, 0),
                KeyCode::Up | KeyCode::Char('k') => app.pan_step(0, -1),
                KeyCode::Down | KeyCode::Char('j') => app.pan_step(0, 1),

                // Zoom
                KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                KeyCode::Char('f') | KeyCode::Char('F') => app.toggle_follow(),
                KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                _ => {}
            }
        }
        Event::Mouse(mouse) if app.notice.is_none() => handle_mouse(app, mouse),
        Event::Resize(width, height) => app.resize(width as usize, height as usize),
        _ => {}
    }
}

/// Handle mouse events for panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15.0, 0.0),
        MouseEventKind::ScrollRight => app.pan(15.0, 0.0),
        // Click and drag to pan
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}
