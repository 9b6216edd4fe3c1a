mod export;
mod help;
mod panels;
mod state;

use crate::cli::{build_config, Cli};
use crate::lookup::nces::NcesClient;
use crate::lookup::LookupService;
use crate::model::{AppEvent, LookupConfig};
use crate::orchestrator::{self, LookupCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use state::{KeyAction, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::info;

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let service: Arc<dyn LookupService> =
        Arc::new(NcesClient::new(&cfg).context("create lookup client")?);

    // Unbounded channels keep the UI thread from ever blocking on the runtime.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<LookupCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(cfg, event_rx, cmd_tx));

    let res = orchestrator::run_controller(service, event_tx, cmd_rx).await;
    join_ui_thread(ui_handle).await?;
    res
}

async fn join_ui_thread(handle: std::thread::JoinHandle<Result<()>>) -> Result<()> {
    let joined = tokio::task::spawn_blocking(move || handle.join())
        .await
        .context("join TUI thread")?;
    match joined {
        Ok(res) => res,
        Err(_) => Err(anyhow::anyhow!("TUI thread panicked")),
    }
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    cfg: LookupConfig,
    mut event_rx: UnboundedReceiver<AppEvent>,
    cmd_tx: UnboundedSender<LookupCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState, and the search state inside it, is owned by the UI thread only.
    let mut state = UiState::new(&cfg);
    info!(policy = ?cfg.stale_policy, "TUI started");

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            state.spinner_tick = state.spinner_tick.wrapping_add(1);
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match state.handle_key(k) {
                    KeyAction::None => {}
                    KeyAction::Dispatch(ticket) => {
                        if cmd_tx.send(LookupCommand::Search(ticket)).is_err() {
                            break Err(anyhow::anyhow!("lookup controller stopped"));
                        }
                    }
                    KeyAction::Copy(url) => {
                        state.info = match export::copy_to_clipboard(&url) {
                            Ok(()) => "✓ Copied map link to clipboard".into(),
                            Err(e) => format!("Clipboard copy failed: {e:#}"),
                        };
                    }
                    KeyAction::Quit => {
                        let _ = cmd_tx.send(LookupCommand::Quit);
                        break Ok(());
                    }
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    let searches = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(cols[0]);

    panels::draw_district_panel(searches[0], f, state);
    panels::draw_school_panel(searches[1], f, state);
    panels::draw_details_panel(cols[1], f, state);
    panels::draw_status(rows[1], f, state);

    if state.show_help {
        help::draw_help(area, f);
    }
}
