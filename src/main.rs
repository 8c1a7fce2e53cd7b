mod auth;
mod config;
mod controller;
mod logging;
mod model;
mod services;
mod view;

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableBracketedPaste, DisableFocusChange, EnableBracketedPaste, EnableFocusChange, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use config::AppConfig;
use controller::{AppController, AppEvent};
use services::{PlaybackService, SpotifyRemote, StoredPermissions, PERMISSIONS_FILE};
use view::{AppView, Screen};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== spotify-qr starting ===");

    let config = AppConfig::from_env()?;

    // First-run browser login happens before the TUI takes over the terminal
    auth::ensure_authorized(&config).await?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let remote = SpotifyRemote::new(config.clone(), events_tx.clone());
    let permissions = StoredPermissions::new(config.cache_dir.join(PERMISSIONS_FILE), events_tx.clone());
    let mut controller = AppController::new(remote, permissions, events_tx, config.follow_focus);

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    controller.on_foreground();

    let res = run_app(&mut terminal, &mut controller, events_rx);

    controller.on_background();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableFocusChange,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("spotify-qr shutting down");
    Ok(())
}

fn run_app<R: PlaybackService>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut AppController<R>,
    mut events: UnboundedReceiver<AppEvent>,
) -> io::Result<()> {
    loop {
        while let Ok(event) = events.try_recv() {
            controller.handle_event(event);
        }

        controller.tick();

        terminal.draw(|f| {
            let screen = Screen {
                playback: controller.playback_state(),
                connection: controller.connection(),
                scan: controller.scan_state(),
                last_scan: controller.last_scan(),
                busy: controller.is_busy(),
                ui: controller.ui(),
            };
            AppView::render(f, &screen);
        })?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => controller.handle_key_event(key),
                Event::Paste(text) => controller.handle_paste(&text),
                Event::FocusGained => controller.on_focus_changed(true),
                Event::FocusLost => controller.on_focus_changed(false),
                _ => {}
            }
        }

        if controller.should_quit() {
            break;
        }
    }

    Ok(())
}
