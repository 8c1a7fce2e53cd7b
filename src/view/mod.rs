//! View module - UI rendering
//!
//! - `player`: Play/pause icon, scan button and status bar
//! - `overlays`: Modal overlays (notice, permission prompt, scanner)

mod overlays;
mod player;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::{ConnectionState, Overlay, PlaybackState, ScanState, UiState};

/// Everything the screen shows, borrowed from the controller for one frame.
pub struct Screen<'a> {
    pub playback: &'a PlaybackState,
    pub connection: &'a ConnectionState,
    pub scan: &'a ScanState,
    pub last_scan: Option<&'a ScanState>,
    pub busy: bool,
    pub ui: &'a UiState,
}

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, screen: &Screen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title + connection
                Constraint::Min(7),    // Play/pause icon + current track
                Constraint::Length(5), // Scan button
                Constraint::Length(1), // Key hints
            ])
            .split(frame.area());

        player::render_header(frame, chunks[0], screen.connection, screen.scan, screen.busy);
        player::render_play_pause(frame, chunks[1], screen.playback, screen.last_scan);
        player::render_scan_button(frame, chunks[2]);
        player::render_key_hints(frame, chunks[3]);

        match &screen.ui.overlay {
            Overlay::None => {}
            Overlay::PermissionPrompt(permission) => overlays::render_permission_prompt(frame, *permission),
            Overlay::Scanner { options, buffer } => overlays::render_scanner(frame, options, buffer),
        }

        if let Some(notice) = &screen.ui.notice {
            overlays::render_notice(frame, notice);
        }
    }
}
