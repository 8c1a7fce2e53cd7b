//! Controller module - Application logic and event handling
//!
//! - `scan`: Scan session state machine (permission, scanner, decode)
//! - `playback`: Playback state machine (connection, play/pause, pending track)
//! - `events`: Completions posted by the services and their dispatch
//! - `input`: Key, paste and focus handling

mod events;
mod input;
mod playback;
mod scan;

use std::fmt::Display;

use tokio::sync::mpsc::UnboundedSender;

use crate::model::{ConnectionState, PlaybackState, ScanOptions, ScanState, UiState};
use crate::services::{PlaybackService, PromptScanner, StoredPermissions};

pub use events::AppEvent;
use playback::{PlaybackController, PlaybackError};
use scan::{ScanController, ScanOutcome};

/// Owns both state machines for one session and routes shell events into them.
pub struct AppController<R: PlaybackService> {
    pub(crate) scan: ScanController<StoredPermissions, PromptScanner>,
    pub(crate) playback: PlaybackController<R>,
    pub(crate) permission_store: StoredPermissions,
    pub(crate) events: UnboundedSender<AppEvent>,
    pub(crate) ui: UiState,
    follow_focus: bool,
}

impl<R: PlaybackService> AppController<R> {
    pub fn new(
        remote: R,
        permission_store: StoredPermissions,
        events: UnboundedSender<AppEvent>,
        follow_focus: bool,
    ) -> Self {
        let scanner = PromptScanner::new(events.clone());
        Self {
            scan: ScanController::new(permission_store.clone(), scanner, ScanOptions::default()),
            playback: PlaybackController::new(remote),
            permission_store,
            events,
            ui: UiState::default(),
            follow_focus,
        }
    }

    /// Session became visible.
    pub fn on_foreground(&mut self) {
        self.playback.connect();
    }

    /// Session went to the background or is ending.
    pub fn on_background(&mut self) {
        self.playback.disconnect();
    }

    pub fn on_focus_changed(&mut self, focused: bool) {
        if !self.follow_focus {
            return;
        }
        tracing::debug!(focused, "Terminal focus changed");
        if focused {
            self.on_foreground();
        } else {
            self.on_background();
        }
    }

    pub fn request_scan(&mut self) {
        if let Err(e) = self.scan.request_scan(&mut self.playback) {
            self.report(e);
        }
    }

    pub fn toggle_playback(&mut self) {
        match self.playback.toggle_play_pause() {
            Ok(()) => {}
            Err(e @ (PlaybackError::NotConnected | PlaybackError::RequestInProgress)) => {
                tracing::debug!(error = %e, "Play/pause ignored");
            }
            Err(e) => self.report(e),
        }
    }

    pub fn reconnect(&mut self) {
        tracing::info!("Reconnect requested");
        self.playback.connect();
    }

    pub fn playback_state(&self) -> &PlaybackState {
        self.playback.state()
    }

    pub fn connection(&self) -> &ConnectionState {
        self.playback.connection()
    }

    pub fn scan_state(&self) -> &ScanState {
        self.scan.state()
    }

    pub fn last_scan(&self) -> Option<&ScanState> {
        self.scan.last_outcome()
    }

    pub fn is_busy(&self) -> bool {
        self.playback.has_request_in_flight()
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn tick(&mut self) {
        self.ui.auto_clear_old_notice();
    }

    pub fn should_quit(&self) -> bool {
        self.ui.should_quit
    }

    pub(crate) fn report(&mut self, error: impl Display) {
        let message = error.to_string();
        tracing::warn!(notice = %message, "Showing notice");
        self.ui.set_notice(message);
    }
}
