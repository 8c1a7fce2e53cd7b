//! Key event handling

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::Overlay;
use crate::services::PlaybackService;

use super::{AppController, AppEvent};

impl<R: PlaybackService> AppController<R> {
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.ui.should_quit = true;
            return;
        }

        match self.ui.overlay.clone() {
            Overlay::PermissionPrompt(permission) => {
                let granted = match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => true,
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => false,
                    _ => return,
                };
                self.ui.overlay = Overlay::None;
                self.permission_store.record(permission, granted);
                return;
            }
            Overlay::Scanner { .. } => {
                self.handle_scanner_key(key);
                return;
            }
            Overlay::None => {}
        }

        // Any key dismisses the notice; Esc and Enter do nothing else
        if self.ui.notice.is_some() {
            self.ui.clear_notice();
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                return;
            }
        }

        match key.code {
            KeyCode::Char('s') | KeyCode::Char('S') => self.request_scan(),
            KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => self.toggle_playback(),
            KeyCode::Char('c') | KeyCode::Char('C') => self.reconnect(),
            KeyCode::Char('q') | KeyCode::Char('Q') => self.ui.should_quit = true,
            _ => {}
        }
    }

    /// Bracketed paste: a whole payload at once.
    pub fn handle_paste(&mut self, text: &str) {
        if let Overlay::Scanner { buffer, .. } = &mut self.ui.overlay {
            buffer.push_str(text.trim_end_matches(['\r', '\n']));
        }
    }

    fn handle_scanner_key(&mut self, key: KeyEvent) {
        let Overlay::Scanner { buffer, .. } = &mut self.ui.overlay else {
            return;
        };

        let payload = match key.code {
            KeyCode::Char(c) => {
                buffer.push(c);
                return;
            }
            KeyCode::Backspace => {
                buffer.pop();
                return;
            }
            KeyCode::Enter if buffer.trim().is_empty() => return,
            KeyCode::Enter => Some(buffer.trim().to_string()),
            KeyCode::Esc => None,
            _ => return,
        };

        self.ui.overlay = Overlay::None;
        if self.events.send(AppEvent::ScanResult(payload)).is_err() {
            tracing::debug!("Event loop gone, dropping scan result");
        }
    }
}
