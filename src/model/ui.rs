//! Shell-side UI state

use std::time::Instant;

use super::types::{Permission, ScanOptions};

const NOTICE_TTL_SECS: u64 = 5;

/// Modal shown on top of the player screen
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Overlay {
    #[default]
    None,
    PermissionPrompt(Permission),
    Scanner { options: ScanOptions, buffer: String },
}

#[derive(Clone, Debug, Default)]
pub struct UiState {
    pub overlay: Overlay,
    pub notice: Option<String>,
    pub notice_timestamp: Option<Instant>,
    pub should_quit: bool,
}

impl UiState {
    pub fn set_notice(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
        self.notice_timestamp = Some(Instant::now());
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
        self.notice_timestamp = None;
    }

    pub fn auto_clear_old_notice(&mut self) {
        if let Some(timestamp) = self.notice_timestamp {
            if timestamp.elapsed().as_secs() > NOTICE_TTL_SECS {
                self.clear_notice();
            }
        }
    }
}
