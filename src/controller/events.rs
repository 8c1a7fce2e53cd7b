//! Service completions and their dispatch into the state machines

use crate::model::{Overlay, Permission, RequestId, ScanOptions};
use crate::services::PlaybackService;

use super::{AppController, ScanOutcome};

/// Posted by the services (and the scanner overlay) to the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    PlaybackConnected,
    PlaybackConnectFailed(String),
    PlaybackRequestFinished {
        request: RequestId,
        result: Result<(), String>,
    },
    PermissionPrompt(Permission),
    PermissionResult(bool),
    ScannerOpened(ScanOptions),
    ScanResult(Option<String>),
}

impl<R: PlaybackService> AppController<R> {
    pub fn handle_event(&mut self, event: AppEvent) {
        tracing::trace!(?event, "Dispatching event");
        match event {
            AppEvent::PlaybackConnected => self.playback.on_connected(),
            AppEvent::PlaybackConnectFailed(reason) => {
                if let Err(e) = self.playback.on_connection_failed(reason) {
                    self.report(e);
                }
            }
            AppEvent::PlaybackRequestFinished { request, result } => {
                if let Err(e) = self.playback.on_request_complete(request, result) {
                    self.report(e);
                }
            }
            AppEvent::PermissionPrompt(permission) => {
                self.ui.overlay = Overlay::PermissionPrompt(permission);
            }
            AppEvent::PermissionResult(granted) => {
                if let Err(e) = self.scan.on_permission_result(granted, &mut self.playback) {
                    self.report(e);
                }
            }
            AppEvent::ScannerOpened(options) => {
                self.ui.overlay = Overlay::Scanner {
                    options,
                    buffer: String::new(),
                };
            }
            AppEvent::ScanResult(payload) => {
                match self.scan.on_scan_result(payload, &mut self.playback) {
                    Ok(ScanOutcome::Decoded(uri)) => {
                        tracing::info!(uri = %uri, "Scanned track handed to playback");
                    }
                    Ok(ScanOutcome::Cancelled | ScanOutcome::Ignored) => {}
                    Err(e) => self.report(e),
                }
            }
        }
    }
}
