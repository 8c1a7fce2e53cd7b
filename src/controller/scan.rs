//! Scan session controller: camera permission, scanner invocation, result handling

use thiserror::Error;

use crate::model::{normalize, NormalizationError, Permission, PermissionState, ScanOptions, ScanState, TrackUri};
use crate::services::{PermissionService, ScannerService};

use super::playback::PlaybackHandoff;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("Camera permission is required to scan QR codes")]
    PermissionDenied,
    #[error("Unable to get song from this QR, is it a Spotify link? ({0})")]
    NotPlayable(#[from] NormalizationError),
    #[error("A scan is already in progress")]
    ScanInProgress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Decoded(TrackUri),
    Cancelled,
    /// The result arrived while no scan was running.
    Ignored,
}

pub struct ScanController<P: PermissionService, S: ScannerService> {
    permissions: P,
    scanner: S,
    options: ScanOptions,
    state: ScanState,
    permission: PermissionState,
    last_outcome: Option<ScanState>,
}

impl<P: PermissionService, S: ScannerService> ScanController<P, S> {
    pub fn new(permissions: P, scanner: S, options: ScanOptions) -> Self {
        Self {
            permissions,
            scanner,
            options,
            state: ScanState::Idle,
            permission: PermissionState::Unknown,
            last_outcome: None,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Terminal state of the most recent scan session.
    pub fn last_outcome(&self) -> Option<&ScanState> {
        self.last_outcome.as_ref()
    }

    pub fn request_scan(&mut self, playback: &mut impl PlaybackHandoff) -> Result<(), ScanError> {
        if self.state != ScanState::Idle {
            tracing::debug!(state = ?self.state, "Scan requested while a session is active");
            return Err(ScanError::ScanInProgress);
        }

        self.permission = self.permissions.check(Permission::Camera);
        tracing::debug!(permission = ?self.permission, "Checked camera permission");

        match self.permission {
            PermissionState::Granted => self.start_scanner(playback),
            PermissionState::Unknown | PermissionState::Denied => {
                self.state = ScanState::AwaitingPermission;
                self.permissions.request(Permission::Camera);
            }
        }
        Ok(())
    }

    pub fn on_permission_result(
        &mut self,
        granted: bool,
        playback: &mut impl PlaybackHandoff,
    ) -> Result<(), ScanError> {
        if self.state != ScanState::AwaitingPermission {
            tracing::warn!(state = ?self.state, granted, "Permission result without a pending request");
            return Ok(());
        }

        if granted {
            self.permission = PermissionState::Granted;
            self.start_scanner(playback);
            Ok(())
        } else {
            tracing::info!("Camera permission denied");
            self.permission = PermissionState::Denied;
            self.finish(ScanState::Idle);
            Err(ScanError::PermissionDenied)
        }
    }

    pub fn on_scan_result(
        &mut self,
        payload: Option<String>,
        playback: &mut impl PlaybackHandoff,
    ) -> Result<ScanOutcome, ScanError> {
        if self.state != ScanState::Scanning {
            tracing::warn!(state = ?self.state, "Scan result without a running scan");
            return Ok(ScanOutcome::Ignored);
        }

        let Some(payload) = payload else {
            tracing::debug!("Scan cancelled");
            self.finish(ScanState::Cancelled);
            return Ok(ScanOutcome::Cancelled);
        };

        tracing::debug!(payload = %payload, "Scanned QR code");
        match normalize(&payload) {
            Ok(uri) => {
                tracing::info!(uri = %uri, "Decoded track from QR code");
                self.finish(ScanState::Decoded(uri.clone()));
                playback.set_pending_track(uri.clone());
                Ok(ScanOutcome::Decoded(uri))
            }
            Err(e) => {
                tracing::warn!(payload = %payload, error = %e, "QR code is not a playable link");
                self.finish(ScanState::ScanFailed);
                Err(ScanError::NotPlayable(e))
            }
        }
    }

    fn start_scanner(&mut self, playback: &mut impl PlaybackHandoff) {
        // Audio must not keep running under the scanner.
        if playback.is_playing() {
            if let Err(e) = playback.pause() {
                tracing::warn!(error = %e, "Could not pause playback before scanning");
            }
        }
        self.state = ScanState::Scanning;
        self.scanner.start_scan(&self.options);
    }

    fn finish(&mut self, terminal: ScanState) {
        tracing::debug!(outcome = ?terminal, "Scan session finished");
        if terminal != ScanState::Idle {
            self.last_outcome = Some(terminal);
        }
        self.state = ScanState::Idle;
        self.permission = PermissionState::Unknown;
    }
}
