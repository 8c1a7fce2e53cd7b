//! Services module - boundaries to the outside world
//!
//! The controllers only talk to these traits. Every method starts work and
//! returns immediately; outcomes come back later as `AppEvent`s which the
//! event loop feeds into the controllers' `on_*` entry points.
//!
//! - `spotify_remote`: Spotify Web API playback service (rspotify)
//! - `scanner`: Keyboard-wedge / paste QR scanner overlay
//! - `permissions`: Camera access decision stored on disk

mod permissions;
mod scanner;
mod spotify_remote;

use crate::model::{Permission, PermissionState, RequestId, ScanOptions, TrackUri};

pub use permissions::{StoredPermissions, PERMISSIONS_FILE};
pub use scanner::PromptScanner;
pub use spotify_remote::SpotifyRemote;

/// Remote control of a Spotify Connect device.
///
/// `connect` reports `PlaybackConnected` or `PlaybackConnectFailed`;
/// `play`, `resume` and `pause` each report one `PlaybackRequestFinished`
/// carrying the `RequestId` they were given.
#[cfg_attr(test, mockall::automock)]
pub trait PlaybackService {
    fn connect(&mut self);
    fn play(&mut self, request: RequestId, uri: &TrackUri);
    fn resume(&mut self, request: RequestId);
    fn pause(&mut self, request: RequestId);
    fn disconnect(&mut self);
}

/// Opens the scanner; reports one `ScanResult` (payload or cancellation).
#[cfg_attr(test, mockall::automock)]
pub trait ScannerService {
    fn start_scan(&mut self, options: &ScanOptions);
}

/// `request` reports one `PermissionResult`.
#[cfg_attr(test, mockall::automock)]
pub trait PermissionService {
    fn check(&self, permission: Permission) -> PermissionState;
    fn request(&mut self, permission: Permission);
}
