//! Model module - Application state and data types
//!
//! - `track_uri`: Scanned payload normalization into canonical track URIs
//! - `types`: Playback, connection, permission and scan state enums
//! - `ui`: Shell-side UI state (overlays, notices)

mod track_uri;
mod types;
mod ui;

pub use track_uri::{normalize, NormalizationError, TrackUri};

pub use types::{
    BarcodeFormat, ConnectionState, Permission, PermissionState, PlaybackState, RequestId,
    ScanOptions, ScanState,
};

pub use ui::{Overlay, UiState};
