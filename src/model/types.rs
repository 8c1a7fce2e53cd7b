//! Core state types shared by the controllers and the view

use super::track_uri::TrackUri;

/// What the playback service was last asked to do.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    PendingTrack(TrackUri),
    Playing(TrackUri),
    Paused(TrackUri),
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing(_))
    }
}

/// Tags a play/resume/pause request so its completion can be matched to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed(String),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn label(&self) -> String {
        match self {
            ConnectionState::Disconnected => "Disconnected".to_string(),
            ConnectionState::Connecting => "Connecting...".to_string(),
            ConnectionState::Connected => "Connected".to_string(),
            ConnectionState::Failed(reason) => format!("Connection failed: {}", reason),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Permission {
    Camera,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Idle,
    AwaitingPermission,
    Scanning,
    Decoded(TrackUri),
    ScanFailed,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarcodeFormat {
    QrCode,
}

/// How the scanner should be opened
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanOptions {
    pub formats: Vec<BarcodeFormat>,
    pub camera_id: u32,
    pub prompt: String,
    pub beep: bool,
    pub save_barcode_image: bool,
    pub orientation_locked: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            formats: vec![BarcodeFormat::QrCode],
            camera_id: 0,
            prompt: "Scan a QR Code".to_string(),
            beep: false,
            save_barcode_image: false,
            orientation_locked: true,
        }
    }
}
