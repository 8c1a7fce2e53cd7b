//! Scanner overlay fed by a keyboard-wedge QR reader or a paste

use tokio::sync::mpsc::UnboundedSender;

use crate::controller::AppEvent;
use crate::model::ScanOptions;

use super::ScannerService;

/// Opens the scan overlay in the terminal UI.
///
/// Hardware QR readers type the decoded payload followed by Enter, so the
/// overlay input is the decoder output. The key handler posts the
/// `ScanResult`.
pub struct PromptScanner {
    events: UnboundedSender<AppEvent>,
}

impl PromptScanner {
    pub fn new(events: UnboundedSender<AppEvent>) -> Self {
        Self { events }
    }
}

impl ScannerService for PromptScanner {
    fn start_scan(&mut self, options: &ScanOptions) {
        tracing::debug!(
            formats = ?options.formats,
            camera_id = options.camera_id,
            beep = options.beep,
            save_barcode_image = options.save_barcode_image,
            orientation_locked = options.orientation_locked,
            "Opening scanner"
        );
        if self.events.send(AppEvent::ScannerOpened(options.clone())).is_err() {
            tracing::debug!("Event loop gone, scanner not opened");
        }
    }
}
