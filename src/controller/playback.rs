//! Playback controller: connection lifecycle and play/pause requests

use thiserror::Error;

use crate::model::{ConnectionState, PlaybackState, RequestId, TrackUri};
use crate::services::PlaybackService;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("Not connected to Spotify. Press 'c' to reconnect.")]
    NotConnected,
    #[error("Still waiting for Spotify to answer the last request.")]
    RequestInProgress,
    #[error("Nothing to play. Scan a QR code first.")]
    NothingToPlay,
    #[error("Could not connect to Spotify: {0}")]
    ConnectionFailed(String),
    #[error("Spotify rejected the request: {0}")]
    RequestFailed(String),
}

/// What the scan controller needs from playback.
#[cfg_attr(test, mockall::automock)]
pub trait PlaybackHandoff {
    fn is_playing(&self) -> bool;
    /// Pause now, or as soon as the request in flight completes.
    fn pause(&mut self) -> Result<(), PlaybackError>;
    fn set_pending_track(&mut self, uri: TrackUri);
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Request {
    Play(TrackUri),
    Resume(TrackUri),
    Pause(TrackUri),
}

impl Request {
    fn target_state(&self) -> PlaybackState {
        match self {
            Request::Play(uri) | Request::Resume(uri) => PlaybackState::Playing(uri.clone()),
            Request::Pause(uri) => PlaybackState::Paused(uri.clone()),
        }
    }
}

#[derive(Debug)]
struct InFlight {
    id: RequestId,
    request: Request,
    previous: PlaybackState,
}

pub struct PlaybackController<S: PlaybackService> {
    service: S,
    connection: ConnectionState,
    state: PlaybackState,
    in_flight: Option<InFlight>,
    pause_after_in_flight: bool,
    last_request: u64,
}

impl<S: PlaybackService> PlaybackController<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            connection: ConnectionState::Disconnected,
            state: PlaybackState::Idle,
            in_flight: None,
            pause_after_in_flight: false,
            last_request: 0,
        }
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn has_request_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn connect(&mut self) {
        match self.connection {
            ConnectionState::Connecting | ConnectionState::Connected => {
                tracing::debug!(connection = ?self.connection, "Connect requested while already connecting or connected");
            }
            ConnectionState::Disconnected | ConnectionState::Failed(_) => {
                tracing::info!("Connecting to playback service");
                self.connection = ConnectionState::Connecting;
                self.service.connect();
            }
        }
    }

    pub fn on_connected(&mut self) {
        match self.connection {
            ConnectionState::Connecting => {
                tracing::info!("Connected to playback service");
                self.connection = ConnectionState::Connected;
                self.play_pending_if_ready();
            }
            ConnectionState::Connected => {
                tracing::debug!("Duplicate connected callback ignored");
            }
            ConnectionState::Disconnected | ConnectionState::Failed(_) => {
                tracing::info!("Connection completed after the session ended, releasing it");
                self.service.disconnect();
            }
        }
    }

    pub fn on_connection_failed(&mut self, reason: String) -> Result<(), PlaybackError> {
        if self.connection != ConnectionState::Connecting {
            tracing::debug!(reason = %reason, "Stale connection failure ignored");
            return Ok(());
        }
        tracing::error!(reason = %reason, "Playback service connection failed");
        self.connection = ConnectionState::Failed(reason.clone());
        Err(PlaybackError::ConnectionFailed(reason))
    }

    pub fn disconnect(&mut self) {
        if matches!(self.connection, ConnectionState::Connected | ConnectionState::Connecting) {
            self.service.disconnect();
        }
        if let Some(in_flight) = self.in_flight.take() {
            tracing::debug!(id = ?in_flight.id, request = ?in_flight.request, "Dropping in-flight request on disconnect");
        }
        self.pause_after_in_flight = false;
        tracing::info!(state = ?self.state, "Disconnected from playback service");
        self.connection = ConnectionState::Disconnected;
    }

    pub fn set_pending_track(&mut self, uri: TrackUri) {
        tracing::info!(uri = %uri, "Track queued for playback");
        self.pause_after_in_flight = false;
        self.state = PlaybackState::PendingTrack(uri);
        self.play_pending_if_ready();
    }

    pub fn toggle_play_pause(&mut self) -> Result<(), PlaybackError> {
        if !self.connection.is_connected() {
            tracing::debug!(connection = ?self.connection, "Toggle rejected, not connected");
            return Err(PlaybackError::NotConnected);
        }
        if self.in_flight.is_some() {
            tracing::debug!("Toggle rejected, request in flight");
            return Err(PlaybackError::RequestInProgress);
        }

        let request = match self.state.clone() {
            PlaybackState::Playing(uri) => Request::Pause(uri),
            PlaybackState::Paused(uri) => Request::Resume(uri),
            PlaybackState::PendingTrack(uri) => Request::Play(uri),
            PlaybackState::Idle => return Err(PlaybackError::NothingToPlay),
        };
        self.issue(request);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        if !self.connection.is_connected() {
            return Err(PlaybackError::NotConnected);
        }
        if let Some(in_flight) = &self.in_flight {
            if in_flight.request.target_state().is_playing() {
                tracing::debug!(id = ?in_flight.id, "Pause deferred until the in-flight request completes");
                self.pause_after_in_flight = true;
            }
            return Ok(());
        }
        if let PlaybackState::Playing(uri) = self.state.clone() {
            self.issue(Request::Pause(uri));
        }
        Ok(())
    }

    /// Completion of the request issued by `play`, `resume` or `pause`.
    ///
    /// Completions for any other id (dropped on disconnect, or never issued)
    /// are ignored.
    pub fn on_request_complete(
        &mut self,
        id: RequestId,
        result: Result<(), String>,
    ) -> Result<(), PlaybackError> {
        let in_flight = match self.in_flight.take() {
            Some(in_flight) if in_flight.id == id => in_flight,
            other => {
                tracing::debug!(?id, in_flight = ?other.as_ref().map(|f| f.id), "Stale request completion ignored");
                self.in_flight = other;
                return Ok(());
            }
        };

        if let Err(reason) = result {
            tracing::error!(?id, request = ?in_flight.request, reason = %reason, "Playback request failed");
            if self.state == in_flight.request.target_state() {
                // Rolled back tracks wait for the user instead of being retried.
                self.state = in_flight.previous;
                self.pause_after_in_flight = false;
            } else {
                self.issue_next();
            }
            return Err(PlaybackError::RequestFailed(reason));
        }

        tracing::debug!(?id, request = ?in_flight.request, "Playback request succeeded");
        self.issue_next();
        Ok(())
    }

    fn issue_next(&mut self) {
        if std::mem::take(&mut self.pause_after_in_flight) {
            if let PlaybackState::Playing(uri) = self.state.clone() {
                self.issue(Request::Pause(uri));
                return;
            }
        }
        self.play_pending_if_ready();
    }

    fn play_pending_if_ready(&mut self) {
        if !self.connection.is_connected() || self.in_flight.is_some() {
            return;
        }
        if let PlaybackState::PendingTrack(uri) = self.state.clone() {
            self.issue(Request::Play(uri));
        }
    }

    fn issue(&mut self, request: Request) {
        self.last_request += 1;
        let id = RequestId(self.last_request);
        match &request {
            Request::Play(uri) => self.service.play(id, uri),
            Request::Resume(_) => self.service.resume(id),
            Request::Pause(_) => self.service.pause(id),
        }
        let previous = std::mem::replace(&mut self.state, request.target_state());
        tracing::info!(?id, request = ?request, "Playback request issued");
        self.in_flight = Some(InFlight { id, request, previous });
    }
}

impl<S: PlaybackService> PlaybackHandoff for PlaybackController<S> {
    fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        PlaybackController::pause(self)
    }

    fn set_pending_track(&mut self, uri: TrackUri) {
        PlaybackController::set_pending_track(self, uri)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::{always, eq};

    use super::*;
    use crate::services::MockPlaybackService;

    fn uri(id: &str) -> TrackUri {
        TrackUri::from_id(id).unwrap()
    }

    fn connected_controller() -> PlaybackController<MockPlaybackService> {
        let mut service = MockPlaybackService::new();
        service.expect_connect().times(1).return_const(());
        let mut controller = PlaybackController::new(service);
        controller.connect();
        controller.on_connected();
        controller.service.checkpoint();
        controller
    }

    #[test]
    fn connect_with_pending_track_auto_plays_exactly_once() {
        let mut service = MockPlaybackService::new();
        service.expect_connect().times(1).return_const(());
        service
            .expect_play()
            .withf(|id, uri| *id == RequestId(1) && uri.as_str() == "spotify:track:abc")
            .times(1)
            .return_const(());
        let mut controller = PlaybackController::new(service);

        controller.set_pending_track(uri("abc"));
        assert_eq!(controller.state(), &PlaybackState::PendingTrack(uri("abc")));

        controller.connect();
        assert_eq!(controller.connection(), &ConnectionState::Connecting);
        controller.connect();

        controller.on_connected();
        controller.on_connected();

        assert_eq!(controller.connection(), &ConnectionState::Connected);
        assert_eq!(controller.state(), &PlaybackState::Playing(uri("abc")));
        assert!(controller.has_request_in_flight());
    }

    #[test]
    fn toggle_while_disconnected_is_rejected() {
        let mut controller = PlaybackController::new(MockPlaybackService::new());
        controller.set_pending_track(uri("abc"));

        assert_eq!(controller.toggle_play_pause(), Err(PlaybackError::NotConnected));
        assert_eq!(controller.state(), &PlaybackState::PendingTrack(uri("abc")));
    }

    #[test]
    fn toggle_with_nothing_queued() {
        let mut controller = connected_controller();
        assert_eq!(controller.toggle_play_pause(), Err(PlaybackError::NothingToPlay));
    }

    #[test]
    fn toggle_cycles_play_pause_resume() {
        let mut controller = connected_controller();
        controller.service.expect_play().times(1).return_const(());
        controller.set_pending_track(uri("abc"));
        assert_eq!(controller.on_request_complete(RequestId(1), Ok(())), Ok(()));

        controller.service.expect_pause().with(eq(RequestId(2))).times(1).return_const(());
        controller.toggle_play_pause().unwrap();
        assert_eq!(controller.state(), &PlaybackState::Paused(uri("abc")));
        controller.on_request_complete(RequestId(2), Ok(())).unwrap();

        controller.service.expect_resume().with(eq(RequestId(3))).times(1).return_const(());
        controller.toggle_play_pause().unwrap();
        assert_eq!(controller.state(), &PlaybackState::Playing(uri("abc")));
    }

    #[test]
    fn second_toggle_while_one_is_outstanding_is_rejected() {
        let mut controller = connected_controller();
        controller.service.expect_play().times(1).return_const(());
        controller.set_pending_track(uri("abc"));

        assert_eq!(controller.toggle_play_pause(), Err(PlaybackError::RequestInProgress));
        assert_eq!(controller.state(), &PlaybackState::Playing(uri("abc")));
    }

    #[test]
    fn pause_during_play_request_is_issued_after_it_completes() {
        let mut controller = connected_controller();
        controller.service.expect_play().times(1).return_const(());
        controller.set_pending_track(uri("abc"));

        assert_eq!(controller.pause(), Ok(()));
        assert_eq!(controller.pause(), Ok(()));
        controller.service.checkpoint();

        controller.service.expect_pause().with(eq(RequestId(2))).times(1).return_const(());
        controller.on_request_complete(RequestId(1), Ok(())).unwrap();

        assert_eq!(controller.state(), &PlaybackState::Paused(uri("abc")));
        assert!(controller.has_request_in_flight());
    }

    #[test]
    fn deferred_pause_is_dropped_when_play_fails() {
        let mut controller = connected_controller();
        controller.service.expect_play().times(1).return_const(());
        controller.set_pending_track(uri("abc"));
        controller.pause().unwrap();

        let result = controller.on_request_complete(RequestId(1), Err("no active device".to_string()));

        assert_eq!(result, Err(PlaybackError::RequestFailed("no active device".to_string())));
        assert_eq!(controller.state(), &PlaybackState::PendingTrack(uri("abc")));
        assert!(!controller.has_request_in_flight());
    }

    #[test]
    fn new_track_overrides_a_deferred_pause() {
        let mut controller = connected_controller();
        controller.service.expect_play().times(1).return_const(());
        controller.set_pending_track(uri("first"));
        controller.pause().unwrap();
        controller.set_pending_track(uri("second"));
        controller.service.checkpoint();

        controller
            .service
            .expect_play()
            .withf(|id, uri| *id == RequestId(2) && uri.id() == "second")
            .times(1)
            .return_const(());
        controller.on_request_complete(RequestId(1), Ok(())).unwrap();

        assert_eq!(controller.state(), &PlaybackState::Playing(uri("second")));
    }

    #[test]
    fn failed_request_rolls_back_without_retrying() {
        let mut controller = connected_controller();
        controller.service.expect_play().times(1).return_const(());
        controller.set_pending_track(uri("abc"));

        let result = controller.on_request_complete(RequestId(1), Err("Premium required".to_string()));

        assert_eq!(result, Err(PlaybackError::RequestFailed("Premium required".to_string())));
        assert_eq!(controller.state(), &PlaybackState::PendingTrack(uri("abc")));
        assert!(!controller.has_request_in_flight());
    }

    #[test]
    fn track_queued_during_a_request_plays_after_it_completes() {
        let mut controller = connected_controller();
        controller.service.expect_play().times(1).return_const(());
        controller.set_pending_track(uri("first"));
        controller.on_request_complete(RequestId(1), Ok(())).unwrap();

        controller.service.expect_pause().times(1).return_const(());
        controller.pause().unwrap();
        controller.service.checkpoint();

        controller.set_pending_track(uri("second"));
        assert_eq!(controller.state(), &PlaybackState::PendingTrack(uri("second")));

        controller
            .service
            .expect_play()
            .withf(|_, uri| uri.id() == "second")
            .times(1)
            .return_const(());
        controller.on_request_complete(RequestId(2), Ok(())).unwrap();
        assert_eq!(controller.state(), &PlaybackState::Playing(uri("second")));
    }

    #[test]
    fn pause_is_a_no_op_unless_playing() {
        let mut controller = connected_controller();
        assert_eq!(controller.pause(), Ok(()));
        assert!(!controller.has_request_in_flight());
    }

    #[test]
    fn connection_failure_is_reported_and_retry_is_explicit() {
        let mut service = MockPlaybackService::new();
        service.expect_connect().times(2).return_const(());
        let mut controller = PlaybackController::new(service);

        controller.connect();
        let result = controller.on_connection_failed("app not installed".to_string());

        assert_eq!(result, Err(PlaybackError::ConnectionFailed("app not installed".to_string())));
        assert_eq!(controller.connection(), &ConnectionState::Failed("app not installed".to_string()));

        controller.connect();
        assert_eq!(controller.connection(), &ConnectionState::Connecting);
    }

    #[test]
    fn late_connection_after_disconnect_is_released() {
        let mut service = MockPlaybackService::new();
        service.expect_connect().times(1).return_const(());
        service.expect_disconnect().times(2).return_const(());
        let mut controller = PlaybackController::new(service);
        controller.set_pending_track(uri("abc"));

        controller.connect();
        controller.disconnect();
        controller.on_connected();

        assert_eq!(controller.connection(), &ConnectionState::Disconnected);
        assert_eq!(controller.state(), &PlaybackState::PendingTrack(uri("abc")));
    }

    #[test]
    fn disconnect_keeps_state_and_stops_issuing_requests() {
        let mut controller = connected_controller();
        controller.service.expect_play().with(always(), always()).times(1).return_const(());
        controller.set_pending_track(uri("abc"));
        controller.on_request_complete(RequestId(1), Ok(())).unwrap();

        controller.service.expect_disconnect().times(1).return_const(());
        controller.disconnect();
        controller.disconnect();

        assert_eq!(controller.state(), &PlaybackState::Playing(uri("abc")));
        controller.set_pending_track(uri("next"));
        assert_eq!(controller.state(), &PlaybackState::PendingTrack(uri("next")));
        assert_eq!(controller.toggle_play_pause(), Err(PlaybackError::NotConnected));
    }

    #[test]
    fn stale_completion_after_disconnect_is_ignored() {
        let mut controller = connected_controller();
        controller.service.expect_play().times(1).return_const(());
        controller.service.expect_disconnect().times(1).return_const(());
        controller.set_pending_track(uri("abc"));
        controller.disconnect();

        assert_eq!(controller.on_request_complete(RequestId(1), Err("timeout".to_string())), Ok(()));
        assert_eq!(controller.state(), &PlaybackState::Playing(uri("abc")));
    }

    #[test]
    fn completion_from_before_a_reconnect_is_not_credited_to_the_new_request() {
        let mut controller = connected_controller();
        controller.service.expect_play().times(1).return_const(());
        controller.service.expect_disconnect().times(1).return_const(());
        controller.service.expect_connect().times(1).return_const(());
        controller.service.expect_pause().with(eq(RequestId(2))).times(1).return_const(());

        controller.set_pending_track(uri("abc"));
        controller.disconnect();
        controller.connect();
        controller.on_connected();
        controller.toggle_play_pause().unwrap();
        assert_eq!(controller.state(), &PlaybackState::Paused(uri("abc")));

        assert_eq!(controller.on_request_complete(RequestId(1), Err("timeout".to_string())), Ok(()));
        assert_eq!(controller.state(), &PlaybackState::Paused(uri("abc")));
        assert!(controller.has_request_in_flight());

        assert_eq!(controller.on_request_complete(RequestId(2), Ok(())), Ok(()));
        assert_eq!(controller.state(), &PlaybackState::Paused(uri("abc")));
        assert!(!controller.has_request_in_flight());
    }
}
