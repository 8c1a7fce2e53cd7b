//! Spotify Web API playback service

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rspotify::{
    model::{PlayableId, TrackId},
    prelude::*,
    AuthCodeSpotify, Config, Token,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::auth;
use crate::config::AppConfig;
use crate::controller::AppEvent;
use crate::log_api_result;
use crate::model::{RequestId, TrackUri};

use super::PlaybackService;

/// Authorized Web API client plus the device it should target.
///
/// rspotify's own refreshing is off because the refresh token lives in the
/// librespot-oauth cache; `refresh_token_if_needed` runs before each request.
#[derive(Clone)]
struct RemoteSession {
    client: Arc<AuthCodeSpotify>,
    config: AppConfig,
}

impl RemoteSession {
    async fn open(config: AppConfig) -> Result<Self> {
        let token = auth::authorize(&config).await?;

        let client = AuthCodeSpotify::with_config(
            Default::default(),
            Default::default(),
            Config {
                token_cached: false,
                token_refreshing: false,
                ..Default::default()
            },
        );
        let session = Self {
            client: Arc::new(client),
            config,
        };
        session.set_token(token).await?;

        let user = session.client.me().await.context("fetching current user")?;
        tracing::info!(user_id = %user.id, "rspotify authorized successfully");

        Ok(session)
    }

    async fn set_token(&self, token: Token) -> Result<()> {
        *self
            .client
            .token
            .lock()
            .await
            .map_err(|_| anyhow!("rspotify token lock poisoned"))? = Some(token);
        Ok(())
    }

    async fn refresh_token_if_needed(&self) -> Result<()> {
        let expires_at = self
            .client
            .token
            .lock()
            .await
            .map_err(|_| anyhow!("rspotify token lock poisoned"))?
            .as_ref()
            .and_then(|token| token.expires_at);
        if !auth::token_needs_refresh(expires_at, Utc::now()) {
            return Ok(());
        }

        tracing::info!(expires_at = ?expires_at, "Token expiring soon, refreshing...");
        let token = auth::refresh_access_token(&self.config).await?;
        self.set_token(token).await?;
        tracing::info!("Token refreshed successfully");
        Ok(())
    }

    async fn device_id(&self) -> Option<String> {
        let devices = match self.client.device().await {
            Ok(devices) => devices,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to get devices list");
                return None;
            }
        };

        if let Some(name) = &self.config.device_name {
            if let Some(device) = devices.iter().find(|d| &d.name == name) {
                tracing::debug!(device_name = %device.name, device_id = ?device.id, "Using configured device");
                return device.id.clone();
            }
            tracing::warn!(device_name = %name, "Configured device not available");
        }

        if let Some(device) = devices.iter().find(|d| d.is_active) {
            tracing::debug!(device_name = %device.name, device_id = ?device.id, "Found active device");
            return device.id.clone();
        }

        tracing::debug!(available_devices = devices.len(), "No active device, using first available");
        devices.into_iter().next().and_then(|d| d.id)
    }

    async fn play(&self, uri: &TrackUri) -> Result<()> {
        self.refresh_token_if_needed().await?;
        let device_id = self.device_id().await;
        tracing::debug!(uri = %uri, device_id = ?device_id, "API: start_uris_playback");
        let track_id = TrackId::from_id(uri.id())?;
        self.client
            .start_uris_playback([PlayableId::Track(track_id)], device_id.as_deref(), None, None)
            .await?;
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        self.refresh_token_if_needed().await?;
        let device_id = self.device_id().await;
        tracing::debug!(device_id = ?device_id, "API: resume_playback");
        self.client.resume_playback(device_id.as_deref(), None).await?;
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.refresh_token_if_needed().await?;
        let device_id = self.device_id().await;
        tracing::debug!(device_id = ?device_id, "API: pause_playback");
        self.client.pause_playback(device_id.as_deref()).await?;
        Ok(())
    }
}

/// Playback service backed by rspotify.
///
/// Each call spawns a task and reports back over the event channel. A
/// generation counter makes connections that finish after `disconnect`
/// (or after a newer `connect`) disappear silently.
pub struct SpotifyRemote {
    config: AppConfig,
    events: UnboundedSender<AppEvent>,
    session: Arc<Mutex<Option<RemoteSession>>>,
    generation: Arc<AtomicU64>,
}

impl SpotifyRemote {
    pub fn new(config: AppConfig, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            config,
            events,
            session: Arc::new(Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    fn spawn_request<F, Fut>(&self, operation: &'static str, id: RequestId, request: F)
    where
        F: FnOnce(RemoteSession) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let current = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let result = match current {
                Some(session) => request(session).await,
                None => Err(anyhow!("no Spotify session")),
            };
            log_api_result!(operation, result);

            let finished = AppEvent::PlaybackRequestFinished {
                request: id,
                result: result.map_err(|e| format!("{e:#}")),
            };
            if events.send(finished).is_err() {
                tracing::debug!(operation, ?id, "Event loop gone, dropping request result");
            }
        });
    }
}

impl PlaybackService for SpotifyRemote {
    fn connect(&mut self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let config = self.config.clone();
        let session = self.session.clone();
        let current_generation = self.generation.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let opened = RemoteSession::open(config).await;
            log_api_result!("connect", opened);

            let event = {
                let mut slot = session.lock().unwrap_or_else(PoisonError::into_inner);
                if current_generation.load(Ordering::SeqCst) != generation {
                    tracing::debug!(generation, "Discarding superseded connection attempt");
                    return;
                }
                match opened {
                    Ok(opened) => {
                        *slot = Some(opened);
                        AppEvent::PlaybackConnected
                    }
                    Err(e) => AppEvent::PlaybackConnectFailed(format!("{e:#}")),
                }
            };

            if events.send(event).is_err() {
                tracing::debug!("Event loop gone, dropping connection result");
            }
        });
    }

    fn play(&mut self, request: RequestId, uri: &TrackUri) {
        let uri = uri.clone();
        self.spawn_request("play", request, move |session| async move { session.play(&uri).await });
    }

    fn resume(&mut self, request: RequestId) {
        self.spawn_request("resume", request, |session| async move { session.resume().await });
    }

    fn pause(&mut self, request: RequestId) {
        self.spawn_request("pause", request, |session| async move { session.pause().await });
    }

    fn disconnect(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let released = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        tracing::debug!(had_session = released.is_some(), "Spotify session released");
    }
}
