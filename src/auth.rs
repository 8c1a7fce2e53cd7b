use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use librespot_oauth::{OAuthClient, OAuthClientBuilder, OAuthToken};
use rspotify::Token;

use crate::config::AppConfig;

pub const SCOPES: &str = "user-read-playback-state user-modify-playback-state";

const RESPONSE: &str = r#"
<!doctype html>
<html>
<head><title>Success</title></head>
<body><h1>Authentication Successful!</h1><p>You can go back to spotify-qr.</p><script>window.close();</script></body>
</html>
"#;
const REFRESH_TOKEN_FILE: &str = "refresh_token";
/// Refresh when less than this many seconds of the access token remain.
const REFRESH_MARGIN_SECS: i64 = 300;

fn refresh_token_path(config: &AppConfig) -> PathBuf {
    config.cache_dir.join(REFRESH_TOKEN_FILE)
}

fn oauth_client(config: &AppConfig, open_browser: bool) -> Result<OAuthClient> {
    let mut builder = OAuthClientBuilder::new(
        &config.client_id,
        &config.redirect_uri,
        SCOPES.split_whitespace().collect(),
    );
    if open_browser {
        builder = builder.open_in_browser().with_custom_message(RESPONSE);
    }
    Ok(builder.build()?)
}

fn store_refresh_token(config: &AppConfig, token: &OAuthToken) {
    let path = refresh_token_path(config);
    let result = fs::create_dir_all(&config.cache_dir).and_then(|_| fs::write(&path, &token.refresh_token));
    match result {
        Ok(()) => tracing::debug!(path = %path.display(), "Saved refresh token to disk"),
        Err(e) => tracing::warn!(error = %e, "Could not save refresh token"),
    }
}

async fn perform_browser_auth(config: &AppConfig) -> Result<OAuthToken> {
    tracing::info!("Starting browser-based OAuth flow");
    let token = oauth_client(config, true)?
        .get_access_token_async()
        .await
        .context("browser authorization failed")?;
    store_refresh_token(config, &token);
    tracing::info!("Browser authentication completed successfully");
    Ok(token)
}

/// Run the browser flow up front when no refresh token is cached, so later
/// reconnects can stay silent.
pub async fn ensure_authorized(config: &AppConfig) -> Result<()> {
    if refresh_token_path(config).exists() {
        tracing::debug!("Cached refresh token found");
        return Ok(());
    }
    perform_browser_auth(config).await.map(|_| ())
}

fn stored_refresh_token(config: &AppConfig) -> Option<String> {
    fs::read_to_string(refresh_token_path(config))
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

async fn refresh_oauth_token(config: &AppConfig, refresh_token: &str) -> Result<OAuthToken> {
    let token = oauth_client(config, false)?
        .refresh_token_async(refresh_token)
        .await
        .context("refreshing access token")?;
    store_refresh_token(config, &token);
    tracing::debug!("Token refreshed successfully");
    Ok(token)
}

/// Access token for the Web API, refreshed from the cached refresh token when
/// possible.
pub async fn authorize(config: &AppConfig) -> Result<Token> {
    let token = match stored_refresh_token(config) {
        Some(refresh_token) => match refresh_oauth_token(config, &refresh_token).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Cached refresh token failed, re-authenticating");
                perform_browser_auth(config).await?
            }
        },
        None => {
            tracing::info!("No cached refresh token, starting browser authentication");
            perform_browser_auth(config).await?
        }
    };

    Ok(to_rspotify_token(token))
}

/// New access token from the cached refresh token, without a browser fallback.
///
/// Used mid-session, while the terminal belongs to the player screen.
pub async fn refresh_access_token(config: &AppConfig) -> Result<Token> {
    let refresh_token = stored_refresh_token(config).context("no cached refresh token")?;
    let token = refresh_oauth_token(config, &refresh_token).await?;
    Ok(to_rspotify_token(token))
}

pub fn token_needs_refresh(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expires_at {
        Some(exp) => (exp - now).num_seconds() < REFRESH_MARGIN_SECS,
        None => false,
    }
}

fn to_rspotify_token(token: OAuthToken) -> Token {
    let remaining = token.expires_at.saturating_duration_since(Instant::now());
    let expires_in = chrono::Duration::from_std(remaining).unwrap_or_else(|_| chrono::Duration::zero());

    Token {
        access_token: token.access_token,
        expires_in,
        expires_at: Some(Utc::now() + expires_in),
        scopes: SCOPES
            .split_whitespace()
            .map(|s| s.to_string())
            .collect::<HashSet<String>>(),
        refresh_token: None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn token_is_refreshed_shortly_before_expiry() {
        let now = Utc::now();

        assert!(!token_needs_refresh(Some(now + Duration::minutes(30)), now));
        assert!(token_needs_refresh(Some(now + Duration::minutes(4)), now));
        assert!(token_needs_refresh(Some(now - Duration::minutes(1)), now));
        assert!(!token_needs_refresh(None, now));
    }

    #[tokio::test]
    async fn refresh_without_cached_token_fails_instead_of_opening_browser() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            client_id: "client".to_string(),
            redirect_uri: "http://127.0.0.1:8898/login".to_string(),
            device_name: None,
            follow_focus: true,
            cache_dir: dir.path().to_path_buf(),
        };

        let result = refresh_access_token(&config).await;

        assert!(result.is_err());
    }
}
