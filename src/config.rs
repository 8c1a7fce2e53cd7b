//! Runtime configuration from the environment (and an optional `.env` file)

use std::path::PathBuf;

use anyhow::{bail, Result};

const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8898/login";
const DEFAULT_CACHE_DIR: &str = ".cache";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub client_id: String,
    pub redirect_uri: String,
    /// Preferred Spotify Connect device; falls back to the active device.
    pub device_name: Option<String>,
    /// Connect on terminal focus gained, disconnect on focus lost.
    pub follow_focus: bool,
    pub cache_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "Failed to load .env file"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let Some(client_id) = non_empty("SPOTIFY_CLIENT_ID") else {
            bail!("SPOTIFY_CLIENT_ID is not set; register an app at developer.spotify.com and export its client id");
        };

        let follow_focus = match non_empty("SPOTIFY_QR_FOLLOW_FOCUS") {
            None => true,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => bail!("SPOTIFY_QR_FOLLOW_FOCUS must be true or false, got {raw:?}"),
            },
        };

        Ok(Self {
            client_id,
            redirect_uri: non_empty("SPOTIFY_REDIRECT_URI").unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            device_name: non_empty("SPOTIFY_QR_DEVICE"),
            follow_focus,
            cache_dir: non_empty("SPOTIFY_QR_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_client_id_is_set() {
        let config = config_from(&[("SPOTIFY_CLIENT_ID", "abc123")]).unwrap();

        assert_eq!(config.client_id, "abc123");
        assert_eq!(config.redirect_uri, DEFAULT_REDIRECT_URI);
        assert_eq!(config.device_name, None);
        assert!(config.follow_focus);
        assert_eq!(config.cache_dir, PathBuf::from(".cache"));
    }

    #[test]
    fn missing_or_blank_client_id_is_an_error() {
        assert!(config_from(&[]).is_err());
        assert!(config_from(&[("SPOTIFY_CLIENT_ID", "  ")]).is_err());
    }

    #[test]
    fn overrides_are_read() {
        let config = config_from(&[
            ("SPOTIFY_CLIENT_ID", "abc123"),
            ("SPOTIFY_REDIRECT_URI", "http://localhost:3000"),
            ("SPOTIFY_QR_DEVICE", "Kitchen"),
            ("SPOTIFY_QR_FOLLOW_FOCUS", "off"),
            ("SPOTIFY_QR_CACHE_DIR", "/tmp/qr"),
        ])
        .unwrap();

        assert_eq!(config.redirect_uri, "http://localhost:3000");
        assert_eq!(config.device_name.as_deref(), Some("Kitchen"));
        assert!(!config.follow_focus);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/qr"));
    }

    #[test]
    fn invalid_follow_focus_is_rejected() {
        assert!(config_from(&[("SPOTIFY_CLIENT_ID", "abc"), ("SPOTIFY_QR_FOLLOW_FOCUS", "maybe")]).is_err());
    }
}
