//! Camera access decision persisted between runs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use tokio::sync::mpsc::UnboundedSender;

use crate::controller::AppEvent;
use crate::model::{Permission, PermissionState};

use super::PermissionService;

pub const PERMISSIONS_FILE: &str = "permissions.json";

/// Permission decisions stored as `{"camera": true}` in the cache directory.
///
/// `request` opens the y/n prompt; the answer is written back through
/// [`StoredPermissions::record`].
#[derive(Clone)]
pub struct StoredPermissions {
    path: PathBuf,
    events: UnboundedSender<AppEvent>,
}

impl StoredPermissions {
    pub fn new(path: PathBuf, events: UnboundedSender<AppEvent>) -> Self {
        Self { path, events }
    }

    /// Persist the user's answer and report it to the scan session.
    pub fn record(&self, permission: Permission, granted: bool) {
        if let Err(e) = self.write(permission, granted) {
            tracing::warn!(error = %e, path = %self.path.display(), "Failed to persist permission decision");
        }
        tracing::info!(?permission, granted, "Permission decision recorded");
        if self.events.send(AppEvent::PermissionResult(granted)).is_err() {
            tracing::debug!("Event loop gone, dropping permission result");
        }
    }

    fn key(permission: Permission) -> &'static str {
        match permission {
            Permission::Camera => "camera",
        }
    }

    fn load(path: &Path) -> Result<Map<String, Value>> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    fn write(&self, permission: Permission, granted: bool) -> Result<()> {
        let mut decisions = Self::load(&self.path).unwrap_or_default();
        decisions.insert(Self::key(permission).to_string(), json!(granted));

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&Value::Object(decisions))?)?;
        Ok(())
    }
}

impl PermissionService for StoredPermissions {
    fn check(&self, permission: Permission) -> PermissionState {
        let decisions = match Self::load(&self.path) {
            Ok(decisions) => decisions,
            Err(e) => {
                tracing::debug!(error = %e, "No stored permission decisions");
                return PermissionState::Unknown;
            }
        };

        match decisions.get(Self::key(permission)).and_then(Value::as_bool) {
            Some(true) => PermissionState::Granted,
            Some(false) => PermissionState::Denied,
            None => PermissionState::Unknown,
        }
    }

    fn request(&mut self, permission: Permission) {
        tracing::debug!(?permission, "Asking user for permission");
        if self.events.send(AppEvent::PermissionPrompt(permission)).is_err() {
            tracing::debug!("Event loop gone, dropping permission prompt");
        }
    }
}
