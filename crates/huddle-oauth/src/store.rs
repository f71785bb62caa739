//! On-disk credential storage.
//!
//! The credential file is a single JSON object shared with the `huddle auth`
//! bootstrap command. Writes go to a temporary file in the same directory
//! and are renamed over the target, so readers never see a partial document.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{OAuthError, Result};

/// Consumer credentials and token state persisted between requests.
///
/// Unknown keys found in the file are kept in `extra` and written back
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Issue time of the access token, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_time: Option<f64>,
    /// Access token lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Upstream subject identifier (`xoauth_yahoo_guid`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Client state token supplied with the last code exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CredentialRecord {
    /// Record holding only consumer credentials, as seeded by the bootstrap flow.
    pub fn with_consumer(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            consumer_key: Some(key.into()),
            consumer_secret: Some(secret.into()),
            ..Default::default()
        }
    }
}

/// File-backed credential store.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the credential file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the credential file. A missing file yields an empty record.
    pub fn load(&self) -> Result<CredentialRecord> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CredentialRecord::default());
            }
            Err(e) => {
                return Err(OAuthError::Config(format!(
                    "Failed to read OAuth file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        serde_json::from_str(&content).map_err(|e| {
            OAuthError::Config(format!(
                "Invalid JSON in OAuth file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Replace the credential file with `record`.
    pub fn save(&self, record: &CredentialRecord) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .map_err(|e| OAuthError::Storage(format!("Failed to create token directory: {}", e)))?;

        // Round-trip through Value so keys are written in sorted order.
        let value = serde_json::to_value(record)
            .map_err(|e| OAuthError::Storage(format!("Failed to serialize tokens: {}", e)))?;
        let mut json = serde_json::to_string_pretty(&value)
            .map_err(|e| OAuthError::Storage(format!("Failed to serialize tokens: {}", e)))?;
        json.push('\n');

        let mut tmp = tempfile::Builder::new()
            .prefix("oauth2_")
            .suffix(".json")
            .tempfile_in(&dir)
            .map_err(|e| OAuthError::Storage(format!("Failed to create temp file: {}", e)))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| OAuthError::Storage(format!("Failed to write token file: {}", e)))?;
        tmp.persist(&self.path)
            .map_err(|e| OAuthError::Storage(format!("Failed to replace token file: {}", e)))?;

        restrict_permissions(&self.path);
        tracing::debug!(path = %self.path.display(), "credential file written");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        tracing::debug!(path = %path.display(), error = %e, "could not restrict credential file permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}
