//! OAuth credentials for Tag Manager requests

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::GtmError;

/// Scopes needed for read/write tag administration
pub const TAG_MANAGER_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/tagmanager.readonly",
    "https://www.googleapis.com/auth/tagmanager.edit.containers",
    "https://www.googleapis.com/auth/tagmanager.edit.containerversions",
    "https://www.googleapis.com/auth/tagmanager.manage.users",
    "https://www.googleapis.com/auth/tagmanager.manage.accounts",
    "https://www.googleapis.com/auth/tagmanager.publish",
];

/// gcloud tokens live for an hour; refresh before that
const TOKEN_LIFETIME_MINUTES: i64 = 50;

/// Supplies bearer tokens for API requests
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, GtmError>;

    /// Forget any cached session so the next request re-authenticates.
    /// Returns whether anything was cleared.
    async fn clear(&self) -> bool;
}

/// A fixed token from configuration
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, GtmError> {
        Ok(self.token.clone())
    }

    async fn clear(&self) -> bool {
        false
    }
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Application-default credentials minted by `gcloud`, cached until expiry
pub struct GcloudTokenProvider {
    command: String,
    scopes: Vec<String>,
    cached: Mutex<Option<CachedToken>>,
}

impl GcloudTokenProvider {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            scopes: TAG_MANAGER_SCOPES.iter().map(|s| s.to_string()).collect(),
            cached: Mutex::new(None),
        }
    }

    async fn mint(&self) -> Result<String, GtmError> {
        debug!("Required scopes: {}", self.scopes.join(", "));
        debug!(
            "GOOGLE_APPLICATION_CREDENTIALS: {}",
            if std::env::var_os("GOOGLE_APPLICATION_CREDENTIALS").is_some() { "Set" } else { "Not set" }
        );

        let output = Command::new(&self.command)
            .args(["auth", "application-default", "print-access-token"])
            .arg(format!("--scopes={}", self.scopes.join(",")))
            .output()
            .await
            .map_err(|e| {
                GtmError::Credentials(format!("Failed to run '{}': {}", self.command, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GtmError::Credentials(format!(
                "'{}' exited with {}: {}",
                self.command,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(GtmError::Credentials(format!(
                "'{}' did not return an access token",
                self.command
            )));
        }
        Ok(token)
    }
}

#[async_trait]
impl CredentialProvider for GcloudTokenProvider {
    async fn access_token(&self) -> Result<String, GtmError> {
        let mut cached = self.cached.lock().await;

        if let Some(entry) = cached.as_ref() {
            if entry.expires_at > Utc::now() {
                return Ok(entry.token.clone());
            }
            debug!("Cached access token expired");
        }

        info!("Acquiring access token from {}", self.command);
        let token = self.mint().await?;
        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at: Utc::now() + Duration::minutes(TOKEN_LIFETIME_MINUTES),
        });
        Ok(token)
    }

    async fn clear(&self) -> bool {
        self.cached.lock().await.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticTokenProvider::new("abc");
        assert_eq!(provider.access_token().await.unwrap(), "abc");
        assert!(!provider.clear().await);
    }

    #[tokio::test]
    async fn test_missing_command_is_credential_error() {
        let provider = GcloudTokenProvider::new("/definitely/not/a/gcloud");
        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, GtmError::Credentials(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_token_is_cached_until_cleared() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("gcloud");
        std::fs::write(&script, "#!/bin/sh\necho tok-$$\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let provider = GcloudTokenProvider::new(script.to_string_lossy());
        let first = provider.access_token().await.unwrap();
        assert!(first.starts_with("tok-"));
        assert_eq!(provider.access_token().await.unwrap(), first);

        assert!(provider.clear().await);
        assert!(!provider.clear().await);
        let second = provider.access_token().await.unwrap();
        assert_ne!(second, first);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_reports_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("gcloud");
        std::fs::write(&script, "#!/bin/sh\necho 'no credentials' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let provider = GcloudTokenProvider::new(script.to_string_lossy());
        match provider.access_token().await {
            Err(GtmError::Credentials(msg)) => assert!(msg.contains("no credentials")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
