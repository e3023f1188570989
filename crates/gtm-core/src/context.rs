//! Process-wide context shared by every tool call
//!
//! Built once at startup and handed to each invocation behind an `Arc`.
//! Construction performs no I/O: missing credentials surface on first use.

use std::sync::Arc;

use crate::config::Config;
use crate::credentials::{CredentialProvider, GcloudTokenProvider, StaticTokenProvider};
use crate::error::GtmError;
use crate::http::HttpTagStore;
use crate::store::TagStore;

pub struct GtmContext {
    pub config: Config,
    pub credentials: Arc<dyn CredentialProvider>,
    pub store: Arc<dyn TagStore>,
}

impl GtmContext {
    pub fn new(
        config: Config,
        credentials: Arc<dyn CredentialProvider>,
        store: Arc<dyn TagStore>,
    ) -> Self {
        Self {
            config,
            credentials,
            store,
        }
    }

    /// Wire the HTTP store and a credential provider chosen by `config`
    pub fn from_config(config: Config) -> Result<Self, GtmError> {
        let credentials: Arc<dyn CredentialProvider> = match &config.access_token {
            Some(token) => {
                tracing::info!("Using access token from configuration");
                Arc::new(StaticTokenProvider::new(token.clone()))
            }
            None => {
                tracing::info!("Using application-default credentials via {}", config.gcloud_command);
                Arc::new(GcloudTokenProvider::new(config.gcloud_command.clone()))
            }
        };

        let store = Arc::new(HttpTagStore::new(
            config.api_base_url.clone(),
            config.request_timeout_secs,
            credentials.clone(),
        )?);

        Ok(Self::new(config, credentials, store))
    }
}
