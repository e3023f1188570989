//! Tag Manager REST client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::credentials::CredentialProvider;
use crate::error::{GtmError, RemoteFault};
use crate::resource::{RevertTagResponse, Tag, TagListPage, TagPath, WorkspacePath};
use crate::store::TagStore;

/// [`TagStore`] backed by the Tag Manager v2 REST API
pub struct HttpTagStore {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpTagStore {
    pub fn new(
        base_url: impl Into<String>,
        timeout_secs: u64,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, GtmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, GtmError> {
        let token = self.credentials.access_token().await?;
        debug!("{} {}", method, path);
        Ok(self.client.request(method, self.url(path)).bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GtmError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let fault = RemoteFault::from_response(
            status.as_u16(),
            &body,
            status.canonical_reason().unwrap_or("request failed"),
        );
        debug!("Remote fault {}: {:?}", fault.code, fault.messages);
        Err(GtmError::Remote(fault))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GtmError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl TagStore for HttpTagStore {
    async fn list(
        &self,
        parent: &WorkspacePath,
        page_token: Option<&str>,
    ) -> Result<TagListPage, GtmError> {
        let mut request = self.request(Method::GET, &format!("{}/tags", parent)).await?;
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        self.send_json(request).await
    }

    async fn get(&self, path: &TagPath) -> Result<Tag, GtmError> {
        let request = self.request(Method::GET, &path.to_string()).await?;
        self.send_json(request).await
    }

    async fn create(&self, parent: &WorkspacePath, tag: &Tag) -> Result<Tag, GtmError> {
        let request = self
            .request(Method::POST, &format!("{}/tags", parent))
            .await?
            .json(tag);
        self.send_json(request).await
    }

    async fn update(&self, path: &TagPath, tag: &Tag, fingerprint: &str) -> Result<Tag, GtmError> {
        let request = self
            .request(Method::PUT, &path.to_string())
            .await?
            .query(&[("fingerprint", fingerprint)])
            .json(tag);
        self.send_json(request).await
    }

    async fn delete(&self, path: &TagPath) -> Result<(), GtmError> {
        let request = self.request(Method::DELETE, &path.to_string()).await?;
        self.send(request).await?;
        Ok(())
    }

    async fn revert(&self, path: &TagPath, fingerprint: &str) -> Result<RevertTagResponse, GtmError> {
        let request = self
            .request(Method::POST, &format!("{}:revert", path))
            .await?
            .query(&[("fingerprint", fingerprint)]);
        self.send_json(request).await
    }
}
