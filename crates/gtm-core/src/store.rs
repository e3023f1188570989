//! Tag storage backend
//!
//! [`TagStore`] is the seam between the tool dispatcher and the Tag Manager
//! API. [`crate::http::HttpTagStore`] talks to Google; tests substitute
//! in-memory fakes.

use async_trait::async_trait;
use tracing::debug;

use crate::error::GtmError;
use crate::resource::{RevertTagResponse, Tag, TagListPage, TagPath, WorkspacePath};

#[async_trait]
pub trait TagStore: Send + Sync {
    /// Fetch one remote page. `page_token` is `None` for the first page.
    async fn list(
        &self,
        parent: &WorkspacePath,
        page_token: Option<&str>,
    ) -> Result<TagListPage, GtmError>;

    async fn get(&self, path: &TagPath) -> Result<Tag, GtmError>;

    async fn create(&self, parent: &WorkspacePath, tag: &Tag) -> Result<Tag, GtmError>;

    /// Replace the tag. The write is conditioned on `fingerprint`.
    async fn update(&self, path: &TagPath, tag: &Tag, fingerprint: &str) -> Result<Tag, GtmError>;

    async fn delete(&self, path: &TagPath) -> Result<(), GtmError>;

    /// Discard workspace changes to the tag
    async fn revert(&self, path: &TagPath, fingerprint: &str) -> Result<RevertTagResponse, GtmError>;
}

/// Follow page tokens until the listing is exhausted, keeping remote order
pub async fn list_all(store: &dyn TagStore, parent: &WorkspacePath) -> Result<Vec<Tag>, GtmError> {
    let mut all = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = store.list(parent, page_token.as_deref()).await?;
        pages += 1;
        all.extend(page.tag);

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    debug!("Fetched {} tags in {} pages from {}", all.len(), pages, parent);
    Ok(all)
}
