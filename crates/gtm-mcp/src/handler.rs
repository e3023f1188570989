//! Tool Handler
//!
//! Handles tool calls by dispatching to the Tag Manager operations in
//! `gtm_core`. Every failure is normalized into an error-flagged result;
//! nothing escapes a tool call as a protocol error.

use serde_json::{Map, Value};
use tracing::{info, warn};

use gtm_core::error::REMOVE_SESSION_DATA_TOOL;
use gtm_core::tag::{self, error_context, TagRequest, TagToolParams};
use gtm_core::{normalize, GtmContext, GtmError};

use crate::protocol::ToolResult;
use crate::tools::TAG_TOOL;

/// Pretty-print a successful response body
fn json_result(value: &Value) -> ToolResult {
    match serde_json::to_string_pretty(value) {
        Ok(text) => ToolResult::success(text),
        Err(e) => ToolResult::error(format!("Failed to serialize response: {}", e)),
    }
}

fn error_result(context: &str, fault: &GtmError) -> ToolResult {
    ToolResult::error(normalize(context, fault).display_text)
}

/// Handle a tool call
pub async fn handle_tool(ctx: &GtmContext, name: &str, arguments: Map<String, Value>) -> ToolResult {
    match name {
        TAG_TOOL => handle_tag(ctx, arguments).await,
        REMOVE_SESSION_DATA_TOOL => handle_remove_session_data(ctx).await,
        _ => {
            warn!("Unknown tool: {}", name);
            ToolResult::error(format!("Unknown tool: {}", name))
        }
    }
}

async fn handle_tag(ctx: &GtmContext, arguments: Map<String, Value>) -> ToolResult {
    let action = arguments
        .get("action")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();
    let context = error_context(&action);

    let params: TagToolParams = match serde_json::from_value(Value::Object(arguments)) {
        Ok(p) => p,
        Err(e) => {
            return error_result(
                &context,
                &GtmError::validation(format!("Invalid arguments: {}", e)),
            )
        }
    };

    info!("Running tool: {} with action {}", TAG_TOOL, params.action);

    let request = match TagRequest::validate(params, ctx.config.max_items_per_page) {
        Ok(r) => r,
        Err(e) => return error_result(&context, &e),
    };

    match tag::execute(ctx, request).await {
        Ok(value) => json_result(&value),
        Err(e) => error_result(&context, &e),
    }
}

async fn handle_remove_session_data(ctx: &GtmContext) -> ToolResult {
    if ctx.credentials.clear().await {
        info!("Cleared cached credentials");
        ToolResult::success("Session data removed. The next Tag Manager call will acquire a fresh access token.")
    } else {
        ToolResult::success("No cached session data to remove. If requests still fail with 401, refresh the configured access token.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gtm_core::credentials::CredentialProvider;
    use gtm_core::resource::{RevertTagResponse, Tag, TagListPage, TagPath, WorkspacePath};
    use gtm_core::{Config, RemoteFault, TagStore};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Store that fails every call with a fixed status
    struct FailingStore {
        code: u16,
        calls: AtomicUsize,
    }

    impl FailingStore {
        fn fail(&self) -> GtmError {
            self.calls.fetch_add(1, Ordering::SeqCst);
            GtmError::Remote(RemoteFault {
                code: self.code,
                messages: vec!["forbidden".to_string()],
            })
        }
    }

    #[async_trait]
    impl TagStore for FailingStore {
        async fn list(&self, _: &WorkspacePath, _: Option<&str>) -> Result<TagListPage, GtmError> {
            Err(self.fail())
        }
        async fn get(&self, _: &TagPath) -> Result<Tag, GtmError> {
            Err(self.fail())
        }
        async fn create(&self, _: &WorkspacePath, _: &Tag) -> Result<Tag, GtmError> {
            Err(self.fail())
        }
        async fn update(&self, _: &TagPath, _: &Tag, _: &str) -> Result<Tag, GtmError> {
            Err(self.fail())
        }
        async fn delete(&self, _: &TagPath) -> Result<(), GtmError> {
            Err(self.fail())
        }
        async fn revert(&self, _: &TagPath, _: &str) -> Result<RevertTagResponse, GtmError> {
            Err(self.fail())
        }
    }

    struct CountingCredentials {
        cleared: AtomicUsize,
    }

    #[async_trait]
    impl CredentialProvider for CountingCredentials {
        async fn access_token(&self) -> Result<String, GtmError> {
            Ok("t".to_string())
        }
        async fn clear(&self) -> bool {
            self.cleared.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    fn setup(code: u16) -> (GtmContext, Arc<FailingStore>, Arc<CountingCredentials>) {
        let store = Arc::new(FailingStore {
            code,
            calls: AtomicUsize::new(0),
        });
        let credentials = Arc::new(CountingCredentials {
            cleared: AtomicUsize::new(0),
        });
        let ctx = GtmContext::new(Config::default(), credentials.clone(), store.clone());
        (ctx, store, credentials)
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_remote_fault_is_normalized() {
        let (ctx, _, _) = setup(403);
        let result = handle_tool(
            &ctx,
            TAG_TOOL,
            args(json!({"action": "get", "accountId": "1", "containerId": "2", "workspaceId": "3", "tagId": "4"})),
        )
        .await;
        assert!(result.is_error);
        assert_eq!(
            result.text(),
            "Error performing get on GTM tag: Google API Error 403 - forbidden"
        );
    }

    #[tokio::test]
    async fn test_unauthorized_suggests_session_reset() {
        let (ctx, _, _) = setup(401);
        let result = handle_tool(
            &ctx,
            TAG_TOOL,
            args(json!({"action": "list", "accountId": "1", "containerId": "2", "workspaceId": "3"})),
        )
        .await;
        assert!(result.is_error);
        assert!(result.text().contains(REMOVE_SESSION_DATA_TOOL));
    }

    #[tokio::test]
    async fn test_validation_happens_before_io() {
        let (ctx, store, _) = setup(500);
        let result = handle_tool(
            &ctx,
            TAG_TOOL,
            args(json!({"action": "update", "accountId": "1", "containerId": "2", "workspaceId": "3", "tagId": "4"})),
        )
        .await;
        assert!(result.is_error);
        assert_eq!(
            result.text(),
            "Error performing update on GTM tag: createOrUpdateConfig is required for update action"
        );
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bad_action_is_reported() {
        let (ctx, _, _) = setup(500);
        let result = handle_tool(&ctx, TAG_TOOL, args(json!({"action": "publish"}))).await;
        assert!(result.is_error);
        assert!(result.text().starts_with("Error performing publish on GTM tag: Invalid arguments"));
    }

    #[tokio::test]
    async fn test_remove_session_data_clears_credentials() {
        let (ctx, _, credentials) = setup(500);
        let result = handle_tool(&ctx, REMOVE_SESSION_DATA_TOOL, Map::new()).await;
        assert!(!result.is_error);
        assert_eq!(credentials.cleared.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (ctx, _, _) = setup(500);
        let result = handle_tool(&ctx, "gtm_nope", Map::new()).await;
        assert_eq!(result, ToolResult::error("Unknown tool: gtm_nope"));
    }
}
