//! The `gtm_tag` tool: action validation and execution
//!
//! Arguments are validated into a [`TagRequest`] before any I/O happens.
//! Executing a request talks to the [`TagStore`] in the context; updates
//! fetch the current tag and reconcile the caller's partial payload onto it.

use std::fmt;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::context::GtmContext;
use crate::error::GtmError;
use crate::paginate::paginate;
use crate::reconcile::{reconcile, Versioned};
use crate::resource::{TagPath, TagPayload, WorkspacePath};
use crate::store::list_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagAction {
    Create,
    Get,
    List,
    Update,
    Remove,
    Revert,
}

impl TagAction {
    pub const ALL: [&'static str; 6] = ["create", "get", "list", "update", "remove", "revert"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TagAction::Create => "create",
            TagAction::Get => "get",
            TagAction::List => "list",
            TagAction::Update => "update",
            TagAction::Remove => "remove",
            TagAction::Revert => "revert",
        }
    }
}

impl fmt::Display for TagAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw tool arguments
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagToolParams {
    pub action: TagAction,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub container_id: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub tag_id: Option<String>,
    #[serde(default)]
    pub create_or_update_config: Option<TagPayload>,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub items_per_page: Option<i64>,
}

/// A validated tag operation
#[derive(Debug, Clone, PartialEq)]
pub enum TagRequest {
    Create {
        parent: WorkspacePath,
        payload: TagPayload,
    },
    Get {
        path: TagPath,
    },
    List {
        parent: WorkspacePath,
        page: usize,
        items_per_page: usize,
    },
    Update {
        path: TagPath,
        payload: TagPayload,
        fingerprint: Option<String>,
    },
    Remove {
        path: TagPath,
    },
    Revert {
        path: TagPath,
        fingerprint: String,
    },
}

fn required(value: Option<String>, name: &str, action: TagAction) -> Result<String, GtmError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| GtmError::validation(format!("{} is required for {} action", name, action)))
}

impl TagRequest {
    /// Check per-action requirements. Pure; runs before any remote call.
    pub fn validate(params: TagToolParams, max_items_per_page: usize) -> Result<Self, GtmError> {
        let action = params.action;
        let parent = WorkspacePath::new(
            required(params.account_id, "accountId", action)?,
            required(params.container_id, "containerId", action)?,
            required(params.workspace_id, "workspaceId", action)?,
        );
        let tag_path = |tag_id: Option<String>| -> Result<TagPath, GtmError> {
            Ok(parent.tag(required(tag_id, "tagId", action)?))
        };
        let payload = |config: Option<TagPayload>| {
            config.ok_or_else(|| {
                GtmError::validation(format!("createOrUpdateConfig is required for {} action", action))
            })
        };

        let request = match action {
            TagAction::Create => {
                let payload = payload(params.create_or_update_config)?;
                if payload.tag_type.as_deref().map_or(true, str::is_empty) {
                    return Err(GtmError::validation(format!(
                        "'type' field is required in createOrUpdateConfig for {} action. Specify the tag type (e.g., 'gaawc' for GA4 Configuration).",
                        action
                    )));
                }
                TagRequest::Create {
                    parent: parent.clone(),
                    payload,
                }
            }
            TagAction::Get => TagRequest::Get {
                path: tag_path(params.tag_id)?,
            },
            TagAction::List => {
                let page = params.page.unwrap_or(1);
                if page < 1 {
                    return Err(GtmError::validation(format!("page must be at least 1, got {}", page)));
                }
                let items_per_page = params.items_per_page.unwrap_or(max_items_per_page as i64);
                if items_per_page < 1 || items_per_page > max_items_per_page as i64 {
                    return Err(GtmError::validation(format!(
                        "itemsPerPage must be between 1 and {}, got {}",
                        max_items_per_page, items_per_page
                    )));
                }
                TagRequest::List {
                    parent: parent.clone(),
                    page: page as usize,
                    items_per_page: items_per_page as usize,
                }
            }
            TagAction::Update => TagRequest::Update {
                path: tag_path(params.tag_id)?,
                payload: payload(params.create_or_update_config)?,
                fingerprint: params.fingerprint.filter(|f| !f.is_empty()),
            },
            TagAction::Remove => TagRequest::Remove {
                path: tag_path(params.tag_id)?,
            },
            TagAction::Revert => TagRequest::Revert {
                path: tag_path(params.tag_id)?,
                fingerprint: required(params.fingerprint, "fingerprint", action)?,
            },
        };

        Ok(request)
    }

    pub fn action(&self) -> TagAction {
        match self {
            TagRequest::Create { .. } => TagAction::Create,
            TagRequest::Get { .. } => TagAction::Get,
            TagRequest::List { .. } => TagAction::List,
            TagRequest::Update { .. } => TagAction::Update,
            TagRequest::Remove { .. } => TagAction::Remove,
            TagRequest::Revert { .. } => TagAction::Revert,
        }
    }
}

/// Diagnostic prefix for failures of `action`
pub fn error_context(action: &str) -> String {
    format!("Error performing {} on GTM tag", action)
}

/// Run a validated request against the store
pub async fn execute(ctx: &GtmContext, request: TagRequest) -> Result<Value, GtmError> {
    let store = ctx.store.as_ref();

    match request {
        TagRequest::Create { parent, payload } => {
            let created = store.create(&parent, &payload.into_tag()).await?;
            Ok(serde_json::to_value(created)?)
        }
        TagRequest::Get { path } => {
            let tag = store.get(&path).await?;
            Ok(serde_json::to_value(tag)?)
        }
        TagRequest::List {
            parent,
            page,
            items_per_page,
        } => {
            let all = list_all(store, &parent).await?;
            Ok(serde_json::to_value(paginate(all, page, items_per_page))?)
        }
        TagRequest::Update {
            path,
            payload,
            fingerprint,
        } => {
            debug!("Fetching existing tag {} before update", path.tag_id);
            let existing = store.get(&path).await?;

            let merged = reconcile(&existing, &payload, fingerprint.as_deref())?;
            let fingerprint = Versioned::fingerprint(&merged).unwrap_or_default().to_string();

            info!("Updating tag {} with merged fields", path.tag_id);
            let updated = store.update(&path, &merged, &fingerprint).await?;
            Ok(serde_json::to_value(updated)?)
        }
        TagRequest::Remove { path } => {
            store.delete(&path).await?;
            Ok(json!({
                "success": true,
                "message": format!("Tag {} was successfully deleted", path.tag_id),
            }))
        }
        TagRequest::Revert { path, fingerprint } => {
            let reverted = store.revert(&path, &fingerprint).await?;
            Ok(serde_json::to_value(reverted)?)
        }
    }
}
