//! Tag Manager Tool Definitions
//!
//! Tools are consolidated by resource - each tool has an `action` parameter.

use serde_json::{json, Value};

use gtm_core::error::REMOVE_SESSION_DATA_TOOL;
use gtm_core::tag::TagAction;

use crate::protocol::{InputSchema, Tool};

pub const TAG_TOOL: &str = "gtm_tag";

/// Create a tool definition with the given name, description, and schema properties
fn tool(name: &str, description: &str, properties: Value, required: &[&str]) -> Tool {
    let props = properties.as_object().cloned().unwrap_or_default();
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: InputSchema::object(props, required),
    }
}

/// Schema for the partial tag payload accepted by create/update
fn tag_payload_schema() -> Value {
    let parameter = json!({
        "type": "object",
        "description": "A GTM parameter. Nested parameters go in 'list' or 'map'.",
        "properties": {
            "type": {"type": "string", "description": "Parameter type: template, integer, boolean, list, map, triggerReference, tagReference"},
            "key": {"type": "string"},
            "value": {"type": "string"},
            "list": {"type": "array", "items": {"type": "object"}},
            "map": {"type": "array", "items": {"type": "object"}},
            "isWeakReference": {"type": "boolean"}
        }
    });
    let ids = json!({"type": "array", "items": {"type": "string"}});

    json!({
        "type": "object",
        "description": "Configuration for 'create' and 'update' actions. All fields correspond to the GTM tag resource, except IDs. On update only the supplied fields change.",
        "properties": {
            "name": {"type": "string", "description": "Tag display name"},
            "type": {"type": "string", "description": "GTM tag type, e.g. 'gaawc' (GA4 Configuration), 'gaawe' (GA4 Event), 'html'. Required for create."},
            "parameter": {"type": "array", "items": parameter.clone(), "description": "The tag's parameters"},
            "firingTriggerId": ids.clone(),
            "blockingTriggerId": ids.clone(),
            "firingRuleId": ids.clone(),
            "blockingRuleId": ids,
            "liveOnly": {"type": "boolean"},
            "priority": parameter.clone(),
            "notes": {"type": "string"},
            "scheduleStartMs": {"type": "string"},
            "scheduleEndMs": {"type": "string"},
            "setupTag": {"type": "array", "items": {"type": "object", "properties": {
                "tagName": {"type": "string"},
                "stopOnSetupFailure": {"type": "boolean"}
            }}},
            "teardownTag": {"type": "array", "items": {"type": "object", "properties": {
                "tagName": {"type": "string"},
                "stopTeardownOnFailure": {"type": "boolean"}
            }}},
            "parentFolderId": {"type": "string"},
            "tagFiringOption": {"type": "string", "enum": ["tagFiringOptionUnspecified", "unlimited", "oncePerEvent", "oncePerLoad"]},
            "paused": {"type": "boolean"},
            "monitoringMetadata": parameter.clone(),
            "monitoringMetadataTagNameKey": {"type": "string"},
            "consentSettings": {"type": "object", "properties": {
                "consentStatus": {"type": "string", "enum": ["notSet", "notNeeded", "needed"]},
                "consentType": parameter
            }}
        }
    })
}

/// Get all available tools. `max_items_per_page` bounds the `list` page size.
pub fn all_tools(max_items_per_page: usize) -> Vec<Tool> {
    vec![
        tool(
            TAG_TOOL,
            &format!(
                "Performs all GTM tag operations: create, get, list, update, remove, revert. The 'list' action returns up to {} items per page. 'update' merges the supplied fields onto the current tag.",
                max_items_per_page
            ),
            json!({
                "action": {
                    "type": "string",
                    "description": "The GTM tag operation to perform. Must be one of: 'create', 'get', 'list', 'update', 'remove', 'revert'.",
                    "enum": TagAction::ALL
                },
                "accountId": {"type": "string", "description": "The unique ID of the GTM Account containing the tag."},
                "containerId": {"type": "string", "description": "The unique ID of the GTM Container containing the tag."},
                "workspaceId": {"type": "string", "description": "The unique ID of the GTM Workspace containing the tag."},
                "tagId": {"type": "string", "description": "The unique ID of the GTM tag. Required for 'get', 'update', 'remove', and 'revert' actions."},
                "createOrUpdateConfig": tag_payload_schema(),
                "fingerprint": {"type": "string", "description": "The fingerprint for optimistic concurrency control. Optional for 'update' (defaults to the current tag's fingerprint). Required for 'revert'."},
                "page": {"type": "integer", "minimum": 1, "default": 1, "description": "Page number for pagination (starts from 1). Each page contains up to itemsPerPage items."},
                "itemsPerPage": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": max_items_per_page,
                    "default": max_items_per_page,
                    "description": format!("Number of items to return per page (1-{}). Default: {}. Use lower values if experiencing response issues.", max_items_per_page, max_items_per_page)
                }
            }),
            &["action", "accountId", "containerId", "workspaceId"],
        ),
        tool(
            REMOVE_SESSION_DATA_TOOL,
            "Clears cached Google credentials for this MCP session. Use it when calls fail because the token has expired; the next call signs in again.",
            json!({}),
            &[],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtm_core::config::ITEMS_PER_PAGE;

    #[test]
    fn test_tool_names_unique() {
        let tools = all_tools(ITEMS_PER_PAGE);
        let mut names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), tools.len());
    }

    #[test]
    fn test_tag_tool_schema() {
        let tools = all_tools(ITEMS_PER_PAGE);
        let tag = tools.iter().find(|t| t.name == TAG_TOOL).unwrap();
        let props = &tag.input_schema.properties;
        assert_eq!(
            props["action"]["enum"],
            json!(["create", "get", "list", "update", "remove", "revert"])
        );
        assert_eq!(props["itemsPerPage"]["maximum"], json!(20));
        assert!(props["createOrUpdateConfig"]["properties"].get("fingerprint").is_none());
        assert!(props["createOrUpdateConfig"]["properties"].get("tagId").is_none());
        assert!(tag.input_schema.required.contains(&"workspaceId".to_string()));
    }

    #[test]
    fn test_page_size_follows_configured_max() {
        let tools = all_tools(5);
        let tag = tools.iter().find(|t| t.name == TAG_TOOL).unwrap();
        let items = &tag.input_schema.properties["itemsPerPage"];
        assert_eq!(items["maximum"], json!(5));
        assert_eq!(items["default"], json!(5));
        assert!(tag.description.contains("up to 5 items"));
    }
}
