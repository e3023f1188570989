//! Tag Manager resource model
//!
//! Typed mirrors of the GTM v2 tag resource. Every field is optional because
//! the remote API omits unset fields, and partial payloads omit most of them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A GTM parameter. Parameters nest through `list` and `map`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<Parameter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<Vec<Parameter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_weak_reference: Option<bool>,
}

impl Parameter {
    /// A `template` parameter with the given key and value
    pub fn template(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            param_type: Some("template".to_string()),
            key: Some(key.into()),
            value: Some(value.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupTag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_on_setup_failure: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeardownTag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_teardown_on_failure: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagConsentSetting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent_type: Option<Parameter>,
}

/// A full tag as stored by Tag Manager.
///
/// Fields the model does not know about are kept in `extra` and written back
/// untouched, so a fetch/merge/write cycle never loses server data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub tag_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firing_rule_id: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_rule_id: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_start_ms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_end_ms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<Vec<Parameter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firing_trigger_id: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_trigger_id: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_tag: Option<Vec<SetupTag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teardown_tag: Option<Vec<TeardownTag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_folder_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_firing_option: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_manager_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitoring_metadata: Option<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitoring_metadata_tag_name_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent_settings: Option<TagConsentSetting>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tag {
    /// Whether any parameter at the top level carries one of `keys`
    pub fn has_parameter_key(&self, keys: &[&str]) -> bool {
        self.parameter.as_deref().unwrap_or_default().iter().any(|p| {
            p.key
                .as_deref()
                .map(|k| keys.contains(&k))
                .unwrap_or(false)
        })
    }
}

/// Caller-supplied subset of tag fields for `create` and `update`.
///
/// Identifiers and server-computed fields are not part of the payload; they
/// come from the tool's path parameters instead. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub tag_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firing_rule_id: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_rule_id: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_start_ms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_end_ms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<Vec<Parameter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firing_trigger_id: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_trigger_id: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_tag: Option<Vec<SetupTag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teardown_tag: Option<Vec<TeardownTag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_folder_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_firing_option: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitoring_metadata: Option<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitoring_metadata_tag_name_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent_settings: Option<TagConsentSetting>,
    /// Legacy: older clients put the fingerprint inside the payload. Read
    /// as a fallback during update, never sent.
    #[serde(default, skip_serializing)]
    pub fingerprint: Option<String>,
}

impl TagPayload {
    /// Build a tag body for `create`. The payload's fingerprint is dropped.
    pub fn into_tag(self) -> Tag {
        Tag::default().merged_with(&self)
    }
}

impl Tag {
    /// Shallow field-level overwrite: every field set in `partial` replaces
    /// the corresponding field of `self`; everything else is kept.
    pub fn merged_with(&self, partial: &TagPayload) -> Tag {
        let TagPayload {
            name,
            tag_type,
            firing_rule_id,
            blocking_rule_id,
            live_only,
            priority,
            notes,
            schedule_start_ms,
            schedule_end_ms,
            parameter,
            firing_trigger_id,
            blocking_trigger_id,
            setup_tag,
            teardown_tag,
            parent_folder_id,
            tag_firing_option,
            paused,
            monitoring_metadata,
            monitoring_metadata_tag_name_key,
            consent_settings,
            fingerprint: _,
        } = partial;

        let mut merged = self.clone();
        overwrite(&mut merged.name, name);
        overwrite(&mut merged.tag_type, tag_type);
        overwrite(&mut merged.firing_rule_id, firing_rule_id);
        overwrite(&mut merged.blocking_rule_id, blocking_rule_id);
        overwrite(&mut merged.live_only, live_only);
        overwrite(&mut merged.priority, priority);
        overwrite(&mut merged.notes, notes);
        overwrite(&mut merged.schedule_start_ms, schedule_start_ms);
        overwrite(&mut merged.schedule_end_ms, schedule_end_ms);
        overwrite(&mut merged.parameter, parameter);
        overwrite(&mut merged.firing_trigger_id, firing_trigger_id);
        overwrite(&mut merged.blocking_trigger_id, blocking_trigger_id);
        overwrite(&mut merged.setup_tag, setup_tag);
        overwrite(&mut merged.teardown_tag, teardown_tag);
        overwrite(&mut merged.parent_folder_id, parent_folder_id);
        overwrite(&mut merged.tag_firing_option, tag_firing_option);
        overwrite(&mut merged.paused, paused);
        overwrite(&mut merged.monitoring_metadata, monitoring_metadata);
        overwrite(
            &mut merged.monitoring_metadata_tag_name_key,
            monitoring_metadata_tag_name_key,
        );
        overwrite(&mut merged.consent_settings, consent_settings);
        merged
    }
}

fn overwrite<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if let Some(v) = value {
        *slot = Some(v.clone());
    }
}

/// One page of a remote tag listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagListPage {
    #[serde(default)]
    pub tag: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Response body of a tag revert
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevertTagResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
}

/// `accounts/{a}/containers/{c}/workspaces/{w}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePath {
    pub account_id: String,
    pub container_id: String,
    pub workspace_id: String,
}

impl WorkspacePath {
    pub fn new(
        account_id: impl Into<String>,
        container_id: impl Into<String>,
        workspace_id: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            container_id: container_id.into(),
            workspace_id: workspace_id.into(),
        }
    }

    pub fn tag(&self, tag_id: impl Into<String>) -> TagPath {
        TagPath {
            workspace: self.clone(),
            tag_id: tag_id.into(),
        }
    }
}

impl fmt::Display for WorkspacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accounts/{}/containers/{}/workspaces/{}",
            self.account_id, self.container_id, self.workspace_id
        )
    }
}

/// `{workspace}/tags/{id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPath {
    pub workspace: WorkspacePath,
    pub tag_id: String,
}

impl fmt::Display for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/tags/{}", self.workspace, self.tag_id)
    }
}
