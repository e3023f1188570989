//! Partial-update reconciliation
//!
//! A partial update against Tag Manager must send a complete resource: the
//! API rejects or silently mangles writes that drop required fields, and every
//! write is conditioned on the fingerprint of the version being replaced.
//! [`reconcile`] turns a freshly fetched resource and a caller's partial
//! payload into the body that is safe to write back.

use crate::error::GtmError;
use crate::resource::{Tag, TagPayload};

/// Tag types that can be recognized from their parameter keys alone
const TYPE_SIGNATURES: &[(&str, &[&str])] = &[
    // GA4 configuration
    ("gaawc", &["measurementId", "sendPageView"]),
];

/// A remote resource versioned by an opaque fingerprint
pub trait Versioned: Clone {
    type Payload;

    /// Shallow overwrite of every field present in `partial`
    fn merge(&self, partial: &Self::Payload) -> Self;

    /// Repair required fields that can be inferred from other fields
    fn ensure_integrity(&mut self) {}

    fn fingerprint(&self) -> Option<&str>;

    fn set_fingerprint(&mut self, fingerprint: String);

    /// Fingerprint smuggled inside a payload by older clients
    fn payload_fingerprint(_partial: &Self::Payload) -> Option<&str> {
        None
    }

    /// Human-readable identifier used in diagnostics
    fn label(&self) -> String;
}

impl Versioned for Tag {
    type Payload = TagPayload;

    fn merge(&self, partial: &TagPayload) -> Self {
        self.merged_with(partial)
    }

    fn ensure_integrity(&mut self) {
        if self.tag_type.as_deref().is_some_and(|t| !t.is_empty()) {
            return;
        }
        if let Some((tag_type, _)) = TYPE_SIGNATURES
            .iter()
            .find(|(_, keys)| self.has_parameter_key(keys))
        {
            self.tag_type = Some((*tag_type).to_string());
        }
    }

    fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    fn set_fingerprint(&mut self, fingerprint: String) {
        self.fingerprint = Some(fingerprint);
    }

    fn payload_fingerprint(partial: &TagPayload) -> Option<&str> {
        partial.fingerprint.as_deref()
    }

    fn label(&self) -> String {
        self.tag_id.clone().unwrap_or_else(|| "(unknown)".to_string())
    }
}

/// Pick the fingerprint to send: explicit > payload > existing.
/// Empty strings count as absent.
pub fn resolve_fingerprint<'a>(
    explicit: Option<&'a str>,
    payload: Option<&'a str>,
    existing: Option<&'a str>,
) -> Option<&'a str> {
    [explicit, payload, existing]
        .into_iter()
        .flatten()
        .find(|fp| !fp.is_empty())
}

/// Merge `partial` onto `existing`, repair inferable required fields and
/// attach exactly one fingerprint.
pub fn reconcile<R: Versioned>(
    existing: &R,
    partial: &R::Payload,
    explicit_fingerprint: Option<&str>,
) -> Result<R, GtmError> {
    let mut merged = existing.merge(partial);
    merged.ensure_integrity();

    let fingerprint = resolve_fingerprint(
        explicit_fingerprint,
        R::payload_fingerprint(partial),
        existing.fingerprint(),
    )
    .ok_or_else(|| GtmError::MissingFingerprint {
        tag_id: existing.label(),
    })?
    .to_string();

    merged.set_fingerprint(fingerprint);
    Ok(merged)
}
