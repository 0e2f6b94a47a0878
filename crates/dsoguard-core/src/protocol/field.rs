//! Requested fields and their parsed form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GuardError, Result};

/// Suffix marking a path segment as a relationship hop (`account_id__rel`).
pub const RELATIONSHIP_MARKER: &str = "__rel";

/// One requested (or resolved) field.
///
/// The join keys (`key_field`, `target_schema`, `target_object`) are only set
/// on entries synthesized while resolving relationship hops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub child_relationship: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_fields: Option<Vec<FieldSpec>>,

    // aggregate pass-through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_object: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl FieldSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn child(
        id: impl Into<String>,
        anchor_field: impl Into<String>,
        sub_fields: Vec<FieldSpec>,
    ) -> Self {
        Self {
            id: id.into(),
            child_relationship: true,
            anchor_field: Some(anchor_field.into()),
            sub_fields: Some(sub_fields),
            ..Self::default()
        }
    }

    /// Parse the id once into the kind of resolution it needs.
    pub fn classify(&self) -> Result<FieldRequest<'_>> {
        if self.child_relationship {
            let anchor = self.anchor_field.as_deref().ok_or_else(|| {
                GuardError::BadRequest(format!("child relationship {} has no anchorField", self.id))
            })?;
            return Ok(FieldRequest::Child {
                anchor,
                relationship: &self.id,
                sub_fields: self.sub_fields.as_deref().unwrap_or_default(),
            });
        }

        let parts: Vec<&str> = self.id.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(GuardError::BadRequest(format!("malformed field id: {}", self.id)));
        }
        if parts.len() == 1 {
            return Ok(FieldRequest::Direct { name: &self.id });
        }
        if parts[..parts.len() - 1]
            .iter()
            .any(|p| !p.ends_with(RELATIONSHIP_MARKER))
        {
            return Err(GuardError::BadRequest(format!(
                "relationship segments must end with {RELATIONSHIP_MARKER}: {}",
                self.id
            )));
        }
        Ok(FieldRequest::Relationship { parts })
    }
}

/// Parsed field request.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRequest<'a> {
    /// Plain field on the current entity.
    Direct { name: &'a str },
    /// Dotted path; every segment but the last carries [`RELATIONSHIP_MARKER`].
    Relationship { parts: Vec<&'a str> },
    /// Child records reached through `anchor`'s declared child relation.
    Child {
        anchor: &'a str,
        relationship: &'a str,
        sub_fields: &'a [FieldSpec],
    },
}

pub(crate) fn strip_marker(segment: &str) -> &str {
    segment.strip_suffix(RELATIONSHIP_MARKER).unwrap_or(segment)
}
