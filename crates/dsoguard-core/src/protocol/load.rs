use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ConditionSpec, EntityMetadata, FieldSpec};

/// Body of a load (read) request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    #[serde(default)]
    pub operation_models: Vec<OperationModel>,
    #[serde(default)]
    pub options: LoadOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadOptions {
    #[serde(default)]
    pub include_metadata: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One model to load. `fields`, `conditions`, `condition_logic` and `schema`
/// are rewritten in place by enforcement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationModel {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub object_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schema: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub conditions: Vec<ConditionSpec>,
    #[serde(default)]
    pub condition_logic: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub aggregate: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OperationModel {
    pub fn new(object_name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            object_name: object_name.into(),
            fields,
            ..Self::default()
        }
    }
}

/// A load that passed enforcement and may be handed to the executor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatedLoad {
    pub operation_models: Vec<OperationModel>,
    pub options: LoadOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, EntityMetadata>>,
    /// Field ids dropped as inaccessible, per model index. Never sent on.
    #[serde(skip)]
    pub dropped: Vec<Vec<String>>,
}

impl RegulatedLoad {
    pub fn dropped_count(&self) -> usize {
        self.dropped.iter().map(Vec::len).sum()
    }
}
