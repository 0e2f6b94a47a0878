use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ConditionSpec;

/// Body of a save (write) request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub operations: Vec<SaveOperation>,
}

/// Writes against one entity. Each map is keyed by a client record id and
/// holds a record object (`field -> value`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveOperation {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type")]
    pub object_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schema: String,
    #[serde(default)]
    pub inserts: Map<String, Value>,
    #[serde(default)]
    pub updates: Map<String, Value>,
    #[serde(default)]
    pub deletes: Map<String, Value>,
    /// Server conditions scoping updates and deletes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ConditionSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A save that passed enforcement in full.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegulatedSave {
    pub operations: Vec<SaveOperation>,
}
