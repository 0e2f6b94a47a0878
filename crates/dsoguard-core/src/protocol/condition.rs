use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::ConditionType;

/// A query condition as sent by clients or injected by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, rename = "type")]
    pub condition_type: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConditionSpec {
    pub fn new(
        name: impl Into<String>,
        condition_type: ConditionType,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            condition_type: condition_type.as_str().to_string(),
            field: field.into(),
            value: value.into(),
            extra: Map::new(),
        }
    }
}
