use serde::Serialize;

use crate::model::{Crud, Entity, Field, PicklistEntry, ReferenceTo};

/// Client-facing description of an entity, limited to what the principal may
/// query. Server conditions are never exposed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetadata {
    pub name: String,
    pub label: String,
    pub label_plural: String,
    #[serde(flatten)]
    pub access: Crud,
    pub fields: Vec<FieldMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetadata {
    pub id: String,
    pub label: String,
    pub display_type: String,
    #[serde(rename = "isIDField")]
    pub is_id_field: bool,
    pub is_name_field: bool,
    pub read_only: bool,
    #[serde(flatten)]
    pub access: Crud,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference_to: Vec<ReferenceTo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub picklist_entries: Vec<PicklistEntry>,
}

impl From<&Field> for FieldMetadata {
    fn from(f: &Field) -> Self {
        let mut field = f.clone();
        field.dedup_picklist();
        Self {
            id: field.name,
            label: field.label,
            display_type: field.display_type,
            is_id_field: field.is_id_field,
            is_name_field: field.is_name_field,
            read_only: field.read_only,
            access: field.access,
            reference_to: field.reference_to,
            picklist_entries: field.picklist_entries,
        }
    }
}

impl From<&Entity> for EntityMetadata {
    fn from(e: &Entity) -> Self {
        Self {
            name: e.name.clone(),
            label: e.label.clone(),
            label_plural: e.label_plural.clone(),
            access: e.access,
            fields: e.queryable_fields().into_iter().map(FieldMetadata::from).collect(),
        }
    }
}
