//! Entity metadata as deployed to the catalog.
//!
//! These are plain value structs. The catalog hands them out with permission
//! overrides already merged in (see [`crate::permission`]); the engine never
//! mutates them except through [`crate::permission::PermissionResolver`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Effective CRUD flags. Absent flags deserialize as closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Crud {
    #[serde(default)]
    pub createable: bool,
    #[serde(default)]
    pub queryable: bool,
    #[serde(default)]
    pub updateable: bool,
    #[serde(default)]
    pub deleteable: bool,
}

impl Crud {
    pub const ALL: Crud = Crud {
        createable: true,
        queryable: true,
        updateable: true,
        deleteable: true,
    };

    pub const NONE: Crud = Crud {
        createable: false,
        queryable: false,
        updateable: false,
        deleteable: false,
    };
}

/// A Data Source Object: one table/collection behind the executor.
///
/// Deserialized through [`EntityDef`] so unknown keys are rejected even though
/// the CRUD flags sit inline next to the entity's own keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "EntityDef")]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub label_plural: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(flatten)]
    pub access: Crud,
}

impl Entity {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Every field a load may select.
    ///
    /// ID fields are always admitted once the entity itself is queryable;
    /// a non-queryable entity yields nothing.
    pub fn queryable_fields(&self) -> Vec<&Field> {
        if !self.access.queryable {
            return Vec::new();
        }
        self.fields
            .iter()
            .filter(|f| f.is_id_field || f.access.queryable)
            .collect()
    }

    pub fn find_queryable_field(&self, name: &str) -> Option<&Field> {
        self.queryable_fields().into_iter().find(|f| f.name == name)
    }

    pub fn id_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_id_field)
    }

    /// Drop repeated picklist values on every picklist field (first one wins).
    pub fn dedup_picklists(&mut self) {
        for field in &mut self.fields {
            field.dedup_picklist();
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct EntityDef {
    name: String,
    #[serde(default)]
    schema: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    label_plural: String,
    #[serde(default)]
    fields: Vec<Field>,
    #[serde(default)]
    conditions: Vec<Condition>,
    #[serde(default)]
    createable: bool,
    #[serde(default)]
    queryable: bool,
    #[serde(default)]
    updateable: bool,
    #[serde(default)]
    deleteable: bool,
}

impl From<EntityDef> for Entity {
    fn from(d: EntityDef) -> Self {
        Self {
            name: d.name,
            schema: d.schema,
            label: d.label,
            label_plural: d.label_plural,
            fields: d.fields,
            conditions: d.conditions,
            access: Crud {
                createable: d.createable,
                queryable: d.queryable,
                updateable: d.updateable,
                deleteable: d.deleteable,
            },
        }
    }
}

/// Outbound relationship target of a reference field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReferenceTo {
    pub object: String,
    pub key_field: String,
}

/// Inbound (child) relationship declared on a parent field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChildRelation {
    pub object: String,
    pub key_field: String,
    pub relationship_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PicklistEntry {
    pub value: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

pub const DISPLAY_TYPE_PICKLIST: &str = "PICKLIST";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "FieldDef")]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub display_type: String,
    #[serde(default, rename = "isIDField", alias = "isIdField")]
    pub is_id_field: bool,
    #[serde(default)]
    pub is_name_field: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_to: Vec<ReferenceTo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_relations: Vec<ChildRelation>,
    #[serde(flatten)]
    pub access: Crud,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub picklist_entries: Vec<PicklistEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FieldDef {
    name: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    display_type: String,
    #[serde(default, rename = "isIDField", alias = "isIdField")]
    is_id_field: bool,
    #[serde(default)]
    is_name_field: bool,
    #[serde(default)]
    read_only: bool,
    #[serde(default)]
    reference_to: Vec<ReferenceTo>,
    #[serde(default)]
    child_relations: Vec<ChildRelation>,
    #[serde(default)]
    createable: bool,
    #[serde(default)]
    queryable: bool,
    #[serde(default)]
    updateable: bool,
    #[serde(default)]
    deleteable: bool,
    #[serde(default)]
    picklist_entries: Vec<PicklistEntry>,
}

impl From<FieldDef> for Field {
    fn from(d: FieldDef) -> Self {
        Self {
            name: d.name,
            label: d.label,
            display_type: d.display_type,
            is_id_field: d.is_id_field,
            is_name_field: d.is_name_field,
            read_only: d.read_only,
            reference_to: d.reference_to,
            child_relations: d.child_relations,
            access: Crud {
                createable: d.createable,
                queryable: d.queryable,
                updateable: d.updateable,
                deleteable: d.deleteable,
            },
            picklist_entries: d.picklist_entries,
        }
    }
}

impl Field {
    pub fn is_picklist(&self) -> bool {
        self.display_type.eq_ignore_ascii_case(DISPLAY_TYPE_PICKLIST)
    }

    /// Entries only survive on picklist fields, deduplicated by value.
    pub fn dedup_picklist(&mut self) {
        if !self.is_picklist() {
            self.picklist_entries.clear();
            return;
        }
        let mut seen = HashSet::new();
        self.picklist_entries.retain(|e| seen.insert(e.value.clone()));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionType {
    #[default]
    FieldValue,
    UserInfo,
}

impl ConditionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionType::FieldValue => "fieldvalue",
            ConditionType::UserInfo => "userinfo",
        }
    }
}

/// Which kind of operation a server condition is evaluated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Query,
    Insert,
    Update,
}

/// A server-side row filter declared on an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Condition {
    pub name: String,
    #[serde(default, rename = "type")]
    pub condition_type: ConditionType,
    pub field: String,
    /// Literal value, or a principal field name for `userinfo` conditions.
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub always_on: bool,
    #[serde(default)]
    pub execute_on_query: bool,
    #[serde(default)]
    pub execute_on_insert: bool,
    #[serde(default)]
    pub execute_on_update: bool,
}

impl Condition {
    /// Server-mandated for this trigger.
    pub fn fires_on(&self, trigger: Trigger) -> bool {
        self.always_on
            && match trigger {
                Trigger::Query => self.execute_on_query,
                Trigger::Insert => self.execute_on_insert,
                Trigger::Update => self.execute_on_update,
            }
    }
}
