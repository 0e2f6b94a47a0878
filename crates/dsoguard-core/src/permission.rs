//! Permission sets and effective CRUD resolution.
//!
//! A permission set (profile) overrides base metadata flags for entities,
//! fields and conditions. Lookups are two-level: profile name first, then the
//! entity name, then the field or condition name. A missing override leaves the
//! base flag in place; an admin principal bypasses overrides entirely.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Condition, Crud, Entity, Field};
use crate::principal::Principal;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionSet {
    pub name: String,
    /// entity -> flags
    #[serde(default)]
    pub entities: HashMap<String, Crud>,
    /// entity -> field -> flags
    #[serde(default)]
    pub fields: HashMap<String, HashMap<String, Crud>>,
    /// entity -> condition -> alwaysOn
    #[serde(default)]
    pub conditions: HashMap<String, HashMap<String, bool>>,
}

impl PermissionSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn grant_entity(mut self, entity: impl Into<String>, access: Crud) -> Self {
        self.entities.insert(entity.into(), access);
        self
    }

    pub fn grant_field(
        mut self,
        entity: impl Into<String>,
        field: impl Into<String>,
        access: Crud,
    ) -> Self {
        self.fields
            .entry(entity.into())
            .or_default()
            .insert(field.into(), access);
        self
    }

    pub fn enable_condition(
        mut self,
        entity: impl Into<String>,
        condition: impl Into<String>,
        always_on: bool,
    ) -> Self {
        self.conditions
            .entry(entity.into())
            .or_default()
            .insert(condition.into(), always_on);
        self
    }

    fn entity_override(&self, entity: &str) -> Option<Crud> {
        self.entities.get(entity).copied()
    }

    fn field_override(&self, entity: &str, field: &str) -> Option<Crud> {
        self.fields.get(entity)?.get(field).copied()
    }

    fn condition_override(&self, entity: &str, condition: &str) -> Option<bool> {
        self.conditions.get(entity)?.get(condition).copied()
    }
}

/// All permission sets, keyed by profile name.
#[derive(Debug, Clone, Default)]
pub struct PermissionSets {
    by_profile: HashMap<String, PermissionSet>,
}

impl PermissionSets {
    pub fn new(sets: impl IntoIterator<Item = PermissionSet>) -> Self {
        Self {
            by_profile: sets.into_iter().map(|s| (s.name.clone(), s)).collect(),
        }
    }

    pub fn get(&self, profile: &str) -> Option<&PermissionSet> {
        self.by_profile.get(profile)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PermissionSet> {
        self.by_profile.values()
    }

    pub fn len(&self) -> usize {
        self.by_profile.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_profile.is_empty()
    }
}

/// Computes effective flags for one principal. Pure; holds no state besides
/// the selected profile.
#[derive(Debug, Clone, Copy)]
pub struct PermissionResolver<'a> {
    profile: Option<&'a PermissionSet>,
    is_admin: bool,
}

impl<'a> PermissionResolver<'a> {
    pub fn new(profile: Option<&'a PermissionSet>, is_admin: bool) -> Self {
        Self { profile, is_admin }
    }

    pub fn for_principal<P: Principal + ?Sized>(sets: &'a PermissionSets, principal: &P) -> Self {
        Self::new(sets.get(principal.profile_name()), principal.is_admin())
    }

    /// Entity with its own flags and every field and condition resolved.
    pub fn effective_entity(&self, entity: &Entity) -> Entity {
        let mut out = entity.clone();
        out.access = if self.is_admin {
            Crud::ALL
        } else {
            self.profile
                .and_then(|p| p.entity_override(&entity.name))
                .unwrap_or(entity.access)
        };
        out.fields = entity
            .fields
            .iter()
            .map(|f| self.effective_field(&entity.name, f))
            .collect();
        out.conditions = entity
            .conditions
            .iter()
            .map(|c| self.effective_condition(&entity.name, c))
            .collect();
        out
    }

    pub fn effective_field(&self, entity: &str, field: &Field) -> Field {
        let mut out = field.clone();
        if self.is_admin {
            out.access = Crud::ALL;
        } else if let Some(access) = self.profile.and_then(|p| p.field_override(entity, &field.name)) {
            out.access = access;
        }
        out
    }

    pub fn effective_condition(&self, entity: &str, condition: &Condition) -> Condition {
        let mut out = condition.clone();
        if self.is_admin {
            out.always_on = true;
        } else if let Some(on) = self
            .profile
            .and_then(|p| p.condition_override(entity, &condition.name))
        {
            out.always_on = on;
        }
        out
    }
}
