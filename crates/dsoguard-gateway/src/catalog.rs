//! In-process entity catalog.
//!
//! Holds base entity metadata and permission sets compiled from config, and
//! hands the engine a per-principal loader that merges overrides on lookup.

use std::collections::HashMap;

use dsoguard_core::error::{GuardError, Result};
use dsoguard_core::model::Entity;
use dsoguard_core::{EntityLoader, PermissionResolver, PermissionSet, PermissionSets, Principal};

pub struct MetadataCatalog {
    entities: HashMap<String, Entity>,
    sets: PermissionSets,
}

impl MetadataCatalog {
    pub fn new(entities: Vec<Entity>, permission_sets: Vec<PermissionSet>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(entities.len());
        for mut entity in entities {
            entity.dedup_picklists();
            let name = entity.name.clone();
            if by_name.insert(name.clone(), entity).is_some() {
                return Err(GuardError::BadRequest(format!("duplicate entity: {name}")));
            }
        }

        // dangling relationship targets only fail at request time; flag them early
        for entity in by_name.values() {
            for field in &entity.fields {
                let targets = field
                    .reference_to
                    .iter()
                    .map(|r| r.object.as_str())
                    .chain(field.child_relations.iter().map(|c| c.object.as_str()));
                for target in targets {
                    if !by_name.contains_key(target) {
                        tracing::warn!(entity = %entity.name, field = %field.name, %target, "relationship targets unknown entity");
                    }
                }
            }
        }

        let sets = PermissionSets::new(permission_sets);
        for (profile, entity) in permission_sets_unknown_entities(&sets, &by_name) {
            tracing::warn!(%profile, %entity, "permission set refers to unknown entity");
        }

        Ok(Self {
            entities: by_name,
            sets,
        })
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn permission_sets(&self) -> &PermissionSets {
        &self.sets
    }

    /// Loader bound to one principal for the duration of a request.
    pub fn loader_for<'a, P: Principal + ?Sized>(&'a self, principal: &'a P) -> CatalogLoader<'a, P> {
        CatalogLoader {
            catalog: self,
            principal,
        }
    }
}

fn permission_sets_unknown_entities(
    sets: &PermissionSets,
    entities: &HashMap<String, Entity>,
) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for set in sets.iter() {
        let named = set
            .entities
            .keys()
            .chain(set.fields.keys())
            .chain(set.conditions.keys());
        for entity in named {
            if !entities.contains_key(entity) {
                out.push((set.name.clone(), entity.clone()));
            }
        }
    }
    out.sort();
    out.dedup();
    out
}

pub struct CatalogLoader<'a, P: ?Sized> {
    catalog: &'a MetadataCatalog,
    principal: &'a P,
}

impl<P: Principal + ?Sized> EntityLoader for CatalogLoader<'_, P> {
    fn load(&self, name: &str) -> Result<Entity> {
        let base = self
            .catalog
            .entity(name)
            .ok_or_else(|| GuardError::EntityNotFound(name.to_string()))?;
        Ok(PermissionResolver::for_principal(&self.catalog.sets, self.principal).effective_entity(base))
    }
}
