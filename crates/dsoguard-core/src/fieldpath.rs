//! Field path resolution.
//!
//! Expands one requested field into the flat set of entries the executor
//! needs: the field itself plus a synthetic join-key entry for every
//! relationship hop on the way to it. Every hop is checked against the
//! queryable fields of the entity it lands on; any failure denies the whole
//! path.
//!
//! Join-key ids are the dotted prefix up to and including the hop's own field,
//! with the relationship marker stripped. For
//! `manager_id__rel.address_id__rel.city_id__rel.city` the entries are
//! `manager_id`, `manager_id__rel.address_id`,
//! `manager_id__rel.address_id__rel.city_id` and the full path.

use std::collections::HashMap;

use crate::cache::EntityCache;
use crate::error::{GuardError, Result};
use crate::model::{Entity, Field};
use crate::protocol::field::strip_marker;
use crate::protocol::{FieldRequest, FieldSpec};

/// Relationship hops allowed in one path unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Insertion-ordered map from field id to resolved spec.
///
/// Merging is first-writer-wins: an entry already present is never replaced,
/// so an explicitly requested field survives a same-keyed join artifact found
/// later.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedFieldSet {
    entries: Vec<FieldSpec>,
    index: HashMap<String, usize>,
}

impl ResolvedFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(spec: FieldSpec) -> Self {
        let mut set = Self::new();
        set.insert_if_absent(spec);
        set
    }

    /// Returns false (and keeps the existing entry) when the id is taken.
    pub fn insert_if_absent(&mut self, spec: FieldSpec) -> bool {
        if self.index.contains_key(&spec.id) {
            return false;
        }
        self.index.insert(spec.id.clone(), self.entries.len());
        self.entries.push(spec);
        true
    }

    pub fn merge(&mut self, other: ResolvedFieldSet) {
        for spec in other.entries {
            self.insert_if_absent(spec);
        }
    }

    /// `self` first, then entries of `other` whose ids are not yet present.
    pub fn union(mut self, other: ResolvedFieldSet) -> Self {
        self.merge(other);
        self
    }

    pub fn get(&self, id: &str) -> Option<&FieldSpec> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|f| f.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<FieldSpec> {
        self.entries
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldPathResolver {
    max_depth: usize,
}

impl Default for FieldPathResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl FieldPathResolver {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Resolve one requested field against `entity`.
    ///
    /// A `NoAccess`/`EntityNotFound` error means "drop this field"; callers
    /// must not abort the whole operation on it.
    pub fn resolve(
        &self,
        entity: &Entity,
        request: &FieldSpec,
        cache: &mut EntityCache<'_>,
    ) -> Result<ResolvedFieldSet> {
        match request.classify()? {
            FieldRequest::Direct { name } => {
                queryable_field(entity, name)?;
                Ok(ResolvedFieldSet::single(request.clone()))
            }
            FieldRequest::Relationship { parts } => {
                let hops = parts.len() - 1;
                if hops > self.max_depth {
                    return Err(GuardError::NoAccess(format!(
                        "{}: {hops} relationship hops exceed the limit of {}",
                        request.id, self.max_depth
                    )));
                }
                self.resolve_path(entity, request, &parts, &parts, cache)
            }
            FieldRequest::Child {
                anchor,
                relationship,
                sub_fields,
            } => self.resolve_child(entity, request, anchor, relationship, sub_fields, cache),
        }
    }

    fn resolve_path(
        &self,
        entity: &Entity,
        request: &FieldSpec,
        all: &[&str],
        remaining: &[&str],
        cache: &mut EntityCache<'_>,
    ) -> Result<ResolvedFieldSet> {
        let (head, rest) = match remaining {
            [leaf] => {
                queryable_field(entity, leaf)?;
                return Ok(ResolvedFieldSet::single(request.clone()));
            }
            [head, rest @ ..] => (*head, rest),
            [] => return Err(GuardError::BadRequest(format!("empty field path: {}", request.id))),
        };

        let field = queryable_field(entity, strip_marker(head))?;
        let [reference] = field.reference_to.as_slice() else {
            return Err(GuardError::NoAccess(format!(
                "{}.{} must reference exactly one object, found {}",
                entity.name,
                field.name,
                field.reference_to.len()
            )));
        };
        let target = cache.get(&reference.object)?;

        let join = FieldSpec {
            id: join_key_id(all, remaining.len()),
            key_field: Some(reference.key_field.clone()),
            target_schema: Some(target.schema.clone()),
            target_object: Some(reference.object.clone()),
            ..FieldSpec::default()
        };
        let tail = self.resolve_path(&target, request, all, rest, cache)?;
        Ok(ResolvedFieldSet::single(join).union(tail))
    }

    fn resolve_child(
        &self,
        entity: &Entity,
        request: &FieldSpec,
        anchor: &str,
        relationship: &str,
        sub_fields: &[FieldSpec],
        cache: &mut EntityCache<'_>,
    ) -> Result<ResolvedFieldSet> {
        let field = queryable_field(entity, anchor)?;
        let relation = match field.child_relations.as_slice() {
            [only] => only,
            many => many
                .iter()
                .find(|r| r.relationship_name == relationship)
                .ok_or_else(|| {
                    GuardError::NoAccess(format!(
                        "{}.{anchor} has no child relationship {relationship}",
                        entity.name
                    ))
                })?,
        };
        let child = cache.get(&relation.object)?;

        // The child side of the join must be readable or the block is useless.
        self.resolve(&child, &FieldSpec::new(&relation.key_field), cache)?;

        let mut allowed = ResolvedFieldSet::new();
        for sub in sub_fields {
            match self.resolve(&child, sub, cache) {
                Ok(set) => allowed.merge(set),
                Err(e) => {
                    tracing::debug!(entity = %child.name, field = %sub.id, reason = %e, "child field dropped");
                }
            }
        }

        let mut out = request.clone();
        out.sub_fields = Some(allowed.into_vec());
        Ok(ResolvedFieldSet::single(out))
    }
}

fn queryable_field<'e>(entity: &'e Entity, name: &str) -> Result<&'e Field> {
    entity
        .find_queryable_field(name)
        .ok_or_else(|| GuardError::no_access(&entity.name, name))
}

/// Synthetic id for the hop whose segment is `all[all.len() - remaining]`.
pub fn join_key_id(all: &[&str], remaining: usize) -> String {
    let take = (all.len() + 1).saturating_sub(remaining).min(all.len());
    let prefix = all[..take].join(".");
    strip_marker(&prefix).to_string()
}
