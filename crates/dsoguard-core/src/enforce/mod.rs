//! Per-operation enforcement for load and save batches.
//!
//! Each operation model walks the same gates in order:
//! entity gate (CRUD flag on the entity), field gate (loads only: expand and
//! filter the requested fields), condition gate (inject server conditions).
//! Entity and condition failures reject the whole batch; field failures only
//! drop the field.

mod load;
mod save;

use crate::error::GuardError;
use crate::fieldpath::FieldPathResolver;

/// CRUD operation named in rejection messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Query,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Query => "Query",
            Operation::Create => "Create",
            Operation::Update => "Update",
            Operation::Delete => "Delete",
        }
    }

    fn denied(self, entity: &str) -> GuardError {
        tracing::info!(operation = self.as_str(), %entity, "operation rejected");
        GuardError::NotPermitted {
            operation: self.as_str(),
            entity: entity.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OperationEnforcer {
    resolver: FieldPathResolver,
}

impl OperationEnforcer {
    pub fn new(resolver: FieldPathResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &FieldPathResolver {
        &self.resolver
    }
}
