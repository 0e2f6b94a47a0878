//! Entity lookup seam and the request-scoped memo above it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{GuardError, Result};
use crate::model::Entity;

/// Loads an entity with the current principal's permission overrides merged.
///
/// Implementations may hit the network; the engine calls them synchronously
/// and memoizes per request through [`EntityCache`].
pub trait EntityLoader {
    fn load(&self, name: &str) -> Result<Entity>;
}

impl<F> EntityLoader for F
where
    F: Fn(&str) -> Result<Entity>,
{
    fn load(&self, name: &str) -> Result<Entity> {
        self(name)
    }
}

/// Memoizes loader results for one batch of operations.
///
/// Failures are remembered too: within one request a failed lookup stays a
/// denial and is not retried.
pub struct EntityCache<'a> {
    loader: &'a dyn EntityLoader,
    entries: HashMap<String, Option<Arc<Entity>>>,
    order: Vec<String>,
}

impl<'a> EntityCache<'a> {
    pub fn new(loader: &'a dyn EntityLoader) -> Self {
        Self {
            loader,
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn get(&mut self, name: &str) -> Result<Arc<Entity>> {
        if let Some(hit) = self.entries.get(name) {
            return hit
                .clone()
                .ok_or_else(|| GuardError::EntityNotFound(name.to_string()));
        }

        let loaded = match self.loader.load(name) {
            Ok(entity) => Some(Arc::new(entity)),
            Err(e) => {
                tracing::debug!(entity = %name, error = %e, "entity lookup failed");
                None
            }
        };
        self.entries.insert(name.to_string(), loaded.clone());
        self.order.push(name.to_string());
        loaded.ok_or_else(|| GuardError::EntityNotFound(name.to_string()))
    }

    /// Every entity successfully loaded so far, in first-touch order.
    pub fn touched(&self) -> Vec<Arc<Entity>> {
        self.order
            .iter()
            .filter_map(|n| self.entries.get(n).cloned().flatten())
            .collect()
    }
}
