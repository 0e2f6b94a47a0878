use std::collections::BTreeMap;

use super::{Operation, OperationEnforcer};
use crate::cache::{EntityCache, EntityLoader};
use crate::condition::{merge_logic, secure_conditions, validate_logic};
use crate::error::Result;
use crate::fieldpath::ResolvedFieldSet;
use crate::model::{Entity, Trigger};
use crate::principal::Principal;
use crate::protocol::{EntityMetadata, FieldSpec, LoadRequest, OperationModel, RegulatedLoad};

impl OperationEnforcer {
    /// Regulate a batch of load models.
    ///
    /// The entity cache is shared across the batch so response metadata covers
    /// every entity touched by any model.
    pub fn enforce_load<P: Principal + ?Sized>(
        &self,
        request: LoadRequest,
        principal: &P,
        loader: &dyn EntityLoader,
    ) -> Result<RegulatedLoad> {
        for model in &request.operation_models {
            validate_logic(&model.condition_logic)?;
        }

        let mut cache = EntityCache::new(loader);
        let mut models = Vec::with_capacity(request.operation_models.len());
        let mut dropped = Vec::with_capacity(request.operation_models.len());

        for mut model in request.operation_models {
            let entity = cache
                .get(&model.object_name)
                .map_err(|_| Operation::Query.denied(&model.object_name))?;
            if !entity.access.queryable {
                return Err(Operation::Query.denied(&entity.name));
            }

            let (fields, lost) = self.field_gate(&entity, &model, &mut cache);
            model.fields = fields.into_vec();
            dropped.push(lost);

            let secure = secure_conditions(&entity, Trigger::Query, principal)?;
            model.condition_logic = merge_logic(&model.condition_logic, &model.conditions, &secure);
            model.conditions.extend(secure);
            model.schema = entity.schema.clone();

            models.push(model);
        }

        let metadata = request.options.include_metadata.then(|| {
            cache
                .touched()
                .iter()
                .map(|e| (e.name.clone(), EntityMetadata::from(e.as_ref())))
                .collect::<BTreeMap<_, _>>()
        });

        Ok(RegulatedLoad {
            operation_models: models,
            options: request.options,
            metadata,
            dropped,
        })
    }

    /// Expand requested fields; inaccessible ones are dropped and reported.
    fn field_gate(
        &self,
        entity: &Entity,
        model: &OperationModel,
        cache: &mut EntityCache<'_>,
    ) -> (ResolvedFieldSet, Vec<String>) {
        let mut requested = model.fields.clone();
        if !model.aggregate {
            for id_field in entity.id_fields() {
                if !requested.iter().any(|f| f.id == id_field.name) {
                    requested.push(FieldSpec::new(&id_field.name));
                }
            }
        }

        let mut resolved = ResolvedFieldSet::new();
        let mut dropped = Vec::new();
        for field in &requested {
            match self.resolver().resolve(entity, field, cache) {
                Ok(set) => resolved.merge(set),
                Err(e) => {
                    tracing::info!(entity = %entity.name, field = %field.id, reason = %e, "field dropped");
                    dropped.push(field.id.clone());
                }
            }
        }
        (resolved, dropped)
    }
}
