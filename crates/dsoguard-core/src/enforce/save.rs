use serde_json::{Map, Value};

use super::{Operation, OperationEnforcer};
use crate::cache::{EntityCache, EntityLoader};
use crate::condition::secure_conditions;
use crate::error::{GuardError, Result};
use crate::model::{Entity, Trigger};
use crate::principal::Principal;
use crate::protocol::{RegulatedSave, SaveOperation, SaveRequest};

impl OperationEnforcer {
    /// Regulate a batch of save operations. Any denial rejects the batch.
    pub fn enforce_save<P: Principal + ?Sized>(
        &self,
        request: SaveRequest,
        principal: &P,
        loader: &dyn EntityLoader,
    ) -> Result<RegulatedSave> {
        let mut cache = EntityCache::new(loader);
        let mut operations = Vec::with_capacity(request.operations.len());

        for mut op in request.operations {
            let required = required_operations(&op);
            let entity = match cache.get(&op.object_name) {
                Ok(entity) => entity,
                Err(_) => {
                    let denied = required.first().copied().unwrap_or(Operation::Update);
                    return Err(denied.denied(&op.object_name));
                }
            };

            for operation in &required {
                let allowed = match operation {
                    Operation::Create => entity.access.createable,
                    Operation::Update => entity.access.updateable,
                    Operation::Delete => entity.access.deleteable,
                    Operation::Query => entity.access.queryable,
                };
                if !allowed {
                    return Err(operation.denied(&entity.name));
                }
            }

            if !op.inserts.is_empty() {
                check_records(&entity, &op.inserts, Operation::Create)?;
                let stamps = secure_conditions(&entity, Trigger::Insert, principal)?;
                for record in op.inserts.values_mut() {
                    if let Value::Object(record) = record {
                        for stamp in &stamps {
                            record.insert(stamp.field.clone(), stamp.value.clone());
                        }
                    }
                }
            }

            if !op.updates.is_empty() {
                check_records(&entity, &op.updates, Operation::Update)?;
            }

            if !op.updates.is_empty() || !op.deletes.is_empty() {
                op.conditions = secure_conditions(&entity, Trigger::Update, principal)?;
            }

            op.schema = entity.schema.clone();
            operations.push(op);
        }

        Ok(RegulatedSave { operations })
    }
}

fn required_operations(op: &SaveOperation) -> Vec<Operation> {
    [
        (!op.inserts.is_empty(), Operation::Create),
        (!op.updates.is_empty(), Operation::Update),
        (!op.deletes.is_empty(), Operation::Delete),
    ]
    .into_iter()
    .filter_map(|(needed, operation)| needed.then_some(operation))
    .collect()
}

/// Every written field must exist, be writable, and carry the flag for
/// `operation`. ID fields in updates only address the row.
fn check_records(entity: &Entity, records: &Map<String, Value>, operation: Operation) -> Result<()> {
    for (record_id, record) in records {
        let Value::Object(values) = record else {
            return Err(GuardError::BadRequest(format!(
                "record {record_id} for {} must be an object",
                entity.name
            )));
        };
        for name in values.keys() {
            let allowed = entity.field(name).is_some_and(|f| match operation {
                Operation::Update if f.is_id_field => true,
                Operation::Create => f.access.createable && !f.read_only,
                Operation::Update => f.access.updateable && !f.read_only,
                _ => false,
            });
            if !allowed {
                tracing::info!(operation = operation.as_str(), entity = %entity.name, field = %name, "field write rejected");
                return Err(GuardError::FieldNotPermitted {
                    operation: operation.as_str(),
                    entity: entity.name.clone(),
                    field: name.clone(),
                });
            }
        }
    }
    Ok(())
}
