//! Load and save enforcement over whole batches.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::cell::Cell;

use serde_json::json;

use dsoguard_core::model::{ConditionType, Entity};
use dsoguard_core::protocol::{
    ConditionSpec, FieldSpec, LoadOptions, LoadRequest, OperationModel, SaveRequest,
};
use dsoguard_core::{GuardError, OperationEnforcer};

use common::Catalog;

fn load_one(model: OperationModel) -> LoadRequest {
    LoadRequest {
        operation_models: vec![model],
        options: LoadOptions::default(),
    }
}

fn field_ids(model: &OperationModel) -> Vec<&str> {
    model.fields.iter().map(|f| f.id.as_str()).collect()
}

#[test]
fn guest_load_drops_unqueryable_field_silently() {
    let catalog = Catalog::load();
    let user = common::guest();
    let loader = catalog.loader(&user);

    let request = load_one(OperationModel::new(
        "product",
        vec![FieldSpec::new("name"), FieldSpec::new("quantity"), FieldSpec::new("id")],
    ));
    let out = OperationEnforcer::default()
        .enforce_load(request, &user, &loader)
        .unwrap();

    let model = &out.operation_models[0];
    assert_eq!(field_ids(model), vec!["name", "id"]);
    assert_eq!(out.dropped, vec![vec!["quantity".to_string()]]);
    assert_eq!(model.schema, "store");

    assert_eq!(model.conditions.len(), 1);
    assert_eq!(model.conditions[0].field, "site_id");
    assert_eq!(model.conditions[0].value, json!("site-42"));
    assert_eq!(model.condition_logic, "1");
    assert!(out.metadata.is_none());
}

#[test]
fn id_fields_are_injected_for_plain_loads() {
    let catalog = Catalog::load();
    let user = common::guest();
    let loader = catalog.loader(&user);

    let out = OperationEnforcer::default()
        .enforce_load(load_one(OperationModel::new("product", vec![FieldSpec::new("name")])), &user, &loader)
        .unwrap();
    assert_eq!(field_ids(&out.operation_models[0]), vec!["name", "id"]);
}

#[test]
fn aggregate_loads_skip_id_injection() {
    let catalog = Catalog::load();
    let user = common::guest();
    let loader = catalog.loader(&user);

    let mut count = FieldSpec::new("name");
    count.function = Some("COUNT".into());
    count.name = Some("countName".into());
    let mut model = OperationModel::new("product", vec![count.clone()]);
    model.aggregate = true;

    let out = OperationEnforcer::default()
        .enforce_load(load_one(model), &user, &loader)
        .unwrap();
    assert_eq!(out.operation_models[0].fields, vec![count]);
}

#[test]
fn relationship_fields_bring_their_join_keys() {
    let catalog = Catalog::load();
    let user = common::guest();
    let loader = catalog.loader(&user);

    let out = OperationEnforcer::default()
        .enforce_load(
            load_one(OperationModel::new(
                "product",
                vec![FieldSpec::new("category_id__rel.name"), FieldSpec::new("name")],
            )),
            &user,
            &loader,
        )
        .unwrap();
    assert_eq!(
        field_ids(&out.operation_models[0]),
        vec!["category_id", "category_id__rel.name", "name", "id"]
    );
}

#[test]
fn client_conditions_keep_precedence() {
    let catalog = Catalog::load();
    let user = common::guest();
    let loader = catalog.loader(&user);

    let mut model = OperationModel::new("product", vec![FieldSpec::new("name")]);
    model.conditions = vec![
        ConditionSpec::new("a", ConditionType::FieldValue, "name", "x"),
        ConditionSpec::new("b", ConditionType::FieldValue, "name", "y"),
    ];
    model.condition_logic = "1 OR 2".into();

    let out = OperationEnforcer::default()
        .enforce_load(load_one(model), &user, &loader)
        .unwrap();
    let model = &out.operation_models[0];
    assert_eq!(model.condition_logic, "(1 OR 2) AND 3");
    assert_eq!(model.conditions.len(), 3);
    assert_eq!(model.conditions[2].name, "site_filter");
}

#[test]
fn malformed_logic_is_rejected_before_any_lookup() {
    let calls = Cell::new(0);
    let loader = |name: &str| -> dsoguard_core::Result<Entity> {
        calls.set(calls.get() + 1);
        Err(GuardError::EntityNotFound(name.to_string()))
    };

    let mut model = OperationModel::new("product", vec![]);
    model.condition_logic = "(1 AND 2".into();
    let err = OperationEnforcer::default()
        .enforce_load(load_one(model), &common::guest(), &loader)
        .unwrap_err();

    assert!(matches!(err, GuardError::InvalidConditionLogic(_)));
    assert_eq!(calls.get(), 0);
}

#[test]
fn unqueryable_entity_rejects_the_load() {
    let catalog = Catalog::load();
    let user = common::guest();
    let loader = catalog.loader(&user);

    let err = OperationEnforcer::default()
        .enforce_load(load_one(OperationModel::new("audit_log", vec![])), &user, &loader)
        .unwrap_err();
    assert_eq!(err.to_string(), "Query not permitted for model: audit_log");
    assert_eq!(err.client_code().as_str(), "NOT_PERMITTED");
}

#[test]
fn unknown_entity_is_an_entity_denial() {
    let catalog = Catalog::load();
    let user = common::guest();
    let loader = catalog.loader(&user);

    let err = OperationEnforcer::default()
        .enforce_load(load_one(OperationModel::new("ghost", vec![])), &user, &loader)
        .unwrap_err();
    assert_eq!(err.to_string(), "Query not permitted for model: ghost");
}

#[test]
fn userinfo_condition_without_principal_field_rejects() {
    let catalog = Catalog::load();
    let user = common::clerk();
    let loader = catalog.loader(&user);

    let err = OperationEnforcer::default()
        .enforce_load(load_one(OperationModel::new("audit_log", vec![FieldSpec::new("message")])), &user, &loader)
        .unwrap_err();
    assert!(err
        .to_string()
        .starts_with("Improperly Configured Condition on Object: audit_log. "));
    assert_eq!(err.client_code().as_str(), "MISCONFIGURED");
}

#[test]
fn metadata_covers_every_touched_entity() {
    let catalog = Catalog::load();
    let user = common::guest();
    let loader = catalog.loader(&user);

    let request = LoadRequest {
        operation_models: vec![
            OperationModel::new("product", vec![FieldSpec::new("category_id__rel.name")]),
            OperationModel::new("city", vec![FieldSpec::new("city")]),
        ],
        options: LoadOptions {
            include_metadata: true,
            ..LoadOptions::default()
        },
    };
    let out = OperationEnforcer::default()
        .enforce_load(request, &user, &loader)
        .unwrap();

    let metadata = out.metadata.unwrap();
    let names: Vec<_> = metadata.keys().cloned().collect();
    assert_eq!(names, vec!["category", "city", "product"]);

    let product = &metadata["product"];
    let fields: Vec<_> = product.fields.iter().map(|f| f.id.as_str()).collect();
    assert!(fields.contains(&"id"));
    assert!(!fields.contains(&"quantity"));

    let status = product.fields.iter().find(|f| f.id == "status").unwrap();
    assert_eq!(status.picklist_entries.len(), 2);
}

#[test]
fn admin_sees_everything_and_gets_every_condition() {
    let catalog = Catalog::load();
    let user = common::admin();
    let loader = catalog.loader(&user);

    let out = OperationEnforcer::default()
        .enforce_load(
            load_one(OperationModel::new("product", vec![FieldSpec::new("quantity")])),
            &user,
            &loader,
        )
        .unwrap();
    let model = &out.operation_models[0];
    assert_eq!(field_ids(model), vec!["quantity", "id"]);
    assert_eq!(model.conditions[0].value, json!("hq"));
}

fn save(body: serde_json::Value) -> SaveRequest {
    serde_json::from_value(body).unwrap()
}

#[test]
fn insert_without_createable_rejects_everything() {
    let catalog = Catalog::load();
    let user = common::guest();
    let loader = catalog.loader(&user);

    let request = save(json!({
        "operations": [{
            "id": "op1",
            "type": "product",
            "inserts": { "tmp1": { "name": "Widget" } }
        }]
    }));
    let err = OperationEnforcer::default()
        .enforce_save(request, &user, &loader)
        .unwrap_err();
    assert_eq!(err.to_string(), "Create not permitted for model: product");
}

#[test]
fn inserts_are_stamped_with_server_values() {
    let catalog = Catalog::load();
    let user = common::clerk();
    let loader = catalog.loader(&user);

    let request = save(json!({
        "operations": [{
            "type": "product",
            "inserts": { "tmp1": { "name": "Widget", "quantity": 3, "site_id": "elsewhere" } }
        }]
    }));
    let out = OperationEnforcer::default()
        .enforce_save(request, &user, &loader)
        .unwrap();

    let op = &out.operations[0];
    assert_eq!(op.schema, "store");
    assert_eq!(op.inserts["tmp1"]["site_id"], json!("site-7"));
    assert_eq!(op.inserts["tmp1"]["name"], json!("Widget"));
    assert!(op.conditions.is_empty());
}

#[test]
fn updates_carry_server_conditions() {
    let catalog = Catalog::load();
    let user = common::clerk();
    let loader = catalog.loader(&user);

    let request = save(json!({
        "operations": [{
            "type": "product",
            "updates": { "p-1": { "id": "p-1", "quantity": 9 } }
        }]
    }));
    let out = OperationEnforcer::default()
        .enforce_save(request, &user, &loader)
        .unwrap();

    let op = &out.operations[0];
    assert_eq!(op.conditions.len(), 1);
    assert_eq!(op.conditions[0].value, json!("site-7"));
}

#[test]
fn update_of_unwritable_field_rejects() {
    let catalog = Catalog::load();
    let user = common::clerk();
    let loader = catalog.loader(&user);

    let request = save(json!({
        "operations": [{
            "type": "product",
            "updates": { "p-1": { "id": "p-1", "site_id": "other" } }
        }]
    }));
    let err = OperationEnforcer::default()
        .enforce_save(request, &user, &loader)
        .unwrap_err();
    assert!(matches!(err, GuardError::FieldNotPermitted { ref field, .. } if field == "site_id"));
}

#[test]
fn delete_without_deleteable_rejects() {
    let catalog = Catalog::load();
    let user = common::clerk();
    let loader = catalog.loader(&user);

    let request = save(json!({
        "operations": [{ "type": "product", "deletes": { "p-1": { "id": "p-1" } } }]
    }));
    let err = OperationEnforcer::default()
        .enforce_save(request, &user, &loader)
        .unwrap_err();
    assert_eq!(err.to_string(), "Delete not permitted for model: product");
}

#[test]
fn non_object_record_is_a_bad_request() {
    let catalog = Catalog::load();
    let user = common::clerk();
    let loader = catalog.loader(&user);

    let request = save(json!({
        "operations": [{ "type": "product", "inserts": { "tmp1": 42 } }]
    }));
    let err = OperationEnforcer::default()
        .enforce_save(request, &user, &loader)
        .unwrap_err();
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}
