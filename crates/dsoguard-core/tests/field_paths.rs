//! Field path expansion, join-key synthesis and union semantics.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::cell::Cell;

use dsoguard_core::fieldpath::join_key_id;
use dsoguard_core::model::{Crud, Entity};
use dsoguard_core::protocol::FieldSpec;
use dsoguard_core::{
    EntityCache, FieldPathResolver, GuardError, PermissionResolver, PermissionSet, ResolvedFieldSet,
};

use common::Catalog;

fn resolve(catalog: &Catalog, entity: &str, id: &str) -> dsoguard_core::Result<ResolvedFieldSet> {
    let user = common::guest();
    let loader = catalog.loader(&user);
    let mut cache = EntityCache::new(&loader);
    let root = cache.get(entity).unwrap();
    FieldPathResolver::default().resolve(&root, &FieldSpec::new(id), &mut cache)
}

fn ids(set: &ResolvedFieldSet) -> Vec<&str> {
    set.ids().collect()
}

#[test]
fn direct_field_resolves_to_itself() {
    let catalog = Catalog::load();
    let set = resolve(&catalog, "product", "name").unwrap();
    assert_eq!(ids(&set), vec!["name"]);
    assert!(set.get("name").unwrap().key_field.is_none());
}

#[test]
fn non_queryable_field_is_denied() {
    let catalog = Catalog::load();
    let err = resolve(&catalog, "product", "quantity").unwrap_err();
    assert!(matches!(err, GuardError::NoAccess(_)));
}

#[test]
fn id_field_is_always_queryable_on_a_queryable_entity() {
    let catalog = Catalog::load();
    let guest = common::guest();
    let product = PermissionResolver::for_principal(catalog.sets(), &guest)
        .effective_entity(catalog.base("product"));

    let id = product.field("id").unwrap();
    assert!(!id.access.queryable);
    assert!(product.find_queryable_field("id").is_some());
}

#[test]
fn non_queryable_entity_has_no_queryable_fields() {
    let mut entity = Entity {
        name: "x".into(),
        fields: vec![dsoguard_core::model::Field {
            name: "id".into(),
            is_id_field: true,
            access: Crud::ALL,
            ..Default::default()
        }],
        ..Entity::default()
    };
    assert!(entity.queryable_fields().is_empty());
    entity.access.queryable = true;
    assert_eq!(entity.queryable_fields().len(), 1);
}

#[test]
fn two_hop_path_adds_one_join_key() {
    let catalog = Catalog::load();
    let set = resolve(&catalog, "product", "category_id__rel.name").unwrap();
    assert_eq!(ids(&set), vec!["category_id", "category_id__rel.name"]);

    let join = set.get("category_id").unwrap();
    assert_eq!(join.key_field.as_deref(), Some("id"));
    assert_eq!(join.target_object.as_deref(), Some("category"));
    assert_eq!(join.target_schema.as_deref(), Some("store"));
}

#[test]
fn three_hop_path_adds_intermediate_join_keys() {
    let catalog = Catalog::load();
    let set = resolve(&catalog, "product", "category_id__rel.region_id__rel.name").unwrap();
    assert_eq!(
        ids(&set),
        vec![
            "category_id",
            "category_id__rel.region_id",
            "category_id__rel.region_id__rel.name",
        ]
    );
    let hop = set.get("category_id__rel.region_id").unwrap();
    assert_eq!(hop.target_object.as_deref(), Some("region"));
    assert_eq!(hop.target_schema.as_deref(), Some("geo"));
}

#[test]
fn four_hop_path_reproduces_intermediate_ids() {
    let catalog = Catalog::load();
    let path = "manager_id__rel.address_id__rel.city_id__rel.city";
    let set = resolve(&catalog, "employee", path).unwrap();
    assert_eq!(
        ids(&set),
        vec![
            "manager_id",
            "manager_id__rel.address_id",
            "manager_id__rel.address_id__rel.city_id",
            path,
        ]
    );
    assert!(!set.contains("manager_id__rel.address_id__rel"));

    let leaf = set.get(path).unwrap();
    assert_eq!(leaf, &FieldSpec::new(path));
    assert_eq!(
        set.get("manager_id__rel.address_id").unwrap().target_object.as_deref(),
        Some("address")
    );
}

#[test]
fn join_key_ids_follow_hop_position() {
    let parts = ["a_id__rel", "b_id__rel", "c_id__rel", "d"];
    assert_eq!(join_key_id(&parts, 4), "a_id");
    assert_eq!(join_key_id(&parts, 3), "a_id__rel.b_id");
    assert_eq!(join_key_id(&parts, 2), "a_id__rel.b_id__rel.c_id");
}

#[test]
fn denied_leaf_denies_whole_path() {
    let catalog = Catalog::load();
    let err = resolve(&catalog, "product", "category_id__rel.region_id__rel.secret_code");
    assert!(err.is_err());
}

#[test]
fn ambiguous_reference_is_denied() {
    let catalog = Catalog::load();
    let err = resolve(&catalog, "employee", "owner_id__rel.name").unwrap_err();
    assert!(matches!(err, GuardError::NoAccess(_)));
}

#[test]
fn segment_without_marker_is_rejected() {
    let catalog = Catalog::load();
    let err = resolve(&catalog, "product", "category_id.name").unwrap_err();
    assert!(matches!(err, GuardError::BadRequest(_)));
}

#[test]
fn depth_limit_denies_long_chains() {
    let catalog = Catalog::load();
    let user = common::guest();
    let loader = catalog.loader(&user);
    let mut cache = EntityCache::new(&loader);
    let root = cache.get("employee").unwrap();

    let long = FieldSpec::new("manager_id__rel.address_id__rel.city_id__rel.city");
    let err = FieldPathResolver::new(2).resolve(&root, &long, &mut cache).unwrap_err();
    assert!(matches!(err, GuardError::NoAccess(_)));
    assert!(FieldPathResolver::new(3).resolve(&root, &long, &mut cache).is_ok());
}

#[test]
fn child_relationship_keeps_only_allowed_sub_fields() {
    let catalog = Catalog::load();
    let user = common::guest();
    let loader = catalog.loader(&user);
    let mut cache = EntityCache::new(&loader);
    let root = cache.get("product").unwrap();

    let request = FieldSpec::child(
        "lines",
        "lines_anchor",
        vec![
            FieldSpec::new("quantity"),
            FieldSpec::new("unit_cost"),
            FieldSpec::new("product_id"),
        ],
    );
    let set = FieldPathResolver::default()
        .resolve(&root, &request, &mut cache)
        .unwrap();

    assert_eq!(ids(&set), vec!["lines"]);
    let lines = set.get("lines").unwrap();
    assert!(lines.child_relationship);
    let subs: Vec<_> = lines
        .sub_fields
        .as_ref()
        .unwrap()
        .iter()
        .map(|f| f.id.as_str())
        .collect();
    assert_eq!(subs, vec!["quantity", "product_id"]);
}

#[test]
fn child_relationship_without_key_access_is_denied() {
    let catalog = Catalog::load();
    let set = PermissionSet::new("Narrow")
        .grant_entity("product", Crud { queryable: true, ..Crud::NONE })
        .grant_entity("order_line", Crud { queryable: true, ..Crud::NONE })
        .grant_field("product", "lines_anchor", Crud { queryable: true, ..Crud::NONE })
        .grant_field("order_line", "quantity", Crud { queryable: true, ..Crud::NONE });
    let loader = |name: &str| -> dsoguard_core::Result<Entity> {
        Ok(PermissionResolver::new(Some(&set), false).effective_entity(catalog.base(name)))
    };
    let mut cache = EntityCache::new(&loader);
    let root = cache.get("product").unwrap();

    let request = FieldSpec::child("lines", "lines_anchor", vec![FieldSpec::new("quantity")]);
    let err = FieldPathResolver::default().resolve(&root, &request, &mut cache);
    assert!(err.is_err());
}

#[test]
fn child_relationship_requires_anchor() {
    let catalog = Catalog::load();
    let user = common::guest();
    let loader = catalog.loader(&user);
    let mut cache = EntityCache::new(&loader);
    let root = cache.get("product").unwrap();

    let mut request = FieldSpec::new("lines");
    request.child_relationship = true;
    let err = FieldPathResolver::default().resolve(&root, &request, &mut cache).unwrap_err();
    assert!(matches!(err, GuardError::BadRequest(_)));
}

#[test]
fn union_is_first_writer_wins() {
    let mut explicit = FieldSpec::new("category_id");
    explicit.name = Some("explicit".into());
    let mut artifact = FieldSpec::new("category_id");
    artifact.key_field = Some("id".into());

    let a = ResolvedFieldSet::single(explicit.clone());
    let b = ResolvedFieldSet::single(artifact).union(ResolvedFieldSet::single(FieldSpec::new("name")));

    let merged = a.clone().union(b);
    assert_eq!(merged.get("category_id"), Some(&explicit));
    assert_eq!(merged.ids().collect::<Vec<_>>(), vec!["category_id", "name"]);

    // re-merging the left operand changes nothing
    assert_eq!(merged.clone().union(a), merged);
}

#[test]
fn cache_memoizes_hits_and_failures() {
    let catalog = Catalog::load();
    let calls = Cell::new(0);
    let loader = |name: &str| -> dsoguard_core::Result<Entity> {
        calls.set(calls.get() + 1);
        match name {
            "product" | "category" => Ok(PermissionResolver::new(None, true).effective_entity(catalog.base(name))),
            other => Err(GuardError::EntityNotFound(other.to_string())),
        }
    };
    let mut cache = EntityCache::new(&loader);
    let root = cache.get("product").unwrap();

    let resolver = FieldPathResolver::default();
    resolver.resolve(&root, &FieldSpec::new("category_id__rel.name"), &mut cache).unwrap();
    resolver.resolve(&root, &FieldSpec::new("category_id__rel.id"), &mut cache).unwrap();
    assert_eq!(calls.get(), 2);

    assert!(cache.get("ghost").is_err());
    assert!(cache.get("ghost").is_err());
    assert_eq!(calls.get(), 3);

    let touched: Vec<_> = cache.touched().iter().map(|e| e.name.clone()).collect();
    assert_eq!(touched, vec!["product", "category"]);
}
