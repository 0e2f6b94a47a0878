//! YAML catalog fixture shared by the integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;

use serde::Deserialize;

use dsoguard_core::model::Entity;
use dsoguard_core::{GuardError, PermissionResolver, PermissionSet, PermissionSets, Result, UserInfo};

#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub permission_sets: Vec<PermissionSet>,
}

pub struct Catalog {
    entities: HashMap<String, Entity>,
    sets: PermissionSets,
}

impl Catalog {
    pub fn load() -> Self {
        let raw = fs::read_to_string("tests/fixtures/catalog.yaml").unwrap();
        let fixture: CatalogFixture = serde_yaml::from_str(&raw).expect("invalid catalog fixture");
        Self {
            entities: fixture
                .entities
                .into_iter()
                .map(|e| (e.name.clone(), e))
                .collect(),
            sets: PermissionSets::new(fixture.permission_sets),
        }
    }

    pub fn base(&self, name: &str) -> &Entity {
        self.entities.get(name).unwrap()
    }

    pub fn sets(&self) -> &PermissionSets {
        &self.sets
    }

    /// Loader closure merging the principal's overrides, as the catalog does.
    pub fn loader<'a>(&'a self, principal: &'a UserInfo) -> impl Fn(&str) -> Result<Entity> + 'a {
        move |name: &str| {
            let base = self
                .entities
                .get(name)
                .ok_or_else(|| GuardError::EntityNotFound(name.to_string()))?;
            Ok(PermissionResolver::for_principal(&self.sets, principal).effective_entity(base))
        }
    }
}

pub fn guest() -> UserInfo {
    UserInfo::default()
        .with_profile("Guest")
        .with_field("id", "u-1")
        .with_field("site_id", "site-42")
}

pub fn clerk() -> UserInfo {
    UserInfo::default()
        .with_profile("Clerk")
        .with_field("id", "u-2")
        .with_field("site_id", "site-7")
}

pub fn admin() -> UserInfo {
    UserInfo::default()
        .with_profile("Nobody")
        .with_field("site_id", "hq")
        .with_admin(true)
}
