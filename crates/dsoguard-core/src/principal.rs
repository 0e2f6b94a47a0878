//! Authenticated principal surface consumed by the engine.
//!
//! Principals are built by the authentication layer and are immutable for the
//! lifetime of one request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Well-known principal field holding the active permission set name.
pub const PROFILE_NAME_FIELD: &str = "profile_name";

pub trait Principal: Send + Sync {
    fn is_admin(&self) -> bool;
    fn field_value(&self, name: &str) -> Option<&str>;
    fn identity_provider_claim(&self, name: &str) -> Option<&[String]>;

    fn profile_name(&self) -> &str {
        self.field_value(PROFILE_NAME_FIELD).unwrap_or_default()
    }
}

/// Default principal: a flat field table plus identity-provider claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    fields: HashMap<String, String>,
    #[serde(default)]
    idp_claims: HashMap<String, Vec<String>>,
    #[serde(default)]
    admin: bool,
}

impl UserInfo {
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_profile(self, profile: impl Into<String>) -> Self {
        self.with_field(PROFILE_NAME_FIELD, profile)
    }

    pub fn with_idp_claim(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.idp_claims.insert(name.into(), values);
        self
    }

    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }
}

impl Principal for UserInfo {
    fn is_admin(&self) -> bool {
        self.admin
    }

    fn field_value(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    fn identity_provider_claim(&self, name: &str) -> Option<&[String]> {
        self.idp_claims.get(name).map(Vec::as_slice)
    }
}
