use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use dsoguard_core::error::{GuardError, Result};
use dsoguard_core::fieldpath::DEFAULT_MAX_DEPTH;
use dsoguard_core::model::Entity;
use dsoguard_core::{PermissionSet, UserInfo};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub auth: AuthSection,

    #[serde(default)]
    pub catalog: CatalogSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(GuardError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.auth.validate()?;
        self.catalog.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_max_relationship_depth")]
    pub max_relationship_depth: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_relationship_depth: default_max_relationship_depth(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=32).contains(&self.max_relationship_depth) {
            return Err(GuardError::BadRequest(
                "gateway.max_relationship_depth must be between 1 and 32".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_max_relationship_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Principals on this profile bypass permission sets.
    #[serde(default = "default_admin_profile")]
    pub admin_profile: String,

    /// Static sessions seeded at boot (never expire).
    #[serde(default)]
    pub sessions: Vec<SessionSeed>,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl_secs(),
            admin_profile: default_admin_profile(),
            sessions: Vec::new(),
        }
    }
}

impl AuthSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=86400).contains(&self.session_ttl_secs) {
            return Err(GuardError::BadRequest(
                "auth.session_ttl_secs must be between 1 and 86400".into(),
            ));
        }
        let mut seen = HashSet::new();
        for s in &self.sessions {
            if s.token.is_empty() {
                return Err(GuardError::BadRequest("auth.sessions[].token must not be empty".into()));
            }
            if !seen.insert(s.token.as_str()) {
                return Err(GuardError::BadRequest(format!(
                    "auth.sessions has duplicate token for profile {}",
                    s.profile
                )));
            }
        }
        Ok(())
    }
}

fn default_session_ttl_secs() -> u64 {
    3600
}
fn default_admin_profile() -> String {
    "Admin".into()
}

/// A session to register: seeded from config, or issued over HTTP.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSeed {
    pub token: String,
    pub profile: String,
    #[serde(default)]
    pub fields: HashMap<String, String>,
    #[serde(default)]
    pub idp_claims: HashMap<String, Vec<String>>,
}

impl SessionSeed {
    /// Principal for this session. Admin when the profile is `admin_profile`.
    pub fn principal(&self, admin_profile: &str) -> UserInfo {
        let mut principal = UserInfo::new(self.fields.clone())
            .with_profile(self.profile.clone())
            .with_admin(self.profile == admin_profile);
        for (name, values) in &self.idp_claims {
            principal = principal.with_idp_claim(name.clone(), values.clone());
        }
        principal
    }
}

/// Entity metadata and permission sets served by the in-process catalog.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSection {
    #[serde(default)]
    pub entities: Vec<Entity>,

    #[serde(default)]
    pub permission_sets: Vec<PermissionSet>,
}

impl CatalogSection {
    pub fn validate(&self) -> Result<()> {
        if self.entities.is_empty() {
            return Err(GuardError::BadRequest("catalog.entities must not be empty".into()));
        }
        let mut names = HashSet::new();
        for e in &self.entities {
            if !names.insert(e.name.as_str()) {
                return Err(GuardError::BadRequest(format!(
                    "catalog.entities has duplicate entity: {}",
                    e.name
                )));
            }
        }
        let mut profiles = HashSet::new();
        for p in &self.permission_sets {
            if !profiles.insert(p.name.as_str()) {
                return Err(GuardError::BadRequest(format!(
                    "catalog.permission_sets has duplicate profile: {}",
                    p.name
                )));
            }
        }
        Ok(())
    }
}
