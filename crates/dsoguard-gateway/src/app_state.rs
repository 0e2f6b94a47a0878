//! Shared application state for the dsoguard gateway.
//!
//! Built once at boot from a validated config. Startup errors are returned,
//! not panicked, so `main` can report them and exit.

use std::sync::Arc;
use std::time::Duration;

use dsoguard_core::error::Result;
use dsoguard_core::{FieldPathResolver, OperationEnforcer};

use crate::catalog::MetadataCatalog;
use crate::config::GatewayConfig;
use crate::context::SessionStore;
use crate::executor::{DryRunExecutor, Executor};
use crate::obs::metrics::GuardMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    sessions: Arc<SessionStore>,
    executor: Arc<dyn Executor>,
    metrics: Arc<GuardMetrics>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    catalog: MetadataCatalog,
    enforcer: OperationEnforcer,
}

impl AppState {
    /// Build state with the dry-run executor.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let catalog = MetadataCatalog::new(
            cfg.catalog.entities.clone(),
            cfg.catalog.permission_sets.clone(),
        )?;
        let enforcer =
            OperationEnforcer::new(FieldPathResolver::new(cfg.gateway.max_relationship_depth));

        let sessions = SessionStore::new(Duration::from_secs(cfg.auth.session_ttl_secs));
        for seed in &cfg.auth.sessions {
            sessions.insert_static(seed.token.clone(), seed.principal(&cfg.auth.admin_profile));
        }
        tracing::info!(
            entities = catalog.entity_count(),
            profiles = catalog.permission_sets().len(),
            sessions = sessions.len(),
            "catalog loaded"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                catalog,
                enforcer,
            }),
            sessions: Arc::new(sessions),
            executor: Arc::new(DryRunExecutor::new()),
            metrics: Arc::new(GuardMetrics::default()),
        })
    }

    /// Swap the executor requests are forwarded to.
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn catalog(&self) -> &MetadataCatalog {
        &self.inner.catalog
    }

    pub fn enforcer(&self) -> &OperationEnforcer {
        &self.inner.enforcer
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn executor(&self) -> Arc<dyn Executor> {
        Arc::clone(&self.executor)
    }

    pub fn metrics(&self) -> &GuardMetrics {
        &self.metrics
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }

    /// Point-in-time gauges appended to `/metrics`.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("dsoguard_sessions", self.sessions.len() as u64),
            ("dsoguard_catalog_entities", self.inner.catalog.entity_count() as u64),
        ]
    }
}
