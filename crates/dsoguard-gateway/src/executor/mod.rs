//! Executor seam: where regulated requests go once enforcement passes.
//!
//! The SQL-proxy transport is an external collaborator; the gateway only
//! depends on this trait. `DryRunExecutor` echoes the regulated request.

use async_trait::async_trait;
use serde_json::Value;

use dsoguard_core::error::{GuardError, Result};
use dsoguard_core::protocol::{RegulatedLoad, RegulatedSave};

#[async_trait]
pub trait Executor: Send + Sync {
    fn name(&self) -> &'static str;
    async fn load(&self, request: RegulatedLoad) -> Result<Value>;
    async fn save(&self, request: RegulatedSave) -> Result<Value>;
}

/// Returns what would have been forwarded.
#[derive(Default)]
pub struct DryRunExecutor;

impl DryRunExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for DryRunExecutor {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    async fn load(&self, request: RegulatedLoad) -> Result<Value> {
        serde_json::to_value(&request)
            .map_err(|e| GuardError::Internal(format!("encode regulated load: {e}")))
    }

    async fn save(&self, request: RegulatedSave) -> Result<Value> {
        serde_json::to_value(&request)
            .map_err(|e| GuardError::Internal(format!("encode regulated save: {e}")))
    }
}
