//! Post-processing stages that run over each target's result set.
//!
//! A module is initialized once by the orchestrator, prepared once before its
//! phase, then run by one worker per target. Workers receive the result set by
//! value and hand it back, so no two workers ever share a set.
pub mod bulk;
pub mod geo;
mod policy;


use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::Span;

use crate::error::AppResult;
use crate::orchestrator::PhaseBarrier;
use crate::results::ResultSet;

pub use policy::{FailurePolicy, FailureTracker};

/// Values handed to a module before any of its workers run.
#[derive(Debug, Clone)]
pub struct ModuleContext {
    pub barrier: PhaseBarrier,
    /// Span every worker of this module is instrumented with.
    pub span: Span,
    pub debug: bool,
    /// Field mappings contributed by all registered modules, keyed by module name.
    pub field_mappings: Map<String, Value>,
}

impl Default for ModuleContext {
    fn default() -> Self {
        Self {
            barrier: PhaseBarrier::default(),
            span: Span::none(),
            debug: false,
            field_mappings: Map::new(),
        }
    }
}

#[async_trait]
pub trait Module: Send + Sync {
    /// Key used for this module's enrichment payloads and logs.
    fn name(&self) -> &'static str;

    /// Index mapping fragment for the fields this module writes under its name.
    fn field_mappings(&self) -> Option<Value> {
        None
    }

    fn init(&mut self, context: ModuleContext);

    /// One-time setup run by the orchestrator before this module's workers start.
    async fn prepare(&self) {}

    /// Processes one target's result set and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures that must abort the whole run.
    async fn run(&self, results: ResultSet) -> AppResult<ResultSet>;
}
