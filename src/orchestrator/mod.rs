//! Phase driver: run every target, then feed the result sets through each module.
mod barrier;


use std::sync::Arc;

use serde_json::Map;
use tokio::sync::mpsc;
use tracing::{Instrument, Span, debug, info, info_span};

use crate::error::{AppError, AppResult, HttpError};
use crate::http::{Settings, TestRunner};
use crate::modules::{Module, ModuleContext};
use crate::results::ResultSet;

pub use barrier::{PhaseBarrier, PhaseTicket};

/// Owns the targets and the ordered module chain for one run.
pub struct Orchestrator {
    targets: Vec<Arc<Settings>>,
    modules: Vec<Box<dyn Module>>,
    barrier: PhaseBarrier,
    debug: bool,
}

impl Orchestrator {
    #[must_use]
    pub fn new(targets: Vec<Settings>, debug: bool) -> Self {
        Self {
            targets: targets.into_iter().map(Arc::new).collect(),
            modules: Vec::new(),
            barrier: PhaseBarrier::new(),
            debug,
        }
    }

    /// Appends a module; modules run in the order they were added.
    pub fn push_module(&mut self, module: Box<dyn Module>) {
        self.modules.push(module);
    }

    #[must_use]
    pub fn with_module<M>(mut self, module: M) -> Self
    where
        M: Module + 'static,
    {
        self.push_module(Box::new(module));
        self
    }

    #[must_use]
    pub fn barrier(&self) -> PhaseBarrier {
        self.barrier.clone()
    }

    #[must_use]
    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|module| module.name()).collect()
    }

    /// Runs every phase and returns the final result sets, one per target in target order.
    ///
    /// # Errors
    ///
    /// Returns an error when a runner cannot start, a result set goes missing,
    /// a worker panics, or a module reports an unrecoverable failure.
    pub async fn run(self) -> AppResult<Vec<ResultSet>> {
        let Self {
            targets,
            modules,
            barrier,
            debug,
        } = self;

        let modules = init_modules(modules, &barrier, debug);

        let mut result_sets = run_tests(&targets, &barrier).await?;
        for set in &result_sets {
            let summary = set.summary();
            info!(
                "Target {} ({}): {} results, {} non-2xx, mean round trip {:?}",
                set.target().saturating_add(1),
                set.url(),
                summary.results,
                summary.non_success,
                summary.mean_round_trip
            );
        }

        for (module, span) in &modules {
            result_sets = run_module(module, span, result_sets, &barrier).await?;
        }

        Ok(result_sets)
    }
}

fn init_modules(
    modules: Vec<Box<dyn Module>>,
    barrier: &PhaseBarrier,
    debug: bool,
) -> Vec<(Arc<dyn Module>, Span)> {
    let mut field_mappings = Map::new();
    for module in &modules {
        if let Some(mapping) = module.field_mappings() {
            field_mappings.insert(module.name().to_owned(), mapping);
        }
    }

    modules
        .into_iter()
        .map(|mut module| {
            let span = info_span!("module", name = module.name());
            module.init(ModuleContext {
                barrier: barrier.clone(),
                span: span.clone(),
                debug,
                field_mappings: field_mappings.clone(),
            });
            (Arc::from(module), span)
        })
        .collect()
}

async fn run_tests(targets: &[Arc<Settings>], barrier: &PhaseBarrier) -> AppResult<Vec<ResultSet>> {
    let (results_tx, mut results_rx) = mpsc::channel::<ResultSet>(targets.len().max(1));

    let mut runners = Vec::with_capacity(targets.len());
    for (target, settings) in targets.iter().enumerate() {
        runners.push(TestRunner::new(target, Arc::clone(settings))?);
    }
    for runner in runners {
        let ticket = barrier.ticket();
        tokio::spawn(runner.run(results_tx.clone(), ticket));
    }
    drop(results_tx);

    barrier.wait().await;
    debug!("All {} test runners signaled completion", targets.len());

    let mut slots: Vec<Option<ResultSet>> = targets.iter().map(|_| None).collect();
    for _ in 0..targets.len() {
        let Some(set) = results_rx.recv().await else {
            break;
        };
        if let Some(slot) = slots.get_mut(set.target()) {
            *slot = Some(set);
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(target, slot)| {
            slot.ok_or_else(|| AppError::http(HttpError::MissingResultSet { target }))
        })
        .collect()
}

async fn run_module(
    module: &Arc<dyn Module>,
    span: &Span,
    result_sets: Vec<ResultSet>,
    barrier: &PhaseBarrier,
) -> AppResult<Vec<ResultSet>> {
    info!("Starting module {}", module.name());
    module.prepare().instrument(span.clone()).await;

    let mut handles = Vec::with_capacity(result_sets.len());
    for set in result_sets {
        debug!("Module {} processing {}", module.name(), set.url());
        let module = Arc::clone(module);
        let ticket = barrier.ticket();
        let worker = async move {
            let outcome = module.run(set).await;
            ticket.done();
            outcome
        };
        handles.push(tokio::spawn(worker.instrument(span.clone())));
    }

    barrier.wait().await;

    let mut processed = Vec::with_capacity(handles.len());
    let mut fatal = None;
    for handle in handles {
        match handle.await? {
            Ok(set) => processed.push(set),
            Err(err) => {
                if fatal.is_none() {
                    fatal = Some(err);
                }
            }
        }
    }
    if let Some(err) = fatal {
        return Err(err);
    }

    info!("Module {} completed", module.name());
    Ok(processed)
}
