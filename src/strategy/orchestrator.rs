//! Priority-ordered strategy dispatch.

use super::{ExecutionMode, Strategy, StrategyError, StrategyKind};
use crate::context::ValidationContext;
use crate::core::FieldError;
use crate::inspect::Validatable;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{trace, warn};

/// Why an orchestration run ended early.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("validation cancelled")]
    Cancelled,

    #[error("strategy '{strategy}' failed: {source}")]
    StrategyFailed {
        strategy: &'static str,
        #[source]
        source: StrategyError,
    },
}

struct Registered {
    strategy: Arc<dyn Strategy>,
    priority: i32,
}

/// Runs registered strategies against one record.
///
/// Strategies run in ascending priority; equal priorities keep their
/// registration order.
///
/// In sequential mode a strategy returning `Err` stops the run with
/// [`OrchestrationError::StrategyFailed`]. In parallel mode every strategy
/// runs to completion and errors are only recorded. Both modes record a
/// synthetic [`FieldError`] for every strategy error, and convert a panic
/// into a `panic` field error without stopping the run.
///
/// # Example
///
/// ```rust
/// use scenegate::strategy::{BusinessStrategy, ExecutionMode, Orchestrator, StrategyKind};
/// use std::sync::Arc;
///
/// let mut orchestrator = Orchestrator::new();
/// orchestrator.register(Arc::new(BusinessStrategy::new()), 20);
/// orchestrator.set_execution_mode(ExecutionMode::Parallel);
///
/// assert_eq!(orchestrator.kinds(), vec![StrategyKind::Business]);
/// assert_eq!(orchestrator.unregister(&StrategyKind::Business), 1);
/// assert!(orchestrator.is_empty());
/// ```
#[derive(Default)]
pub struct Orchestrator {
    strategies: Vec<Registered>,
    mode: ExecutionMode,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a strategy; lower priorities run first.
    pub fn register(&mut self, strategy: Arc<dyn Strategy>, priority: i32) {
        let position = self
            .strategies
            .iter()
            .position(|entry| entry.priority > priority)
            .unwrap_or(self.strategies.len());
        self.strategies.insert(position, Registered { strategy, priority });
    }

    /// Remove every strategy of `kind`, returning how many were removed.
    pub fn unregister(&mut self, kind: &StrategyKind) -> usize {
        let before = self.strategies.len();
        self.strategies
            .retain(|entry| entry.strategy.kind() != *kind);
        before - self.strategies.len()
    }

    pub fn set_execution_mode(&mut self, mode: ExecutionMode) {
        self.mode = mode;
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Registered kinds in execution order.
    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies
            .iter()
            .map(|entry| entry.strategy.kind())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run every strategy against `target`.
    pub fn execute(
        &self,
        target: &dyn Validatable,
        ctx: &ValidationContext,
    ) -> Result<(), OrchestrationError> {
        match self.mode {
            ExecutionMode::Sequential => self.execute_sequential(target, ctx),
            ExecutionMode::Parallel => self.execute_parallel(target, ctx),
        }
    }

    fn execute_sequential(
        &self,
        target: &dyn Validatable,
        ctx: &ValidationContext,
    ) -> Result<(), OrchestrationError> {
        for entry in &self.strategies {
            let strategy = entry.strategy.as_ref();

            if ctx.collector().is_full() {
                trace!(strategy = strategy.name(), "collector full, stopping");
                break;
            }
            if ctx.is_cancelled() {
                return Err(OrchestrationError::Cancelled);
            }

            trace!(strategy = strategy.name(), priority = entry.priority, "running strategy");
            if let Err(source) = run_guarded(strategy, target, ctx) {
                record_failure(strategy.name(), &source, ctx);
                return Err(OrchestrationError::StrategyFailed {
                    strategy: strategy.name(),
                    source,
                });
            }
        }
        Ok(())
    }

    fn execute_parallel(
        &self,
        target: &dyn Validatable,
        ctx: &ValidationContext,
    ) -> Result<(), OrchestrationError> {
        if ctx.is_cancelled() {
            return Err(OrchestrationError::Cancelled);
        }

        let failures: Vec<(&'static str, StrategyError)> = thread::scope(|scope| {
            let handles: Vec<_> = self
                .strategies
                .iter()
                .map(|entry| {
                    let strategy = entry.strategy.as_ref();
                    trace!(strategy = strategy.name(), "spawning strategy");
                    (
                        strategy.name(),
                        scope.spawn(move || run_guarded(strategy, target, ctx)),
                    )
                })
                .collect();

            handles
                .into_iter()
                .filter_map(|(name, handle)| match handle.join() {
                    Ok(Ok(())) => None,
                    Ok(Err(source)) => Some((name, source)),
                    // run_guarded already caught the panic
                    Err(_) => None,
                })
                .collect()
        });

        for (name, source) in &failures {
            record_failure(name, source, ctx);
        }

        if ctx.is_cancelled() {
            return Err(OrchestrationError::Cancelled);
        }
        Ok(())
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("strategies", &self.kinds())
            .field("mode", &self.mode)
            .finish()
    }
}

/// Run one strategy, turning a panic into a `panic` field error.
fn run_guarded(
    strategy: &dyn Strategy,
    target: &dyn Validatable,
    ctx: &ValidationContext,
) -> Result<(), StrategyError> {
    match panic::catch_unwind(AssertUnwindSafe(|| strategy.validate(target, ctx))) {
        Ok(result) => result,
        Err(payload) => {
            let detail = panic_message(payload.as_ref());
            warn!(strategy = strategy.name(), %detail, "strategy panicked");
            ctx.collector().add(FieldError::panic(strategy.name(), detail));
            Ok(())
        }
    }
}

fn record_failure(name: &str, source: &StrategyError, ctx: &ValidationContext) {
    warn!(strategy = name, error = %source, "strategy failed");
    ctx.collector()
        .add(FieldError::strategy_error(name, source.to_string()));
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}
