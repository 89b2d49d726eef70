//! Validator facade.
//!
//! A [`Validator`] wires the inspector, scene matcher, rule engine and
//! strategy orchestrator together and runs one validation per call:
//!
//! 1. acquire a context (pooled or fresh) and load the request into it
//! 2. run the record's `before_validation` hook
//! 3. execute every registered strategy
//! 4. run the record's `after_validation` hook
//! 5. assemble the result and release the context
//!
//! A failing hook, a cancelled run or a strategy fault in sequential mode
//! ends the call with an error; collected field errors are then discarded.
//! A panicking hook is reported as a hook failure.

mod builder;
mod config;
mod error;
mod result;

pub use builder::{BuildError, ValidatorBuilder};
pub use config::{ValidatorConfig, DEFAULT_POOL_CAPACITY};
pub use error::{HookPhase, ValidationError, ValidationErrors};
pub use result::ValidationResult;

use crate::collector::new_collector;
use crate::context::{Pool, ValidationContext, ValidationRequest};
use crate::core::Scene;
use crate::engine::RuleEngine;
use crate::inspect::{HookError, Record, TypeInspector, Validatable};
use crate::matcher::SceneMatcher;
use crate::strategy::{
    panic_message, BusinessStrategy, Orchestrator, RuleStrategy, BUSINESS_PRIORITY,
    RULE_PRIORITY,
};
use chrono::Utc;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Scene-aware validator for [`Record`] types.
///
/// # Example
///
/// ```rust
/// use scenegate::core::{RuleSet, Scene};
/// use scenegate::inspect::{Record, Schema};
/// use scenegate::validator::Validator;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User {
///     age: u32,
/// }
///
/// impl Record for User {
///     fn schema(schema: &mut Schema<Self>) {
///         schema.field("age", |u: &User| u.age);
///     }
///
///     fn rule_set() -> Option<RuleSet> {
///         Some(RuleSet::new().rule(Scene::CREATE, "age", "min=18"))
///     }
/// }
///
/// let validator = Validator::new();
/// let minor = User { age: 15 };
///
/// assert!(validator.validate(&minor, Scene::CREATE).is_err());
/// assert!(validator.validate(&minor, Scene::UPDATE).is_ok());
/// ```
pub struct Validator {
    config: ValidatorConfig,
    orchestrator: Orchestrator,
    inspector: Arc<TypeInspector>,
    matcher: Arc<SceneMatcher>,
    engine: Arc<dyn RuleEngine>,
    pool: Option<Pool<ValidationContext>>,
}

impl Validator {
    /// Validator with the default configuration.
    pub fn new() -> Self {
        ValidatorBuilder::new().assemble()
    }

    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    pub(crate) fn from_parts(
        config: ValidatorConfig,
        engine: Arc<dyn RuleEngine>,
        inspector: Arc<TypeInspector>,
    ) -> Self {
        let matcher = Arc::new(if config.cache_merged_rules {
            SceneMatcher::new()
        } else {
            SceneMatcher::uncached()
        });

        let mut orchestrator = Orchestrator::new();
        orchestrator.set_execution_mode(config.execution_mode);
        orchestrator.register(
            Arc::new(RuleStrategy::new(Arc::clone(&engine), Arc::clone(&matcher))),
            RULE_PRIORITY,
        );
        orchestrator.register(Arc::new(BusinessStrategy::new()), BUSINESS_PRIORITY);

        let pool = config.pool_contexts.then(|| {
            let kind = config.collector;
            let max_errors = config.max_errors;
            let inspector = Arc::clone(&inspector);
            Pool::new(config.pool_capacity, move || {
                ValidationContext::new(new_collector(kind, max_errors), Arc::clone(&inspector))
            })
        });

        Self {
            config,
            orchestrator,
            inspector,
            matcher,
            engine,
            pool,
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn inspector(&self) -> &Arc<TypeInspector> {
        &self.inspector
    }

    pub fn matcher(&self) -> &SceneMatcher {
        &self.matcher
    }

    pub fn rule_engine(&self) -> &Arc<dyn RuleEngine> {
        &self.engine
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Register or remove strategies after construction.
    pub fn orchestrator_mut(&mut self) -> &mut Orchestrator {
        &mut self.orchestrator
    }

    /// Validate `target` under `scene`.
    ///
    /// Returns `Ok(())` when no field error was collected and
    /// [`ValidationError::Invalid`] with every collected error otherwise.
    pub fn validate<T: Record>(&self, target: &T, scene: Scene) -> Result<(), ValidationError> {
        self.validate_request(&ValidationRequest::new(target, scene))?
            .into_result()
    }

    /// Run a full validation request.
    pub fn validate_request(
        &self,
        request: &ValidationRequest<'_>,
    ) -> Result<ValidationResult, ValidationError> {
        if request.max_errors() == Some(0) {
            return Err(ValidationError::InvalidRequest(
                "max_errors must be at least 1".to_string(),
            ));
        }
        let max_errors = request.max_errors().unwrap_or(self.config.max_errors);

        let mut ctx = self.acquire_context();
        ctx.prepare(request, max_errors, self.config.max_depth);

        let span = tracing::debug_span!(
            "validate",
            invocation_id = %ctx.invocation_id(),
            scene = %request.scene(),
            record = request.target().type_name(),
        );
        let _entered = span.enter();

        let started = Utc::now();
        let outcome = self.run(request.target(), &ctx).map(|()| {
            ValidationResult::new(
                ctx.collector().get_all(),
                request.scene(),
                ctx.invocation_id(),
                Utc::now() - started,
            )
        });

        match &outcome {
            Ok(result) => debug!(
                errors = result.error_count(),
                duration_us = result.duration.num_microseconds().unwrap_or(i64::MAX),
                "validation finished"
            ),
            Err(error) => debug!(%error, "validation aborted"),
        }

        self.release_context(ctx);
        outcome
    }

    fn run(&self, target: &dyn Validatable, ctx: &ValidationContext) -> Result<(), ValidationError> {
        let hooks = if target.inspect_with(&self.inspector).capabilities().lifecycle_hooks {
            target.lifecycle_hooks()
        } else {
            None
        };

        if let Some(hooks) = hooks {
            run_hook(HookPhase::BeforeValidation, || hooks.before_validation(ctx))?;
        }

        self.orchestrator.execute(target, ctx)?;

        if let Some(hooks) = hooks {
            run_hook(HookPhase::AfterValidation, || hooks.after_validation(ctx))?;
        }
        Ok(())
    }

    fn acquire_context(&self) -> ValidationContext {
        match &self.pool {
            Some(pool) => pool.acquire(),
            None => ValidationContext::new(
                new_collector(self.config.collector, self.config.max_errors),
                Arc::clone(&self.inspector),
            ),
        }
    }

    fn release_context(&self, ctx: ValidationContext) {
        if let Some(pool) = &self.pool {
            pool.release(ctx);
        }
    }
}

/// Call one lifecycle hook, turning an error or a panic into a hook failure.
fn run_hook<F>(phase: HookPhase, hook: F) -> Result<(), ValidationError>
where
    F: FnOnce() -> Result<(), HookError>,
{
    let message = match panic::catch_unwind(AssertUnwindSafe(hook)) {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(error)) => error.to_string(),
        Err(payload) => {
            let detail = panic_message(payload.as_ref());
            warn!(%phase, %detail, "lifecycle hook panicked");
            format!("hook panicked: {detail}")
        }
    };
    Err(ValidationError::Hook { phase, message })
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .field("orchestrator", &self.orchestrator)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
