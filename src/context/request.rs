//! Validation requests.

use crate::core::Scene;
use crate::inspect::Validatable;
use crate::validator::BuildError;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation handle shared between a caller and a running
/// validation.
///
/// Strategies check it between field checks; nothing is interrupted
/// mid-check.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Input of one validation call.
///
/// Immutable once handed to the validator; the `with_*` methods consume
/// and return the request.
///
/// # Example
///
/// ```rust
/// use scenegate::context::ValidationRequest;
/// use scenegate::core::Scene;
/// use scenegate::inspect::Record;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Item {
///     sku: String,
/// }
///
/// impl Record for Item {}
///
/// let item = Item { sku: "A-1".to_string() };
/// let request = ValidationRequest::new(&item, Scene::UPDATE)
///     .with_include(["sku"])
///     .with_max_errors(5);
///
/// assert_eq!(request.scene(), Scene::UPDATE);
/// assert_eq!(request.max_errors(), Some(5));
/// ```
pub struct ValidationRequest<'a> {
    target: &'a dyn Validatable,
    scene: Scene,
    include: Option<Vec<String>>,
    exclude: Vec<String>,
    deadline: Option<DateTime<Utc>>,
    cancellation: Option<CancellationToken>,
    metadata: HashMap<String, Value>,
    max_errors: Option<usize>,
}

impl<'a> ValidationRequest<'a> {
    pub fn new(target: &'a dyn Validatable, scene: Scene) -> Self {
        Self {
            target,
            scene,
            include: None,
            exclude: Vec::new(),
            deadline: None,
            cancellation: None,
            metadata: HashMap::new(),
            max_errors: None,
        }
    }

    pub fn builder() -> RequestBuilder<'a> {
        RequestBuilder::new()
    }

    /// Only validate these fields.
    pub fn with_include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Never validate these fields.
    pub fn with_exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Override the validator's error budget for this call.
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = Some(max_errors);
        self
    }

    pub fn target(&self) -> &'a dyn Validatable {
        self.target
    }

    pub fn scene(&self) -> Scene {
        self.scene
    }

    pub fn include(&self) -> Option<&[String]> {
        self.include.as_deref()
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    pub fn max_errors(&self) -> Option<usize> {
        self.max_errors
    }
}

impl fmt::Debug for ValidationRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRequest")
            .field("target", &self.target.type_name())
            .field("scene", &self.scene)
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("deadline", &self.deadline)
            .field("max_errors", &self.max_errors)
            .finish()
    }
}

/// Builder for requests assembled piece by piece.
pub struct RequestBuilder<'a> {
    target: Option<&'a dyn Validatable>,
    scene: Scene,
    include: Option<Vec<String>>,
    exclude: Vec<String>,
    deadline: Option<DateTime<Utc>>,
    cancellation: Option<CancellationToken>,
    metadata: HashMap<String, Value>,
    max_errors: Option<usize>,
}

impl<'a> RequestBuilder<'a> {
    pub fn new() -> Self {
        Self {
            target: None,
            scene: Scene::NONE,
            include: None,
            exclude: Vec::new(),
            deadline: None,
            cancellation: None,
            metadata: HashMap::new(),
            max_errors: None,
        }
    }

    /// Set the record to validate (required).
    pub fn target(mut self, target: &'a dyn Validatable) -> Self {
        self.target = Some(target);
        self
    }

    pub fn scene(mut self, scene: Scene) -> Self {
        self.scene = scene;
        self
    }

    pub fn include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = Some(max_errors);
        self
    }

    pub fn build(self) -> Result<ValidationRequest<'a>, BuildError> {
        let target = self.target.ok_or(BuildError::MissingTarget)?;

        Ok(ValidationRequest {
            target,
            scene: self.scene,
            include: self.include,
            exclude: self.exclude,
            deadline: self.deadline,
            cancellation: self.cancellation,
            metadata: self.metadata,
            max_errors: self.max_errors,
        })
    }
}

impl Default for RequestBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}
