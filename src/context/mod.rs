//! Per-invocation validation state.
//!
//! A [`ValidationContext`] is created (or taken from a [`Pool`]) for every
//! top-level validation call and is never shared between calls. It carries
//! the active scene, field filter, cancellation state, user metadata and
//! the shared error collector. Nested records are validated through child
//! contexts that share the collector and cancellation state of their
//! parent.

mod pool;
mod request;

pub use pool::{Pool, Recycle};
pub use request::{CancellationToken, RequestBuilder, ValidationRequest};

use crate::collector::ErrorCollector;
use crate::core::Scene;
use crate::inspect::TypeInspector;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Default nesting limit for nested record validation.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Include/exclude selection of top-level fields.
///
/// An empty filter selects every field. Exclusion wins over inclusion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldFilter {
    include: Option<HashSet<String>>,
    exclude: HashSet<String>,
}

impl FieldFilter {
    pub fn new(include: Option<&[String]>, exclude: &[String]) -> Self {
        Self {
            include: include.map(|fields| fields.iter().cloned().collect()),
            exclude: exclude.iter().cloned().collect(),
        }
    }

    pub fn allows(&self, field: &str) -> bool {
        if self.exclude.contains(field) {
            return false;
        }
        self.include
            .as_ref()
            .map_or(true, |include| include.contains(field))
    }

    /// Selection for a field known under several names.
    ///
    /// Excluding any of the names drops the field; including any of them
    /// keeps it.
    pub fn allows_any(&self, names: &[&str]) -> bool {
        if names.iter().any(|name| self.exclude.contains(*name)) {
            return false;
        }
        self.include
            .as_ref()
            .map_or(true, |include| names.iter().any(|name| include.contains(*name)))
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_empty()
    }
}

/// Mutable state of one validation invocation.
pub struct ValidationContext {
    invocation_id: Uuid,
    scene: Scene,
    depth: usize,
    max_depth: usize,
    namespace: Option<String>,
    filter: FieldFilter,
    metadata: RwLock<HashMap<String, Value>>,
    collector: Arc<dyn ErrorCollector>,
    inspector: Arc<TypeInspector>,
    deadline: Option<DateTime<Utc>>,
    cancellation: Option<CancellationToken>,
}

impl ValidationContext {
    /// Create an idle context around a collector and an inspector.
    pub fn new(collector: Arc<dyn ErrorCollector>, inspector: Arc<TypeInspector>) -> Self {
        Self {
            invocation_id: Uuid::nil(),
            scene: Scene::NONE,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            namespace: None,
            filter: FieldFilter::default(),
            metadata: RwLock::new(HashMap::new()),
            collector,
            inspector,
            deadline: None,
            cancellation: None,
        }
    }

    /// Load a request into this context and assign a fresh invocation id.
    pub fn prepare(&mut self, request: &ValidationRequest<'_>, max_errors: usize, max_depth: usize) {
        self.invocation_id = Uuid::new_v4();
        self.scene = request.scene();
        self.depth = 0;
        self.max_depth = max_depth;
        self.namespace = None;
        self.filter = FieldFilter::new(request.include(), request.exclude());
        self.deadline = request.deadline();
        self.cancellation = request.cancellation().cloned();
        *self.metadata_mut() = request.metadata().clone();
        self.collector.set_max_errors(max_errors);
    }

    /// Context for a nested record reached through `namespace`.
    ///
    /// The child shares the collector, inspector and cancellation state; the
    /// field filter only applies at the top level, so the child has none.
    pub fn child(&self, namespace: impl Into<String>) -> ValidationContext {
        ValidationContext {
            invocation_id: self.invocation_id,
            scene: self.scene,
            depth: self.depth + 1,
            max_depth: self.max_depth,
            namespace: Some(namespace.into()),
            filter: FieldFilter::default(),
            metadata: RwLock::new(self.metadata_snapshot()),
            collector: Arc::clone(&self.collector),
            inspector: Arc::clone(&self.inspector),
            deadline: self.deadline,
            cancellation: self.cancellation.clone(),
        }
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    pub fn scene(&self) -> Scene {
        self.scene
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether nested records may still be descended into.
    pub fn can_descend(&self) -> bool {
        self.depth < self.max_depth
    }

    /// Namespace prefix of a nested context; `None` at the top level.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Full error namespace of `field`.
    ///
    /// At the top level this is `Root.field`, in a child context it extends
    /// the child's namespace.
    pub fn path(&self, root: &str, field: &str) -> String {
        match &self.namespace {
            Some(prefix) => format!("{prefix}.{field}"),
            None => format!("{root}.{field}"),
        }
    }

    pub fn filter(&self) -> &FieldFilter {
        &self.filter
    }

    pub fn is_selected(&self, field: &str) -> bool {
        self.filter.allows(field)
    }

    /// Like [`is_selected`](Self::is_selected) for a field with aliases.
    pub fn is_selected_any(&self, names: &[&str]) -> bool {
        self.filter.allows_any(names)
    }

    pub fn collector(&self) -> &dyn ErrorCollector {
        self.collector.as_ref()
    }

    pub fn shared_collector(&self) -> Arc<dyn ErrorCollector> {
        Arc::clone(&self.collector)
    }

    pub fn inspector(&self) -> &TypeInspector {
        &self.inspector
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// True once the caller cancelled or the deadline passed.
    pub fn is_cancelled(&self) -> bool {
        let token = self
            .cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled);
        let expired = self.deadline.is_some_and(|deadline| Utc::now() >= deadline);
        token || expired
    }

    pub fn metadata(&self, key: &str) -> Option<Value> {
        self.metadata
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn set_metadata(&self, key: impl Into<String>, value: Value) {
        self.metadata
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
    }

    pub fn remove_metadata(&self, key: &str) -> Option<Value> {
        self.metadata
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    pub fn metadata_snapshot(&self) -> HashMap<String, Value> {
        self.metadata
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn metadata_mut(&mut self) -> &mut HashMap<String, Value> {
        self.metadata
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Recycle for ValidationContext {
    fn recycle(&mut self) {
        self.invocation_id = Uuid::nil();
        self.scene = Scene::NONE;
        self.depth = 0;
        self.max_depth = DEFAULT_MAX_DEPTH;
        self.namespace = None;
        self.filter = FieldFilter::default();
        self.deadline = None;
        self.cancellation = None;
        self.metadata_mut().clear();
        self.collector.clear();
    }
}

impl fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("invocation_id", &self.invocation_id)
            .field("scene", &self.scene)
            .field("depth", &self.depth)
            .field("namespace", &self.namespace)
            .field("filter", &self.filter)
            .field("errors", &self.collector.count())
            .field("deadline", &self.deadline)
            .finish()
    }
}
