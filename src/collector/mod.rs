//! Bounded sinks for field errors.
//!
//! An [`ErrorCollector`] is owned by one validation invocation and shared
//! by every strategy in it, including strategies running on parallel
//! threads. Both implementations guard their state with a mutex so that
//! concurrent `add` calls are linearizable.
//!
//! Capacity exhaustion is a normal outcome: once `count() >= max_errors()`
//! further additions are rejected with `false` and the already collected
//! errors are kept.

mod grouped;
mod list;

pub use grouped::GroupedCollector;
pub use list::ListCollector;

use crate::core::FieldError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default error budget per invocation.
pub const DEFAULT_MAX_ERRORS: usize = 100;

/// Append-only, capacity-bounded sink for field errors.
pub trait ErrorCollector: Send + Sync {
    /// Add one error. Returns false once the collector is full.
    fn add(&self, error: FieldError) -> bool;

    /// Add errors in order, stopping at the first rejection.
    fn add_all(&self, errors: Vec<FieldError>) -> bool {
        for error in errors {
            if !self.add(error) {
                return false;
            }
        }
        true
    }

    /// Snapshot of every collected error.
    fn get_all(&self) -> Vec<FieldError>;

    fn count(&self) -> usize;

    fn has_errors(&self) -> bool {
        self.count() > 0
    }

    /// Remove every collected error; capacity is unchanged.
    fn clear(&self);

    fn max_errors(&self) -> usize;

    /// Change capacity. Errors already collected are never discarded.
    fn set_max_errors(&self, max: usize);

    fn is_full(&self) -> bool {
        self.count() >= self.max_errors()
    }
}

/// Selects an [`ErrorCollector`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorKind {
    /// Insertion order preserved
    #[default]
    List,
    /// Bucketed by field name
    Grouped,
}

/// Build a collector of the given kind.
pub fn new_collector(kind: CollectorKind, max_errors: usize) -> Arc<dyn ErrorCollector> {
    match kind {
        CollectorKind::List => Arc::new(ListCollector::new(max_errors)),
        CollectorKind::Grouped => Arc::new(GroupedCollector::new(max_errors)),
    }
}
