//! Field-bucketed collector.

use super::{ErrorCollector, DEFAULT_MAX_ERRORS};
use crate::core::FieldError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct GroupedState {
    // Field names in the order their first error arrived
    order: Vec<String>,
    buckets: HashMap<String, Vec<FieldError>>,
    count: usize,
    max_errors: usize,
}

/// Collector that groups errors by field name.
///
/// `get_all` flattens buckets in first-seen field order, and keeps
/// insertion order inside each bucket. Global insertion order across
/// different fields is therefore not preserved.
#[derive(Debug)]
pub struct GroupedCollector {
    state: Mutex<GroupedState>,
}

impl GroupedCollector {
    pub fn new(max_errors: usize) -> Self {
        Self {
            state: Mutex::new(GroupedState {
                max_errors,
                ..GroupedState::default()
            }),
        }
    }

    /// Errors collected for one field.
    pub fn errors_for(&self, field: &str) -> Vec<FieldError> {
        self.lock().buckets.get(field).cloned().unwrap_or_default()
    }

    /// Field names with at least one error, in first-seen order.
    pub fn fields(&self) -> Vec<String> {
        self.lock().order.clone()
    }

    fn lock(&self) -> MutexGuard<'_, GroupedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for GroupedCollector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ERRORS)
    }
}

impl GroupedState {
    fn push(&mut self, error: FieldError) -> bool {
        if self.count >= self.max_errors {
            return false;
        }
        match self.buckets.get_mut(&error.field) {
            Some(bucket) => bucket.push(error),
            None => {
                self.order.push(error.field.clone());
                self.buckets.insert(error.field.clone(), vec![error]);
            }
        }
        self.count += 1;
        true
    }
}

impl ErrorCollector for GroupedCollector {
    fn add(&self, error: FieldError) -> bool {
        self.lock().push(error)
    }

    fn add_all(&self, errors: Vec<FieldError>) -> bool {
        let mut state = self.lock();
        errors.into_iter().all(|error| state.push(error))
    }

    fn get_all(&self) -> Vec<FieldError> {
        let state = self.lock();
        state
            .order
            .iter()
            .filter_map(|field| state.buckets.get(field))
            .flat_map(|bucket| bucket.iter().cloned())
            .collect()
    }

    fn count(&self) -> usize {
        self.lock().count
    }

    fn clear(&self) {
        let mut state = self.lock();
        state.order.clear();
        state.buckets.clear();
        state.count = 0;
    }

    fn max_errors(&self) -> usize {
        self.lock().max_errors
    }

    fn set_max_errors(&self, max: usize) {
        self.lock().max_errors = max;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(field: &str, tag: &str) -> FieldError {
        FieldError::new(field, field, tag)
    }

    #[test]
    fn groups_by_field_in_first_seen_order() {
        let collector = GroupedCollector::new(10);
        collector.add(error("b", "min"));
        collector.add(error("a", "required"));
        collector.add(error("b", "max"));

        let flattened: Vec<(String, String)> = collector
            .get_all()
            .into_iter()
            .map(|e| (e.field, e.tag))
            .collect();

        assert_eq!(
            flattened,
            vec![
                ("b".to_string(), "min".to_string()),
                ("b".to_string(), "max".to_string()),
                ("a".to_string(), "required".to_string()),
            ]
        );
        assert_eq!(collector.fields(), vec!["b", "a"]);
    }

    #[test]
    fn errors_for_returns_one_bucket() {
        let collector = GroupedCollector::new(10);
        collector.add(error("a", "min"));
        collector.add(error("a", "max"));
        collector.add(error("b", "email"));

        assert_eq!(collector.errors_for("a").len(), 2);
        assert_eq!(collector.errors_for("b").len(), 1);
        assert!(collector.errors_for("c").is_empty());
    }

    #[test]
    fn clear_resets_order_and_count() {
        let collector = GroupedCollector::new(2);
        collector.add(error("a", "min"));
        collector.add(error("b", "min"));
        collector.clear();

        assert_eq!(collector.count(), 0);
        assert!(collector.fields().is_empty());
        assert!(collector.add(error("c", "min")));
    }
}
