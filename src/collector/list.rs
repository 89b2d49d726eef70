//! Insertion-ordered collector.

use super::{ErrorCollector, DEFAULT_MAX_ERRORS};
use crate::core::FieldError;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct ListState {
    errors: Vec<FieldError>,
    max_errors: usize,
}

/// Collector that preserves global insertion order.
#[derive(Debug)]
pub struct ListCollector {
    state: Mutex<ListState>,
}

impl ListCollector {
    pub fn new(max_errors: usize) -> Self {
        Self {
            state: Mutex::new(ListState {
                errors: Vec::new(),
                max_errors,
            }),
        }
    }

    // A strategy that panicked mid-add must not disable the collector.
    fn lock(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ListCollector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ERRORS)
    }
}

impl ErrorCollector for ListCollector {
    fn add(&self, error: FieldError) -> bool {
        let mut state = self.lock();
        if state.errors.len() >= state.max_errors {
            return false;
        }
        state.errors.push(error);
        true
    }

    fn add_all(&self, errors: Vec<FieldError>) -> bool {
        let mut state = self.lock();
        for error in errors {
            if state.errors.len() >= state.max_errors {
                return false;
            }
            state.errors.push(error);
        }
        true
    }

    fn get_all(&self) -> Vec<FieldError> {
        self.lock().errors.clone()
    }

    fn count(&self) -> usize {
        self.lock().errors.len()
    }

    fn clear(&self) {
        self.lock().errors.clear();
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
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn preserves_insertion_order() {
        let collector = ListCollector::new(10);
        for field in ["c", "a", "b", "a"] {
            collector.add(FieldError::new(field, field, "required"));
        }

        let fields: Vec<String> = collector.get_all().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["c", "a", "b", "a"]);
    }

    #[test]
    fn zero_capacity_rejects_everything() {
        let collector = ListCollector::new(0);
        assert!(!collector.add(FieldError::new("a", "a", "required")));
        assert!(collector.is_full());
    }

    #[test]
    fn concurrent_adds_are_not_lost() {
        let collector = Arc::new(ListCollector::new(1_000));

        thread::scope(|scope| {
            for t in 0..8 {
                let collector = Arc::clone(&collector);
                scope.spawn(move || {
                    for i in 0..50 {
                        collector.add(FieldError::new(format!("{t}.{i}"), "f", "x"));
                    }
                });
            }
        });

        assert_eq!(collector.count(), 400);
    }

    #[test]
    fn concurrent_adds_never_exceed_capacity() {
        let collector = Arc::new(ListCollector::new(37));

        thread::scope(|scope| {
            for _ in 0..8 {
                let collector = Arc::clone(&collector);
                scope.spawn(move || {
                    for _ in 0..20 {
                        collector.add(FieldError::new("a", "a", "x"));
                    }
                });
            }
        });

        assert_eq!(collector.count(), 37);
    }

    #[test]
    fn survives_poisoned_lock() {
        let collector = Arc::new(ListCollector::new(5));
        let poisoner = Arc::clone(&collector);
        let _ = thread::spawn(move || {
            let _guard = poisoner.state.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert!(collector.add(FieldError::new("a", "a", "x")));
        assert_eq!(collector.count(), 1);
    }
}
