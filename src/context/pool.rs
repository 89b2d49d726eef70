//! Explicit acquire/release object pool.

use std::fmt;
use std::sync::{Mutex, PoisonError};

/// State that can be fully reset before reuse.
pub trait Recycle {
    /// Return the value to a pristine state.
    fn recycle(&mut self);
}

/// Bounded pool of reusable values.
///
/// `release` always resets the value before it becomes available again, so
/// nothing from one invocation can leak into the next.
pub struct Pool<T: Recycle> {
    idle: Mutex<Vec<T>>,
    capacity: usize,
    factory: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T: Recycle> Pool<T> {
    /// Create a pool keeping at most `capacity` idle values.
    pub fn new<F>(capacity: usize, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            idle: Mutex::new(Vec::new()),
            capacity,
            factory: Box::new(factory),
        }
    }

    /// Take an idle value, or build a fresh one.
    pub fn acquire(&self) -> T {
        let reused = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        reused.unwrap_or_else(|| (self.factory)())
    }

    /// Reset `value` and keep it for reuse if there is room.
    pub fn release(&self, mut value: T) {
        value.recycle();
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.capacity {
            idle.push(value);
        }
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Recycle> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("idle", &self.idle_count())
            .field("capacity", &self.capacity)
            .finish()
    }
}
