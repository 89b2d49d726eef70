//! Scene matching and rule merging.
//!
//! Resolves the effective field rules for a record type under the current
//! scene. Every scene in the type's rule set that matches the current scene
//! contributes its rules; conflicts are settled by iteration order.
//!
//! # Conflict resolution
//!
//! Scenes are visited in [`RuleSet`] merge order, and a later scene
//! overwrites an earlier one on the same field. [`Scene::ALL`] is visited
//! first, so it is always overridden by a specific scene. Of two matching
//! specific scenes, the one with the higher unsigned bit value wins.

use crate::core::{FieldRules, RuleSet, Scene};
use crate::inspect::TypeMetadata;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Whether rules declared for `candidate` apply under `current`.
///
/// Either side being [`Scene::ALL`] always matches.
///
/// # Example
///
/// ```rust
/// use scenegate::core::Scene;
/// use scenegate::matcher::matches;
///
/// assert!(matches(Scene::CREATE, Scene::CREATE | Scene::UPDATE));
/// assert!(matches(Scene::ALL, Scene::DELETE));
/// assert!(matches(Scene::DELETE, Scene::ALL));
/// assert!(!matches(Scene::CREATE, Scene::UPDATE));
/// ```
pub fn matches(candidate: Scene, current: Scene) -> bool {
    current.is_all() || candidate.is_all() || current.has(candidate)
}

/// Merge the rules of every scene matching `current`.
///
/// Returns an empty map when no scene matches.
///
/// # Example
///
/// ```rust
/// use scenegate::core::{RuleSet, Scene};
/// use scenegate::matcher::merge_rules;
///
/// let rules = RuleSet::new()
///     .rule(Scene::ALL, "name", "required")
///     .rule(Scene::CREATE, "name", "required,min=2")
///     .rule(Scene::UPDATE, "email", "email");
///
/// let merged = merge_rules(Scene::CREATE, &rules);
/// assert_eq!(merged["name"], "required,min=2");
/// assert!(!merged.contains_key("email"));
/// ```
pub fn merge_rules(current: Scene, rules: &RuleSet) -> FieldRules {
    let mut merged = FieldRules::new();
    for (scene, field_rules) in rules.iter() {
        if !matches(scene, current) {
            continue;
        }
        for (field, expression) in field_rules {
            merged.insert(field.clone(), expression.clone());
        }
    }
    merged
}

/// Resolves merged rules per type and scene, optionally caching them.
#[derive(Debug)]
pub struct SceneMatcher {
    cache: Option<RwLock<HashMap<(TypeId, Scene), Arc<FieldRules>>>>,
}

impl SceneMatcher {
    /// Matcher that caches merged rules.
    pub fn new() -> Self {
        Self {
            cache: Some(RwLock::new(HashMap::new())),
        }
    }

    /// Matcher that merges on every call.
    pub fn uncached() -> Self {
        Self { cache: None }
    }

    /// Effective rules of `metadata`'s type under `current`.
    ///
    /// Types without a rule set resolve to an empty map.
    pub fn resolve(&self, metadata: &TypeMetadata, current: Scene) -> Arc<FieldRules> {
        let Some(cache) = &self.cache else {
            return Arc::new(merge(metadata, current));
        };

        let key = (metadata.type_id(), current);
        let cached = cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(rules) = cached {
            return rules;
        }

        let merged = Arc::new(merge(metadata, current));
        let mut cache = cache.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(key).or_insert(merged))
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// Number of cached (type, scene) entries.
    pub fn cached_len(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| {
            cache.read().unwrap_or_else(PoisonError::into_inner).len()
        })
    }

    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            cache.write().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }
}

impl Default for SceneMatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn merge(metadata: &TypeMetadata, current: Scene) -> FieldRules {
    metadata
        .rule_set()
        .map(|rules| merge_rules(current, rules))
        .unwrap_or_default()
}
