//! Per-scene rule declarations.
//!
//! A rule set maps each scene to the rule expression that applies to every
//! field in that scene. Record types declare their rule set once; it is
//! read-only afterwards.

use super::scene::Scene;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Field name to rule expression.
///
/// Ordered by field name so iteration over a merged rule map is stable.
pub type FieldRules = BTreeMap<String, String>;

/// Mapping from scene to the field rules declared for it.
///
/// Scenes iterate in merge order: [`Scene::ALL`] first, then every other
/// mask by its bits read as unsigned, lowest first. A mask with the sign bit
/// set (other than `ALL`) therefore sorts last. The scene matcher relies on
/// this ordering to resolve conflicting rules deterministically.
///
/// # Example
///
/// ```rust
/// use scenegate::core::{RuleSet, Scene};
///
/// let rules = RuleSet::new()
///     .rule(Scene::CREATE, "age", "required,min=18")
///     .rule(Scene::UPDATE, "email", "email");
///
/// assert_eq!(rules.len(), 2);
/// assert_eq!(rules.rules_for(Scene::CREATE).unwrap()["age"], "required,min=18");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    scenes: BTreeMap<MergeKey, FieldRules>,
}

/// Ordering wrapper giving scenes their merge order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
struct MergeKey(Scene);

impl MergeKey {
    fn rank(self) -> (bool, u64) {
        (!self.0.is_all(), self.0.bits() as u64)
    }
}

impl Ord for MergeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for MergeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single field rule to a scene.
    ///
    /// Declaring the same field twice for one scene keeps the last rule.
    pub fn rule(
        mut self,
        scene: Scene,
        field: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        self.scenes
            .entry(MergeKey(scene))
            .or_default()
            .insert(field.into(), expression.into());
        self
    }

    /// Add several field rules to a scene at once.
    pub fn scene<I, K, V>(mut self, scene: Scene, rules: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entry = self.scenes.entry(MergeKey(scene)).or_default();
        for (field, expression) in rules {
            entry.insert(field.into(), expression.into());
        }
        self
    }

    /// Rules declared for exactly this scene value.
    pub fn rules_for(&self, scene: Scene) -> Option<&FieldRules> {
        self.scenes.get(&MergeKey(scene))
    }

    /// Iterate scenes in the pinned merge order.
    pub fn iter(&self) -> impl Iterator<Item = (Scene, &FieldRules)> {
        self.scenes.iter().map(|(key, rules)| (key.0, rules))
    }

    /// Every field name referenced by any scene.
    pub fn referenced_fields(&self) -> BTreeSet<&str> {
        self.scenes
            .values()
            .flat_map(|rules| rules.keys().map(String::as_str))
            .collect()
    }

    /// Number of scenes with declared rules.
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}
