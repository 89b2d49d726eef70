//! Scene bitmask for validation contexts.
//!
//! A scene names the situation a record is validated in (create, update, ...).
//! Scenes are bitmasks so that several contexts can be combined and matched
//! with plain integer arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, Sub};

/// One or more named validation contexts, represented as a bitmask.
///
/// Scenes are immutable values: every operation returns a new scene.
///
/// # Example
///
/// ```rust
/// use scenegate::core::Scene;
///
/// let scene = Scene::CREATE.add(Scene::UPDATE);
///
/// assert!(scene.has(Scene::CREATE));
/// assert!(scene.has(Scene::UPDATE));
/// assert!(!scene.has(Scene::DELETE));
///
/// let scene = scene.remove(Scene::CREATE);
/// assert!(!scene.has(Scene::CREATE));
///
/// // ALL matches everything
/// assert!(Scene::ALL.has(Scene::DELETE));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scene(i64);

impl Scene {
    /// No scene at all.
    pub const NONE: Scene = Scene(0);
    /// Sentinel matching every scene.
    pub const ALL: Scene = Scene(-1);

    pub const CREATE: Scene = Scene(1);
    pub const UPDATE: Scene = Scene(1 << 1);
    pub const DELETE: Scene = Scene(1 << 2);
    pub const QUERY: Scene = Scene(1 << 3);
    pub const IMPORT: Scene = Scene(1 << 4);

    /// Create a scene from raw bits.
    pub const fn from_bits(bits: i64) -> Self {
        Scene(bits)
    }

    /// Create a single-bit scene for application-defined contexts.
    ///
    /// Bits 0..=4 are taken by the predefined scenes. `bit` is clamped to 62
    /// so the result never collides with the sign bit used by [`Scene::ALL`].
    pub const fn custom(bit: u32) -> Self {
        let bit = if bit > 62 { 62 } else { bit };
        Scene(1 << bit)
    }

    /// Raw bit representation.
    pub const fn bits(self) -> i64 {
        self.0
    }

    /// Check whether this scene contains `candidate`.
    ///
    /// Returns true if `self` is [`Scene::ALL`] or shares at least one bit
    /// with `candidate`.
    pub const fn has(self, candidate: Scene) -> bool {
        self.0 == Scene::ALL.0 || (self.0 & candidate.0) != 0
    }

    /// Union of both scenes (pure).
    pub const fn add(self, other: Scene) -> Scene {
        Scene(self.0 | other.0)
    }

    /// Remove the bits of `other` from this scene (pure).
    pub const fn remove(self, other: Scene) -> Scene {
        Scene(self.0 & !other.0)
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    pub const fn is_all(self) -> bool {
        self.0 == Scene::ALL.0
    }
}

impl Default for Scene {
    fn default() -> Self {
        Scene::NONE
    }
}

impl BitOr for Scene {
    type Output = Scene;

    fn bitor(self, rhs: Scene) -> Scene {
        self.add(rhs)
    }
}

impl BitAnd for Scene {
    type Output = Scene;

    fn bitand(self, rhs: Scene) -> Scene {
        Scene(self.0 & rhs.0)
    }
}

impl Sub for Scene {
    type Output = Scene;

    fn sub(self, rhs: Scene) -> Scene {
        self.remove(rhs)
    }
}

const NAMED: [(Scene, &str); 5] = [
    (Scene::CREATE, "create"),
    (Scene::UPDATE, "update"),
    (Scene::DELETE, "delete"),
    (Scene::QUERY, "query"),
    (Scene::IMPORT, "import"),
];

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return write!(f, "all");
        }
        if self.is_none() {
            return write!(f, "none");
        }

        let mut rest = *self;
        let mut first = true;
        for (scene, name) in NAMED {
            if rest.0 & scene.0 != 0 {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                rest = rest.remove(scene);
                first = false;
            }
        }
        if !rest.is_none() {
            if !first {
                write!(f, "|")?;
            }
            write!(f, "{:#x}", rest.0)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scene({self})")
    }
}
