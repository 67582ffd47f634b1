//! core::sketch
//!
//! Input sketches consumed by sketch-driven operations.
//!
//! A sketch is an identified list of named shapes. Construction shapes are
//! drawing aids and never reach an operation output.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::types::EntityId;

fn default_construction() -> bool {
    true
}

/// A named shape in a sketch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Shape {
    pub name: String,
    /// Older files omit this flag; a missing flag means construction geometry.
    #[serde(default = "default_construction")]
    pub construction: bool,
}

impl Shape {
    /// A shape that contributes to outputs.
    pub fn solid(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            construction: false,
        }
    }

    /// A construction-only shape.
    pub fn construction(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            construction: true,
        }
    }
}

/// An input sketch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sketch {
    pub id: EntityId,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl Sketch {
    /// Create a sketch with a fresh id.
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self {
            id: EntityId::new(),
            shapes,
        }
    }

    /// Names of shapes that contribute to outputs.
    pub fn solid_shapes(&self) -> BTreeSet<String> {
        self.shapes
            .iter()
            .filter(|s| !s.construction)
            .map(|s| s.name.clone())
            .collect()
    }

    /// Bring the sketch to the current schema.
    ///
    /// Missing flags were already resolved at parse time, so this only
    /// drops exact duplicate shapes that older editors could record twice.
    pub fn upgrade(&self) -> Sketch {
        let mut seen = BTreeSet::new();
        let shapes = self
            .shapes
            .iter()
            .filter(|s| seen.insert((s.name.clone(), s.construction)))
            .cloned()
            .collect();
        Sketch { id: self.id, shapes }
    }

    /// Give the sketch a fresh id, returning the old one.
    pub(crate) fn regenerate_id(&mut self) -> EntityId {
        std::mem::replace(&mut self.id, EntityId::new())
    }
}
