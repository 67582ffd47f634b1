//! core::laminate
//!
//! Layer stacks and the laminate artifacts operations produce.
//!
//! # Model
//!
//! A [`Laminate`] holds one set of shape names per layer of the document's
//! [`LayerDef`]. Boolean functions act layer by layer as set operations, so
//! outputs are deterministic and comparable without any geometry kernel.
//!
//! # Example
//!
//! ```
//! use plydesign::core::laminate::{Laminate, LaminateFunction};
//!
//! let a = Laminate::from_layers(vec![vec!["hinge", "body"], vec!["body"]]);
//! let b = Laminate::from_layers(vec![vec!["body"], vec![]]);
//!
//! let cut = a.combine(LaminateFunction::Difference, &b);
//! assert!(cut.layer(0).unwrap().contains("hinge"));
//! assert!(!cut.layer(0).unwrap().contains("body"));
//! ```

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from building a layer stack.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LayerError {
    #[error("duplicate layer name '{0}'")]
    DuplicateName(String),
}

/// A single layer of the stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Layer {
    /// Layer name, unique within a stack.
    pub name: String,
    /// Material label, if one was assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

impl Layer {
    /// Create a layer without a material.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            material: None,
        }
    }

    /// Create a layer with a material label.
    pub fn with_material(name: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            material: Some(material.into()),
        }
    }
}

/// Ordered layer stack owned by a design.
///
/// Parsing rejects duplicate names. Stacks built in code with [`LayerDef::new`]
/// are unchecked; use [`LayerDef::try_new`] for untrusted names, and
/// [`fast_verify`](crate::core::verify::fast_verify) reports duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LayerDefRecord", into = "LayerDefRecord")]
pub struct LayerDef {
    pub layers: Vec<Layer>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayerDefRecord {
    layers: Vec<Layer>,
}

impl TryFrom<LayerDefRecord> for LayerDef {
    type Error = LayerError;

    fn try_from(record: LayerDefRecord) -> Result<Self, Self::Error> {
        Self::try_new(record.layers)
    }
}

impl From<LayerDef> for LayerDefRecord {
    fn from(def: LayerDef) -> Self {
        Self { layers: def.layers }
    }
}

impl LayerDef {
    /// Create a stack from layers, bottom first.
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    /// The stock five-ply flexure stack, bottom first.
    pub fn five_ply() -> Self {
        Self::new(vec![
            Layer::with_material("carbon-bottom", "carbon 0-90-0"),
            Layer::with_material("pyralux-bottom", "pyralux"),
            Layer::with_material("kapton", "kapton"),
            Layer::with_material("pyralux-top", "pyralux"),
            Layer::with_material("carbon-top", "carbon 0-90-0"),
        ])
    }

    /// Create a stack, rejecting repeated names.
    pub fn try_new(layers: Vec<Layer>) -> Result<Self, LayerError> {
        let def = Self { layers };
        match def.duplicate_names().into_iter().next() {
            Some(name) => Err(LayerError::DuplicateName(name)),
            None => Ok(def),
        }
    }

    /// Names that appear more than once, in stack order of their second use.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut repeated = Vec::new();
        for name in self.names() {
            if !seen.insert(name) && !repeated.iter().any(|r| r == name) {
                repeated.push(name.to_string());
            }
        }
        repeated
    }

    /// Convenience constructor from bare names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(Layer::new).collect())
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Position of the layer named `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name == name)
    }

    /// Iterate layer names in stack order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|l| l.name.as_str())
    }
}

/// Boolean function applied between laminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaminateFunction {
    Union,
    Intersection,
    Difference,
    SymmetricDifference,
}

impl LaminateFunction {
    /// Unary-type functions fold over every operand; binary-type functions
    /// combine the unary operands against the binary ones.
    pub fn is_unary(self) -> bool {
        matches!(self, Self::Union | Self::Intersection)
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::Intersection => "intersection",
            Self::Difference => "difference",
            Self::SymmetricDifference => "symmetric_difference",
        }
    }
}

impl std::fmt::Display for LaminateFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-layer sets of shape names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Laminate {
    layers: Vec<BTreeSet<String>>,
}

impl Laminate {
    /// An empty laminate with `count` layers.
    pub fn empty(count: usize) -> Self {
        Self {
            layers: vec![BTreeSet::new(); count],
        }
    }

    /// Build a laminate from per-layer shape names.
    pub fn from_layers<L, S>(layers: Vec<L>) -> Self
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            layers: layers
                .into_iter()
                .map(|shapes| shapes.into_iter().map(Into::into).collect::<BTreeSet<String>>())
                .collect(),
        }
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Shapes on layer `index`.
    pub fn layer(&self, index: usize) -> Option<&BTreeSet<String>> {
        self.layers.get(index)
    }

    /// Mutable access to layer `index`.
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut BTreeSet<String>> {
        self.layers.get_mut(index)
    }

    /// Iterate layers bottom first.
    pub fn layers(&self) -> impl Iterator<Item = &BTreeSet<String>> {
        self.layers.iter()
    }

    /// Total number of shapes across all layers.
    pub fn shape_count(&self) -> usize {
        self.layers.iter().map(BTreeSet::len).sum()
    }

    /// Whether every layer is empty.
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(BTreeSet::is_empty)
    }

    /// Apply `function` layer by layer with `self` on the left.
    ///
    /// Laminates of different heights are padded with empty layers.
    pub fn combine(&self, function: LaminateFunction, other: &Laminate) -> Laminate {
        let height = self.layers.len().max(other.layers.len());
        let empty = BTreeSet::new();
        let layers = (0..height)
            .map(|i| -> BTreeSet<String> {
                let a = self.layers.get(i).unwrap_or(&empty);
                let b = other.layers.get(i).unwrap_or(&empty);
                match function {
                    LaminateFunction::Union => a.union(b).cloned().collect(),
                    LaminateFunction::Intersection => a.intersection(b).cloned().collect(),
                    LaminateFunction::Difference => a.difference(b).cloned().collect(),
                    LaminateFunction::SymmetricDifference => {
                        a.symmetric_difference(b).cloned().collect()
                    }
                }
            })
            .collect();
        Laminate { layers }
    }

    /// Union of every laminate in `items`, or `None` if there are none.
    pub fn union_all<'a>(items: impl IntoIterator<Item = &'a Laminate>) -> Option<Laminate> {
        Self::fold(LaminateFunction::Union, items)
    }

    /// Left fold of `items` with `function`, or `None` if there are none.
    pub fn fold<'a>(
        function: LaminateFunction,
        items: impl IntoIterator<Item = &'a Laminate>,
    ) -> Option<Laminate> {
        let mut iter = items.into_iter();
        let first = iter.next()?.clone();
        Some(iter.fold(first, |acc, next| acc.combine(function, next)))
    }

    /// Re-express a laminate built on `from` onto the `to` stack, matching
    /// layers by name. Layers missing from `from` come out empty.
    pub fn realign(&self, from: &LayerDef, to: &LayerDef) -> Laminate {
        let layers = to
            .names()
            .map(|name| {
                from.position(name)
                    .and_then(|i| self.layers.get(i))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();
        Laminate { layers }
    }

    /// Canonical bytes for fingerprinting.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for layer in &self.layers {
            for shape in layer {
                out.extend_from_slice(shape.as_bytes());
                out.push(0);
            }
            out.push(b'\n');
        }
        out
    }
}
