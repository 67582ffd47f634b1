//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`EntityId`] - Stable identifier of an operation, sketch or design
//! - [`Reference`] - `(target, output slot)` pointer to another entity's output
//! - [`UtcTimestamp`] - RFC3339 timestamp
//! - [`Fingerprint`] - Content hash for comparing reprocessing results
//!
//! # Validation
//!
//! These types enforce validity at construction time. A reference parsed
//! from text always names a well-formed identifier and slot.
//!
//! # Examples
//!
//! ```
//! use plydesign::core::types::{EntityId, Reference};
//!
//! let id = EntityId::new();
//! let reference = Reference::new(id, 0);
//! let parsed: Reference = reference.to_string().parse().unwrap();
//! assert_eq!(parsed, reference);
//!
//! assert!("not-a-reference".parse::<Reference>().is_err());
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid reference: {0}")]
    InvalidReference(String),
}

/// Stable identifier of a document entity.
///
/// Operations, sketches and designs all share this identifier space so a
/// single id map can rewrite every reference when a document is forked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Abbreviated form for display (first 8 hex characters).
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for EntityId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| TypeError::InvalidId(format!("{s}: {e}")))
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A pointer to one output slot of another entity.
///
/// Operations produce a list of outputs; `slot` indexes into that list.
/// The textual form is `<uuid>:<slot>`, with `:<slot>` optional (defaults
/// to slot 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    /// The referenced entity.
    pub target: EntityId,
    /// Index into the target's outputs.
    pub slot: usize,
}

impl Reference {
    /// Create a reference to `target`'s output at `slot`.
    pub fn new(target: EntityId, slot: usize) -> Self {
        Self { target, slot }
    }

    /// Reference the first output of `target`.
    pub fn first(target: EntityId) -> Self {
        Self::new(target, 0)
    }

    /// Return this reference with its target rewritten through `f`.
    pub fn retarget(self, f: impl FnOnce(EntityId) -> EntityId) -> Self {
        Self::new(f(self.target), self.slot)
    }
}

impl FromStr for Reference {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, slot) = match s.rsplit_once(':') {
            Some((id, slot)) => {
                let slot = slot.parse::<usize>().map_err(|_| {
                    TypeError::InvalidReference(format!("{s}: slot must be a non-negative integer"))
                })?;
                (id, slot)
            }
            None => (s, 0),
        };
        let target = id
            .parse::<EntityId>()
            .map_err(|e| TypeError::InvalidReference(e.to_string()))?;
        Ok(Self::new(target, slot))
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.target, self.slot)
    }
}

/// A UTC timestamp.
///
/// # Example
///
/// ```
/// use plydesign::core::types::UtcTimestamp;
///
/// let now = UtcTimestamp::now();
/// println!("Current time: {}", now);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// A stable SHA-256 hash over a sequence of byte chunks.
///
/// Each chunk is framed with its length so that `["ab", "c"]` and
/// `["a", "bc"]` hash differently.
///
/// # Example
///
/// ```
/// use plydesign::core::types::Fingerprint;
///
/// let fp = Fingerprint::compute([b"alpha".as_slice(), b"beta".as_slice()]);
/// let fp2 = Fingerprint::compute([b"alpha".as_slice(), b"beta".as_slice()]);
/// assert_eq!(fp, fp2);
/// assert_eq!(fp.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint over ordered chunks.
    pub fn compute<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = Sha256::new();
        for chunk in chunks {
            hasher.update((chunk.len() as u64).to_le_bytes());
            hasher.update(chunk);
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod entity_id {
        use super::*;

        #[test]
        fn fresh_ids_are_distinct() {
            assert_ne!(EntityId::new(), EntityId::new());
        }

        #[test]
        fn parses_own_display() {
            let id = EntityId::new();
            let parsed: EntityId = id.to_string().parse().unwrap();
            assert_eq!(parsed, id);
        }

        #[test]
        fn short_form_is_eight_chars() {
            assert_eq!(EntityId::new().short().len(), 8);
        }

        #[test]
        fn garbage_rejected() {
            assert!(matches!(
                "xyz".parse::<EntityId>(),
                Err(TypeError::InvalidId(_))
            ));
        }

        #[test]
        fn serde_is_transparent() {
            let id = EntityId::new();
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id));
        }
    }

    mod reference {
        use super::*;

        #[test]
        fn slot_defaults_to_zero() {
            let id = EntityId::new();
            let parsed: Reference = id.to_string().parse().unwrap();
            assert_eq!(parsed, Reference::first(id));
        }

        #[test]
        fn explicit_slot() {
            let id = EntityId::new();
            let parsed: Reference = format!("{}:3", id).parse().unwrap();
            assert_eq!(parsed.slot, 3);
            assert_eq!(parsed.target, id);
        }

        #[test]
        fn negative_slot_rejected() {
            let id = EntityId::new();
            let result = format!("{}:-1", id).parse::<Reference>();
            assert!(matches!(result, Err(TypeError::InvalidReference(_))));
        }

        #[test]
        fn retarget_keeps_slot() {
            let a = EntityId::new();
            let b = EntityId::new();
            let r = Reference::new(a, 2).retarget(|_| b);
            assert_eq!(r, Reference::new(b, 2));
        }
    }

    mod fingerprint {
        use super::*;

        #[test]
        fn framing_distinguishes_chunk_boundaries() {
            let a = Fingerprint::compute([b"ab".as_slice(), b"c".as_slice()]);
            let b = Fingerprint::compute([b"a".as_slice(), b"bc".as_slice()]);
            assert_ne!(a, b);
        }

        #[test]
        fn order_matters() {
            let a = Fingerprint::compute([b"x".as_slice(), b"y".as_slice()]);
            let b = Fingerprint::compute([b"y".as_slice(), b"x".as_slice()]);
            assert_ne!(a, b);
        }
    }
}
