//! core
//!
//! Core domain types, schemas, and engines for plydesign.
//!
//! # Modules
//!
//! - [`types`] - Strong types: EntityId, Reference, Fingerprint
//! - [`laminate`] - Layer stacks and laminate artifacts
//! - [`sketch`] - Input sketches
//! - [`operation`] - Operation kinds, generation, per-operation upgrade
//! - [`graph`] - Dependency graph over an operation sequence
//! - [`design`] - The design document: relinking, upgrade, reprocessing
//! - [`verify`] - Fast verification of design invariants
//! - [`file`] - Versioned file envelope, store and lock
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Graph integrity is checked before any mutation

pub mod config;
pub mod design;
pub mod file;
pub mod graph;
pub mod laminate;
pub mod operation;
pub mod sketch;
pub mod types;
pub mod verify;
