//! core::file
//!
//! Design file persistence.
//!
//! # Modules
//!
//! - [`schema`] - Versioned JSON envelope and parsing
//! - [`store`] - Load/save with upgrade and atomic write
//! - [`lock`] - Exclusive per-file lock
//!
//! # Schema Design
//!
//! - Self-describing: includes `kind` and `schema_version`
//! - Older schemas parse and are upgraded on load
//! - Strict parsing: unknown fields are rejected

pub mod lock;
pub mod schema;
pub mod store;

pub use lock::{DesignLock, LockError};
pub use schema::{
    parse_design_file, DesignFile, FileError, Producer, DESIGN_KIND, SCHEMA_VERSION,
};
pub use store::{load, read, save, Loaded, StoreError};
