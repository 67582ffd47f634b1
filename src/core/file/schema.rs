//! core::file::schema
//!
//! Versioned JSON envelope for design files.
//!
//! # Schema Design
//!
//! - Self-describing: includes `kind` and `schema_version`
//! - Stamped with the producer that last wrote it
//! - Strict parsing: unknown fields are rejected
//!
//! Schema 1 files carry legacy operation kinds inside the same envelope
//! shape; they parse as-is and the upgrade engine migrates them on load.
//!
//! # Example
//!
//! ```
//! use plydesign::core::design::Design;
//! use plydesign::core::file::schema::{parse_design_file, DesignFile, DESIGN_KIND};
//! use plydesign::core::laminate::LayerDef;
//!
//! let file = DesignFile::new(Design::new(LayerDef::from_names(["top"])));
//! assert_eq!(file.kind, DESIGN_KIND);
//!
//! let json = serde_json::to_string(&file).unwrap();
//! let parsed = parse_design_file(&json).unwrap();
//! assert_eq!(parsed.design, file.design);
//! assert!(!parsed.needs_upgrade());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::design::Design;
use crate::core::types::UtcTimestamp;

/// The kind identifier for design files.
pub const DESIGN_KIND: &str = "plydesign.design";

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 2;

/// Oldest schema version still readable.
pub const MIN_SCHEMA_VERSION: u32 = 1;

/// Name recorded as producer by this build.
pub const PRODUCER_NAME: &str = env!("CARGO_PKG_NAME");

/// Version recorded as producer by this build.
pub const PRODUCER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors from parsing design files.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to parse design file: {0}")]
    ParseError(String),

    #[error("invalid kind '{found}', expected '{}'", DESIGN_KIND)]
    InvalidKind { found: String },

    #[error("unsupported schema version {0}, supported: {MIN_SCHEMA_VERSION}..={SCHEMA_VERSION}")]
    UnsupportedVersion(u32),

    #[error("failed to serialize design: {0}")]
    SerializeError(String),
}

/// Envelope for version dispatch before full parsing.
#[derive(Debug, Deserialize)]
struct FileEnvelope {
    kind: String,
    schema_version: u32,
}

/// The program that last wrote a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Producer {
    pub name: String,
    pub version: String,
}

impl Producer {
    /// This build.
    pub fn current() -> Self {
        Self {
            name: PRODUCER_NAME.to_string(),
            version: PRODUCER_VERSION.to_string(),
        }
    }

    pub fn is_current(&self) -> bool {
        self.name == PRODUCER_NAME && self.version == PRODUCER_VERSION
    }
}

/// A design file: envelope plus document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DesignFile {
    /// Kind identifier (always "plydesign.design")
    pub kind: String,

    /// Schema version the body was written with
    pub schema_version: u32,

    /// Program that wrote the file
    pub producer: Producer,

    /// When the file was written
    pub saved_at: UtcTimestamp,

    /// The document
    pub design: Design,
}

impl DesignFile {
    /// Wrap a design in a current-schema envelope stamped now.
    pub fn new(design: Design) -> Self {
        Self {
            kind: DESIGN_KIND.to_string(),
            schema_version: SCHEMA_VERSION,
            producer: Producer::current(),
            saved_at: UtcTimestamp::now(),
            design,
        }
    }

    /// Whether the file predates this build's schema or producer.
    pub fn needs_upgrade(&self) -> bool {
        self.schema_version < SCHEMA_VERSION || !self.producer.is_current()
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, FileError> {
        serde_json::to_string_pretty(self).map_err(|e| FileError::SerializeError(e.to_string()))
    }
}

/// Parse a design file with version dispatch.
///
/// # Errors
///
/// Returns an error if:
/// - The JSON is malformed
/// - The `kind` field doesn't match [`DESIGN_KIND`]
/// - The `schema_version` is newer than this build or older than
///   [`MIN_SCHEMA_VERSION`]
/// - The body fails strict parsing, including duplicate operation ids
pub fn parse_design_file(json: &str) -> Result<DesignFile, FileError> {
    let envelope: FileEnvelope =
        serde_json::from_str(json).map_err(|e| FileError::ParseError(e.to_string()))?;

    if envelope.kind != DESIGN_KIND {
        return Err(FileError::InvalidKind {
            found: envelope.kind,
        });
    }

    match envelope.schema_version {
        MIN_SCHEMA_VERSION..=SCHEMA_VERSION => {
            serde_json::from_str(json).map_err(|e| FileError::ParseError(e.to_string()))
        }
        v => Err(FileError::UnsupportedVersion(v)),
    }
}
