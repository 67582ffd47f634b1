//! core::file::store
//!
//! Design files on disk.
//!
//! Loading parses the envelope and upgrades the body when the file predates
//! this build. Saving always upgrades first, stamps the producer and time,
//! and replaces the file atomically (write to temp file, then rename).
//!
//! Callers that mutate a design hold a [`DesignLock`](super::lock::DesignLock)
//! across load and save; the store itself does not lock.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::schema::{parse_design_file, DesignFile, FileError};
use crate::core::design::{Design, DesignError, UpgradeOptions};

/// Errors from the design store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read design file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write design file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: FileError,
    },

    #[error(transparent)]
    Design(#[from] DesignError),
}

/// A design loaded from disk.
#[derive(Debug)]
pub struct Loaded {
    /// The parsed file, with its original envelope.
    pub file: DesignFile,
    /// The design, upgraded if the file needed it.
    pub design: Design,
    /// Whether an upgrade was applied.
    pub upgraded: bool,
}

/// Read and parse a design file without upgrading it.
pub fn read(path: &Path) -> Result<DesignFile, StoreError> {
    let contents = fs::read_to_string(path).map_err(|e| StoreError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_design_file(&contents).map_err(|source| StoreError::File {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a design, upgrading it (identically) when the file needs it.
///
/// `options.identical` is forced on; `max_passes` is honored.
pub fn load(path: &Path, options: &UpgradeOptions) -> Result<Loaded, StoreError> {
    let file = read(path)?;
    let (design, upgraded) = if file.needs_upgrade() {
        tracing::info!(
            path = %path.display(),
            schema = file.schema_version,
            producer = %file.producer.name,
            "upgrading design on load"
        );
        let options = UpgradeOptions {
            identical: true,
            ..*options
        };
        (file.design.upgrade(&options)?, true)
    } else {
        (file.design.copy(true), false)
    };
    Ok(Loaded {
        file,
        design,
        upgraded,
    })
}

/// Upgrade `design` (identically) and write it to `path`.
///
/// Returns the envelope that was written.
pub fn save(
    path: &Path,
    design: &Design,
    options: &UpgradeOptions,
) -> Result<DesignFile, StoreError> {
    let options = UpgradeOptions {
        identical: true,
        ..*options
    };
    let file = DesignFile::new(design.upgrade(&options)?);
    let json = file.to_json().map_err(|source| StoreError::File {
        path: path.to_path_buf(),
        source,
    })?;

    write_atomic(path, json.as_bytes()).map_err(|e| StoreError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(path = %path.display(), "saved design");
    Ok(file)
}

/// Replace `path` with `contents` via a temp file in the same directory.
///
/// Creates parent directories if needed.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file = fs::File::create(&temp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)
}
