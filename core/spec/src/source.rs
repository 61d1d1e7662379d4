// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use crate::errors::SpecError;

/// Provider of raw specification documents, keyed by version.
pub trait SpecSource: Send + Sync {
    fn load(&self, version: &str) -> Result<String, SpecError>;
}

/// Loads `<root>/<version>.yaml` from a directory of specification documents.
pub struct FileSpecSource {
    root: PathBuf,
}

impl FileSpecSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SpecSource for FileSpecSource {
    fn load(&self, version: &str) -> Result<String, SpecError> {
        let path = self.root.join(format!("{}.yaml", version));
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(raw),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(SpecError::UnknownVersion(version.to_string()))
            }
            Err(err) => Err(SpecError::Io(err)),
        }
    }
}

/// Specification documents compiled into the library, so a client works
/// without any files on disk.
pub struct EmbeddedSpecSource;

const V1_41: &str = include_str!("../specs/v1.41.yaml");

impl SpecSource for EmbeddedSpecSource {
    fn load(&self, version: &str) -> Result<String, SpecError> {
        match version {
            "v1.41" => Ok(V1_41.to_string()),
            _ => Err(SpecError::UnknownVersion(version.to_string())),
        }
    }
}
