// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;

use crate::errors::SpecError;
use crate::model::{Endpoint, SpecDocument};
use crate::source::{EmbeddedSpecSource, SpecSource};

/// Version used when a caller does not pin one explicitly.
pub const DEFAULT_API_VERSION: &str = "v1.41";

/// Process-lifetime cache of specification documents, keyed by version.
///
/// Documents are loaded lazily on first reference and never invalidated
/// (specifications are immutable once published). Concurrent first access
/// for the same version runs at most one load; the other callers block on
/// the in-flight cell until it is populated.
pub struct SpecStore {
    source: Box<dyn SpecSource>,
    default_version: String,
    cells: Mutex<HashMap<String, Arc<OnceCell<Arc<SpecDocument>>>>>,
}

impl SpecStore {
    pub fn new(source: impl SpecSource + 'static) -> Self {
        Self::with_default_version(source, DEFAULT_API_VERSION)
    }

    pub fn with_default_version(source: impl SpecSource + 'static, version: &str) -> Self {
        Self {
            source: Box::new(source),
            default_version: version.to_string(),
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached document for `version` (or the store default),
    /// loading it on first reference.
    pub fn fetch(&self, version: Option<&str>) -> Result<Arc<SpecDocument>, SpecError> {
        let version = version.unwrap_or(&self.default_version);

        let cell = {
            let mut cells = self.cells.lock();
            cells
                .entry(version.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let doc = cell.get_or_try_init(|| {
            tracing::debug!(%version, "loading specification document");
            let raw = self.source.load(version)?;
            let doc: SpecDocument = serde_yaml::from_str(&raw)?;
            Ok::<_, SpecError>(Arc::new(doc))
        })?;

        Ok(doc.clone())
    }

    /// Distinct first path segments across all endpoints of the resolved
    /// document.
    pub fn categories(&self, version: Option<&str>) -> Result<BTreeSet<String>, SpecError> {
        let doc = self.fetch(version)?;
        Ok(doc
            .endpoints
            .iter()
            .map(|e| e.category().to_string())
            .collect())
    }

    /// Endpoints whose path begins with `category`.
    pub fn endpoints_in(
        &self,
        category: &str,
        version: Option<&str>,
    ) -> Result<Vec<Endpoint>, SpecError> {
        let doc = self.fetch(version)?;
        Ok(doc
            .endpoints
            .iter()
            .filter(|e| e.category() == category)
            .cloned()
            .collect())
    }

    /// Looks up a single endpoint by operation id within a category.
    /// Absence is a valid outcome the caller must check, not an error.
    pub fn request_info(
        &self,
        category: &str,
        operation: &str,
        version: Option<&str>,
    ) -> Result<Option<Endpoint>, SpecError> {
        let doc = self.fetch(version)?;
        Ok(doc
            .endpoints
            .iter()
            .find(|e| e.category() == category && e.operation == operation)
            .cloned())
    }
}

static DEFAULT_STORE: Lazy<Arc<SpecStore>> =
    Lazy::new(|| Arc::new(SpecStore::new(EmbeddedSpecSource)));

/// The process-wide store over the embedded specification documents.
pub fn default_store() -> Arc<SpecStore> {
    DEFAULT_STORE.clone()
}
