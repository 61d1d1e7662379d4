// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors for specification lookup and loading.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("no specification document for version {0}")]
    UnknownVersion(String),
    #[error("error reading specification document: {0}")]
    Io(#[from] std::io::Error),
    #[error("specification parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}
