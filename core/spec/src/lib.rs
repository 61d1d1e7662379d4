// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

pub mod errors;
pub mod model;
pub mod source;
pub mod store;

pub use model::{Endpoint, Method, ParamLocation, ParameterDeclaration, SpecDocument};
pub use source::{EmbeddedSpecSource, FileSpecSource, SpecSource};
pub use store::{DEFAULT_API_VERSION, SpecStore, default_store};
