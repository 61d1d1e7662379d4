// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

pub mod client;
pub mod provider;
pub mod root_store_builder;

pub use client::TlsClientConfig;
pub use root_store_builder::RootStoreBuilder;
