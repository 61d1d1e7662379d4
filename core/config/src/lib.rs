// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

pub mod component;
pub mod conn;
pub mod errors;
pub mod tls;
