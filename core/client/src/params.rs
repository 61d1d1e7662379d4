// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

//! Generic partitioning of a flat parameter map into path/query/header/body
//! buckets, driven by an endpoint's declared parameter list.
//!
//! This replaces hand-written per-endpoint signatures with one pure reducer:
//! the same (declarations, user params) pair always yields the same four-way
//! partition, independent of declaration order. Required-ness is not policed
//! here; the server validates what it receives.

use std::collections::HashMap;

use serde_json::{Map, Value};

use vessel_spec::{ParamLocation, ParameterDeclaration};

/// The four-way partition of caller-supplied parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    pub path: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub header: HashMap<String, String>,
    pub body: Map<String, Value>,
}

/// Places the user-supplied value for one declaration into its bucket.
///
/// Declared parameters absent from `user` are silently skipped; keys in
/// `user` matching no declaration are never touched. Body values stay
/// structured, nested under a sub-key named after the declaration.
pub fn gather(
    user: &Map<String, Value>,
    mut acc: RequestParams,
    decl: &ParameterDeclaration,
) -> RequestParams {
    let Some(value) = user.get(&decl.name) else {
        return acc;
    };

    match decl.location {
        ParamLocation::Path => {
            acc.path.insert(decl.name.clone(), render_scalar(value));
        }
        ParamLocation::Query => match value {
            // arrays repeat the key, engine filters style objects go as JSON
            Value::Array(items) => {
                for item in items {
                    acc.query.push((decl.name.clone(), render_scalar(item)));
                }
            }
            other => acc.query.push((decl.name.clone(), render_scalar(other))),
        },
        ParamLocation::Header => {
            acc.header.insert(decl.name.clone(), render_scalar(value));
        }
        ParamLocation::Body => {
            acc.body.insert(decl.name.clone(), value.clone());
        }
    }

    acc
}

/// Folds a whole declaration list over the user parameters.
///
/// Query pairs are sorted by key afterwards so the partition is identical
/// regardless of declaration order; the sort is stable, so repeated keys
/// (array values) keep their supplied order.
pub fn partition(user: &Map<String, Value>, decls: &[ParameterDeclaration]) -> RequestParams {
    let mut parts = decls
        .iter()
        .fold(RequestParams::default(), |acc, decl| gather(user, acc, decl));
    parts.query.sort_by(|a, b| a.0.cmp(&b.0));
    parts
}

/// Renders a JSON value for a path/query/header slot. Strings stay bare
/// (no JSON quoting); objects are JSON-encoded.
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_location() -> impl Strategy<Value = ParamLocation> {
        prop_oneof![
            Just(ParamLocation::Path),
            Just(ParamLocation::Query),
            Just(ParamLocation::Header),
            Just(ParamLocation::Body),
        ]
    }

    fn arb_decls() -> impl Strategy<Value = Vec<ParameterDeclaration>> {
        proptest::collection::btree_map("[a-z]{1,8}", arb_location(), 0..12).prop_map(|m| {
            m.into_iter()
                .map(|(name, location)| ParameterDeclaration {
                    name,
                    location,
                    description: None,
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn partition_is_deterministic_and_order_independent(
            decls in arb_decls(),
            values in proptest::collection::hash_map("[a-z]{1,8}", "[a-z0-9]{0,6}", 0..12),
        ) {
            let user: Map<String, Value> = values
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();

            let forward = partition(&user, &decls);
            let again = partition(&user, &decls);
            prop_assert_eq!(&forward, &again);

            let mut reversed_decls = decls.clone();
            reversed_decls.reverse();
            prop_assert_eq!(forward, partition(&user, &reversed_decls));
        }

        #[test]
        fn every_placed_value_was_declared_and_supplied(
            decls in arb_decls(),
            values in proptest::collection::hash_map("[a-z]{1,8}", "[a-z0-9]{0,6}", 0..12),
        ) {
            let user: Map<String, Value> = values
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();

            let parts = partition(&user, &decls);
            let placed = parts.path.len()
                + parts.query.len()
                + parts.header.len()
                + parts.body.len();
            let expected = decls.iter().filter(|d| user.contains_key(&d.name)).count();
            prop_assert_eq!(placed, expected);
        }
    }
}
