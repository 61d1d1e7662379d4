// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// A versioned specification document. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecDocument {
    /// Version string the document is keyed by, e.g. `v1.41`.
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// All endpoints described by this version of the API.
    pub endpoints: Vec<Endpoint>,
}

/// One HTTP method + path template pair, identified by its operation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Symbolic operation id, e.g. `ContainerList`.
    pub operation: String,

    pub method: Method,

    /// Path template with `{name}` slots, e.g. `/containers/{id}/json`.
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ordered parameter declarations.
    #[serde(default)]
    pub params: Vec<ParameterDeclaration>,
}

impl Endpoint {
    /// First segment of the path template, used to group operations.
    pub fn category(&self) -> &str {
        self.path
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }
}

/// A declared request parameter. Every declaration has exactly one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDeclaration {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParamLocation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version: v1.41
endpoints:
  - operation: ContainerList
    method: get
    path: /containers/json
    params:
      - name: all
        in: query
  - operation: ContainerInspect
    method: get
    path: /containers/{id}/json
    description: Return low-level information about a container.
    params:
      - name: id
        in: path
        description: ID or name of the container
      - name: size
        in: query
"#;

    #[test]
    fn test_parse_document() {
        let doc: SpecDocument = serde_yaml::from_str(SAMPLE).expect("parse sample");
        assert_eq!(doc.version, "v1.41");
        assert_eq!(doc.endpoints.len(), 2);

        let inspect = &doc.endpoints[1];
        assert_eq!(inspect.operation, "ContainerInspect");
        assert_eq!(inspect.method, Method::Get);
        assert_eq!(inspect.path, "/containers/{id}/json");
        assert_eq!(inspect.params.len(), 2);
        assert_eq!(inspect.params[0].location, ParamLocation::Path);
        assert_eq!(inspect.params[1].location, ParamLocation::Query);
    }

    #[test]
    fn test_category() {
        let doc: SpecDocument = serde_yaml::from_str(SAMPLE).expect("parse sample");
        assert_eq!(doc.endpoints[0].category(), "containers");
    }

    #[test]
    fn test_unknown_location_rejected() {
        let bad = r#"
version: v1.41
endpoints:
  - operation: X
    method: get
    path: /x
    params:
      - name: a
        in: cookie
"#;
        let res: Result<SpecDocument, _> = serde_yaml::from_str(bad);
        assert!(res.is_err());
    }
}
