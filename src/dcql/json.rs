//! # JSON Credential Adapter
//!
//! A [`Queryable`] implementation over a `serde_json` claims document, for
//! credential formats whose claims are plain JSON (SD-JWT payloads, W3C VC
//! subjects). Claim paths walk objects by key and arrays by index; the
//! available-path universe enumerates every node so wildcard patterns can
//! expand, while claim extraction yields primitives only.

use std::collections::HashSet;

use serde_json::Value;

use super::evaluate::{CredentialMetadata, Queryable};
use super::path::{ClaimPath, PathSegment};
use super::query::ClaimValue;

/// A credential whose claims are a JSON document.
#[derive(Clone, Debug)]
pub struct JsonCredential {
    /// The credential's format identifier.
    pub format: String,

    /// The credential's type, when known.
    pub credential_type: Option<String>,

    /// The credential's issuer, when known.
    pub issuer: Option<String>,

    /// The claims document. The document root is not itself a claim.
    pub claims: Value,
}

impl JsonCredential {
    /// Wrap a claims document under a format identifier.
    #[must_use]
    pub fn new(format: impl Into<String>, claims: Value) -> Self {
        Self { format: format.into(), credential_type: None, issuer: None, claims }
    }

    /// Set the credential type.
    #[must_use]
    pub fn with_type(mut self, credential_type: impl Into<String>) -> Self {
        self.credential_type = Some(credential_type.into());
        self
    }

    /// Set the issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    fn node(&self, path: &ClaimPath) -> Option<&Value> {
        let mut current = &self.claims;
        for segment in path.segments() {
            current = match segment {
                PathSegment::Key(key) => current.as_object()?.get(key)?,
                PathSegment::Index(index) => current.as_array()?.get(*index)?,
            };
        }
        Some(current)
    }
}

impl Queryable for JsonCredential {
    fn metadata(&self) -> CredentialMetadata {
        let mut paths = HashSet::new();
        collect_paths(&self.claims, &mut Vec::new(), &mut paths);
        CredentialMetadata {
            format: self.format.clone(),
            credential_type: self.credential_type.clone(),
            issuer: self.issuer.clone(),
            available_paths: Some(paths),
        }
    }

    fn claim(&self, path: &ClaimPath) -> Option<ClaimValue> {
        match self.node(path)? {
            Value::String(value) => Some(ClaimValue::String(value.clone())),
            Value::Bool(value) => Some(ClaimValue::Bool(*value)),
            Value::Number(number) => number
                .as_i64()
                .map(ClaimValue::Integer)
                .or_else(|| number.as_f64().map(ClaimValue::Number)),
            // objects, arrays and null are not claim values
            Value::Object(_) | Value::Array(_) | Value::Null => None,
        }
    }
}

/// Record the path of every node below the root.
fn collect_paths(value: &Value, prefix: &mut Vec<PathSegment>, out: &mut HashSet<ClaimPath>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                prefix.push(PathSegment::Key(key.clone()));
                record(prefix, out);
                collect_paths(child, prefix, out);
                prefix.pop();
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                prefix.push(PathSegment::Index(index));
                record(prefix, out);
                collect_paths(child, prefix, out);
                prefix.pop();
            }
        }
        _ => {}
    }
}

fn record(prefix: &[PathSegment], out: &mut HashSet<ClaimPath>) {
    if let Ok(path) = ClaimPath::new(prefix.to_vec()) {
        out.insert(path);
    }
}
