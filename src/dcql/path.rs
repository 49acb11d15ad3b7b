//! # Claim Path
//!
//! A normalized address of one claim inside a credential. JSON credentials
//! address claims with a JSON Pointer; ISO mdoc credentials address them as
//! a namespace plus element identifier. Both erase into the same
//! [`ClaimPath`] identity so the evaluator can compare and hash them
//! uniformly.

use std::fmt;

use anyhow::{Result, bail};

/// One step of a [`ClaimPath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A property name.
    Key(String),

    /// An array position.
    Index(usize),
}

/// A normalized, comparable claim address.
///
/// Displays as a JSON Pointer (RFC 6901), with `~` and `/` escaped inside
/// tokens.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClaimPath(Vec<PathSegment>);

impl ClaimPath {
    /// Build a path from explicit segments.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty segment list — the root is not a claim.
    pub fn new(segments: Vec<PathSegment>) -> Result<Self> {
        if segments.is_empty() {
            bail!("a claim path cannot be empty");
        }
        Ok(Self(segments))
    }

    /// Parse a JSON Pointer. Tokens consisting solely of digits are treated
    /// as array positions; everything else is a property name.
    ///
    /// # Errors
    ///
    /// Returns an error if the pointer does not start with `/`, is empty, or
    /// contains an invalid `~` escape.
    pub fn from_pointer(pointer: &str) -> Result<Self> {
        let Some(rest) = pointer.strip_prefix('/') else {
            bail!("JSON Pointer must start with '/': {pointer}");
        };

        let mut segments = Vec::new();
        for token in rest.split('/') {
            let unescaped = unescape(token)?;
            if !unescaped.is_empty() && unescaped.bytes().all(|b| b.is_ascii_digit()) {
                // leading zeros stay property names ("01" is not an index)
                if unescaped.len() == 1 || !unescaped.starts_with('0') {
                    segments.push(PathSegment::Index(
                        unescaped.parse().map_err(|e| anyhow::anyhow!("index too large: {e}"))?,
                    ));
                    continue;
                }
            }
            segments.push(PathSegment::Key(unescaped));
        }
        Self::new(segments)
    }

    /// The identity of an ISO mdoc claim: namespace plus element identifier.
    #[must_use]
    pub fn from_mdoc(namespace: &str, element: &str) -> Self {
        Self(vec![PathSegment::Key(namespace.to_string()), PathSegment::Key(element.to_string())])
    }

    /// Number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The segments, in order.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for ClaimPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            match segment {
                PathSegment::Key(key) => write!(f, "/{}", escape(key))?,
                PathSegment::Index(index) => write!(f, "/{index}")?,
            }
        }
        Ok(())
    }
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape(token: &str) -> Result<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => bail!("invalid '~' escape in pointer token: {token}"),
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}
