//! # Claim Pattern
//!
//! The wire form of a claims query `path`: an ordered, non-empty sequence of
//! segments where `null` is a wildcard matching any array element at that
//! depth. A wildcard-free pattern resolves deterministically to a
//! [`ClaimPath`]; a pattern with wildcards is expanded against the set of
//! paths a credential is known to carry.

use std::collections::HashSet;
use std::fmt;

use anyhow::{Result, bail};
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::path::{ClaimPath, PathSegment};

/// One element of a claims query `path` array.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PatternSegment {
    /// A property name (`"address"`).
    Key(String),

    /// An array position (`0`).
    Index(usize),

    /// Any array element at this depth (`null` on the wire).
    Wildcard,
}

impl Serialize for PatternSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Key(key) => serializer.serialize_str(key),
            Self::Index(index) => serializer.serialize_u64(*index as u64),
            Self::Wildcard => serializer.serialize_unit(),
        }
    }
}

impl<'de> Deserialize<'de> for PatternSegment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SegmentVisitor;

        impl Visitor<'_> for SegmentVisitor {
            type Value = PatternSegment;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string, a non-negative integer, or null")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(PatternSegment::Key(value.to_string()))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                usize::try_from(value)
                    .map(PatternSegment::Index)
                    .map_err(|_| E::custom("array index out of range"))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                if value < 0 {
                    return Err(E::custom("array index cannot be negative"));
                }
                self.visit_u64(value.unsigned_abs())
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(PatternSegment::Wildcard)
            }
        }

        deserializer.deserialize_any(SegmentVisitor)
    }
}

/// An ordered, non-empty claims query path pattern.
///
/// Displays as a JSON Pointer with `*` in place of wildcards, which is also
/// the effective claim identifier when a claims query has no explicit `id`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClaimPattern(Vec<PatternSegment>);

impl ClaimPattern {
    /// Build a pattern from explicit segments.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty segment list.
    pub fn new(segments: Vec<PatternSegment>) -> Result<Self> {
        if segments.is_empty() {
            bail!("a claims query path cannot be empty");
        }
        Ok(Self(segments))
    }

    /// Shorthand for a pattern of property names only.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty key list.
    pub fn from_keys<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Result<Self> {
        Self::new(keys.into_iter().map(|key| PatternSegment::Key(key.into())).collect())
    }

    /// The segments, in order.
    #[must_use]
    pub fn segments(&self) -> &[PatternSegment] {
        &self.0
    }

    /// Number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Whether any segment is a wildcard.
    #[must_use]
    pub fn has_wildcards(&self) -> bool {
        self.0.iter().any(|segment| matches!(segment, PatternSegment::Wildcard))
    }

    /// Resolve to a concrete [`ClaimPath`]. Succeeds iff the pattern has no
    /// wildcards.
    #[must_use]
    pub fn try_resolve(&self) -> Option<ClaimPath> {
        let segments: Option<Vec<PathSegment>> = self
            .0
            .iter()
            .map(|segment| match segment {
                PatternSegment::Key(key) => Some(PathSegment::Key(key.clone())),
                PatternSegment::Index(index) => Some(PathSegment::Index(*index)),
                PatternSegment::Wildcard => None,
            })
            .collect();
        // non-empty by construction
        segments.and_then(|segments| ClaimPath::new(segments).ok())
    }

    /// Whether `path` has the same depth and every non-wildcard segment
    /// equals the corresponding path segment.
    #[must_use]
    pub fn matches(&self, path: &ClaimPath) -> bool {
        if self.depth() != path.depth() {
            return false;
        }
        self.0.iter().zip(path.segments()).all(|(pattern, concrete)| match (pattern, concrete) {
            (PatternSegment::Key(a), PathSegment::Key(b)) => a == b,
            (PatternSegment::Index(a), PathSegment::Index(b)) => a == b,
            (PatternSegment::Wildcard, _) => true,
            _ => false,
        })
    }
}

impl fmt::Display for ClaimPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            match segment {
                PatternSegment::Key(key) => {
                    write!(f, "/{}", key.replace('~', "~0").replace('/', "~1"))?;
                }
                PatternSegment::Index(index) => write!(f, "/{index}")?,
                PatternSegment::Wildcard => write!(f, "/*")?,
            }
        }
        Ok(())
    }
}

impl Serialize for ClaimPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ClaimPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PatternVisitor;

        impl<'de> Visitor<'de> for PatternVisitor {
            type Value = ClaimPattern;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a non-empty array of path segments")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut segments = Vec::new();
                while let Some(segment) = seq.next_element::<PatternSegment>()? {
                    segments.push(segment);
                }
                ClaimPattern::new(segments).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_seq(PatternVisitor)
    }
}

/// Expands claim patterns to the concrete paths they address.
pub struct PathResolver;

impl PathResolver {
    /// Resolve every pattern in `patterns`.
    ///
    /// Concrete patterns resolve directly. Wildcard patterns enumerate
    /// `available_paths`, keeping every path they match; when
    /// `available_paths` is unknown, wildcard patterns are skipped.
    pub fn resolve_all<'a>(
        patterns: impl IntoIterator<Item = &'a ClaimPattern>,
        available_paths: Option<&HashSet<ClaimPath>>,
    ) -> HashSet<ClaimPath> {
        let mut resolved = HashSet::new();
        for pattern in patterns {
            if let Some(path) = pattern.try_resolve() {
                resolved.insert(path);
            } else if let Some(available) = available_paths {
                resolved.extend(available.iter().filter(|path| pattern.matches(path)).cloned());
            }
        }
        resolved
    }
}
