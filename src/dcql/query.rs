//! # DCQL Wire Model
//!
//! Data types for the `dcql_query` JSON surface, shaped for bit-exact
//! round-tripping: property names are the exact wire tokens, optional
//! properties are omitted (not `null`) on encode, and defaults are not
//! re-emitted. The one irregular shape is `claim_sets`, which travels as a
//! flat array of id arrays and is modelled as [`ClaimSetQuery`] values.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::pattern::ClaimPattern;

/// A complete verifier query: which credentials are requested, and which
/// combinations satisfy the request.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct DcqlQuery {
    /// The requested credentials, each with a unique `id`.
    pub credentials: Vec<CredentialQuery>,

    /// Acceptable combinations of the credentials above. Absent means every
    /// credential query is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_sets: Option<Vec<CredentialSetQuery>>,
}

/// A request for one credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct CredentialQuery {
    /// Identifies this query within the request; unique across the query.
    pub id: String,

    /// The credential format identifier (e.g. `dc+sd-jwt`, `mso_mdoc`).
    pub format: String,

    /// Format-specific type constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaQuery>,

    /// The claims requested from the credential. Absent or empty requests
    /// the credential without claim constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<Vec<ClaimsQuery>>,

    /// Acceptable combinations of the claims above. On the wire this is a
    /// flat array of claim-id arrays.
    #[serde(default, with = "claim_sets_wire", skip_serializing_if = "Option::is_none")]
    pub claim_sets: Option<Vec<ClaimSetQuery>>,

    /// Issuers the verifier trusts for this credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_authorities: Option<Vec<TrustedAuthoritiesQuery>>,
}

/// Format-specific type constraints for a [`CredentialQuery`].
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct MetaQuery {
    /// Acceptable `vct` values for SD-JWT family credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vct_values: Option<Vec<String>>,

    /// The acceptable document type for mdoc credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctype_value: Option<String>,
}

/// A request for one claim within a credential.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ClaimsQuery {
    /// Identifies the claim for `claim_sets` references. Defaults to the
    /// string form of `path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Where the claim lives inside the credential.
    pub path: ClaimPattern,

    /// Whether the claim must be present for the credential to match.
    /// Ignored when the credential query carries `claim_sets`.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub required: bool,

    /// Acceptable claim values. Absent accepts any value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<ClaimValue>>,

    /// mdoc-specific: whether the verifier intends to retain the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_to_retain: Option<bool>,
}

impl ClaimsQuery {
    /// The identifier used by `claim_sets` references: the explicit `id` or
    /// the string form of the path.
    #[must_use]
    pub fn effective_id(&self) -> String {
        self.id.clone().unwrap_or_else(|| self.path.to_string())
    }
}

/// Alternative claim combinations for one credential query: the outer list
/// is an OR over options, each option an AND over claim ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimSetQuery {
    /// The acceptable claim-id combinations, in preference order.
    pub options: Vec<Vec<String>>,

    /// Whether at least one option must be satisfied. Defaults to true.
    pub required: bool,
}

impl Default for ClaimSetQuery {
    fn default() -> Self {
        Self { options: Vec::new(), required: true }
    }
}

/// Alternative credential combinations: the outer list is an OR over
/// options, each option an AND over credential-query ids.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CredentialSetQuery {
    /// The acceptable credential-id combinations, in preference order.
    pub options: Vec<Vec<String>>,

    /// Whether one of the options must be satisfiable. Defaults to true.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub required: bool,

    /// Why the verifier requests this combination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

/// Issuers (or trust framework entries) acceptable for a credential query.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TrustedAuthoritiesQuery {
    /// The trust mechanism (e.g. `aki`, `etsi_tl`, `openid_federation`).
    #[serde(rename = "type")]
    pub authority_type: String,

    /// Mechanism-specific identifier values.
    pub values: Vec<String>,
}

/// A claim value carried by the wire or extracted from a credential.
///
/// The query wire format admits only strings, 64-bit integers and booleans.
/// Extraction from credentials may additionally produce floating-point
/// numbers; comparison between any two numeric values goes through `f64`
/// (JSON does not distinguish integers from numbers).
#[derive(Clone, Debug, PartialEq)]
pub enum ClaimValue {
    /// A string value.
    String(String),

    /// An integer value.
    Integer(i64),

    /// A floating-point value (never produced by the query decoder).
    Number(f64),

    /// A boolean value.
    Bool(bool),
}

impl ClaimValue {
    /// Loose equality for claim matching: ordinal comparison for strings,
    /// `==` for booleans, `f64` comparison between any two numerics. The
    /// numeric rule is deliberate — the wire does not distinguish JSON
    /// integers from JSON numbers.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn loosely_equals(&self, other: &Self) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Number(value) => Some(*value),
            Self::String(_) | Self::Bool(_) => None,
        }
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for ClaimValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl Serialize for ClaimValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(value) => serializer.serialize_str(value),
            Self::Integer(value) => serializer.serialize_i64(*value),
            Self::Number(value) => serializer.serialize_f64(*value),
            Self::Bool(value) => serializer.serialize_bool(*value),
        }
    }
}

impl<'de> Deserialize<'de> for ClaimValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl Visitor<'_> for ValueVisitor {
            type Value = ClaimValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string, a 64-bit integer, or a boolean")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(ClaimValue::String(value.to_string()))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                Ok(ClaimValue::Integer(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                i64::try_from(value)
                    .map(ClaimValue::Integer)
                    .map_err(|_| E::custom("integer value out of 64-bit signed range"))
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
                Ok(ClaimValue::Bool(value))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

const fn default_true() -> bool {
    true
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_true(value: &bool) -> bool {
    *value
}

/// `claim_sets` travels as a flat array of string arrays. Decoding folds the
/// alternatives into a single required [`ClaimSetQuery`]; encoding emits
/// every option across every set, order preserved.
mod claim_sets_wire {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::ClaimSetQuery;

    pub fn serialize<S: Serializer>(
        value: &Option<Vec<ClaimSetQuery>>, serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let flat: Vec<&Vec<String>> =
            value.iter().flatten().flat_map(|set| &set.options).collect();
        flat.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<ClaimSetQuery>>, D::Error> {
        let options = Vec::<Vec<String>>::deserialize(deserializer)?;
        Ok(Some(vec![ClaimSetQuery { options, required: true }]))
    }
}
