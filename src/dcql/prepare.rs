//! # Query Preparation
//!
//! Validates a [`DcqlQuery`] once and extracts the storage-level predicates,
//! so the per-credential evaluation phase repeats none of this work.
//! Validation problems do not fail preparation — they accumulate on the
//! prepared query and render it invalid.

use std::collections::HashSet;

use super::pattern::ClaimPattern;
use super::query::{CredentialQuery, DcqlQuery};
use super::format;

/// Properties derivable from credential metadata alone that are necessary —
/// not sufficient — for a credential to match one [`CredentialQuery`].
///
/// Storage uses these to discard non-candidates before the fine-grained
/// phase touches claim values.
#[derive(Clone, Debug, PartialEq)]
pub struct CoarsePredicates {
    /// The credential query these predicates were extracted from.
    pub credential_query_id: String,

    /// The credential's format must equal this string, byte for byte.
    pub must_match_format: String,

    /// When present, the credential's type must be one of these.
    pub must_match_any_type: Option<HashSet<String>>,

    /// When present, the credential must carry claims at all of these
    /// paths. Extracted only from unconditionally required claims.
    pub must_have_patterns: Option<HashSet<ClaimPattern>>,

    /// When present, the credential's issuer must be one of these.
    pub must_match_any_issuer: Option<HashSet<String>>,
}

/// A validated query plus everything the evaluator and the storage filter
/// need, computed once per verifier request.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedQuery {
    /// The query as received.
    pub query: DcqlQuery,

    /// One predicate set per credential query, in query order.
    pub coarse_predicates: Vec<CoarsePredicates>,

    /// The union of every claims query path across all credential queries.
    pub all_requested_patterns: HashSet<ClaimPattern>,

    /// The distinct formats requested.
    pub requested_formats: HashSet<String>,

    /// Human-readable validation problems. Non-empty means the query must
    /// not be evaluated.
    pub validation_issues: Vec<String>,
}

impl PreparedQuery {
    /// Whether the query passed validation.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validation_issues.is_empty()
    }
}

/// Validate `query` and extract its coarse predicates.
#[must_use]
pub fn prepare(query: DcqlQuery) -> PreparedQuery {
    let mut issues = Vec::new();

    if query.credentials.is_empty() {
        issues.push("at least one credential query is required".to_string());
    }

    let mut ids: HashSet<&str> = HashSet::new();
    for credential in &query.credentials {
        if credential.id.is_empty() {
            issues.push("credential query with an empty id".to_string());
        }
        if credential.format.is_empty() {
            issues.push(format!("credential query '{}' has an empty format", credential.id));
        }
        if !ids.insert(&credential.id) {
            issues.push(format!("duplicate credential query id '{}'", credential.id));
        }

        if let Some(claim_sets) = &credential.claim_sets {
            let claim_ids: HashSet<String> = credential
                .claims
                .iter()
                .flatten()
                .map(super::query::ClaimsQuery::effective_id)
                .collect();
            for referenced in claim_sets.iter().flat_map(|set| set.options.iter().flatten()) {
                if !claim_ids.contains(referenced) {
                    issues.push(format!(
                        "claim set in credential query '{}' references undefined claim '{referenced}'",
                        credential.id
                    ));
                }
            }
        }
    }

    if let Some(credential_sets) = &query.credential_sets {
        for referenced in credential_sets.iter().flat_map(|set| set.options.iter().flatten()) {
            if !ids.contains(referenced.as_str()) {
                issues.push(format!(
                    "credential set references undefined credential query '{referenced}'"
                ));
            }
        }
    }

    let coarse_predicates = query
        .credentials
        .iter()
        .map(|credential| CoarsePredicates {
            credential_query_id: credential.id.clone(),
            must_match_format: credential.format.clone(),
            must_match_any_type: type_constraints(credential),
            must_have_patterns: required_patterns(credential),
            must_match_any_issuer: trusted_issuers(credential),
        })
        .collect();

    let all_requested_patterns = query
        .credentials
        .iter()
        .flat_map(|credential| credential.claims.iter().flatten())
        .map(|claim| claim.path.clone())
        .collect();

    let requested_formats =
        query.credentials.iter().map(|credential| credential.format.clone()).collect();

    PreparedQuery {
        query,
        coarse_predicates,
        all_requested_patterns,
        requested_formats,
        validation_issues: issues,
    }
}

/// The type-constraint set for a credential query, selected by format: the
/// SD-JWT family reads `vct_values`, mdoc reads `doctype_value`, unknown
/// formats take whichever is present (`vct_values` first).
pub(super) fn type_constraints(credential: &CredentialQuery) -> Option<HashSet<String>> {
    let meta = credential.meta.as_ref()?;
    let vct = || meta.vct_values.as_ref().map(|values| values.iter().cloned().collect());
    let doctype = || meta.doctype_value.as_ref().map(|value| HashSet::from([value.clone()]));

    match credential.format.as_str() {
        format::SD_JWT | format::SD_CWT => vct(),
        format::MSO_MDOC => doctype(),
        _ => vct().or_else(doctype),
    }
}

/// Paths of unconditionally required claims. `None` when there is no claims
/// list, no claim is required, or `claim_sets` makes individual `required`
/// flags moot — a coarse predicate must never filter out a credential the
/// fine phase would accept.
fn required_patterns(credential: &CredentialQuery) -> Option<HashSet<ClaimPattern>> {
    if credential.claim_sets.is_some() {
        return None;
    }
    let patterns: HashSet<ClaimPattern> = credential
        .claims
        .as_ref()?
        .iter()
        .filter(|claim| claim.required)
        .map(|claim| claim.path.clone())
        .collect();
    if patterns.is_empty() { None } else { Some(patterns) }
}

/// The union of `values` across all trusted authorities, absent when the
/// query names none.
fn trusted_issuers(credential: &CredentialQuery) -> Option<HashSet<String>> {
    let authorities = credential.trusted_authorities.as_ref()?;
    let issuers: HashSet<String> =
        authorities.iter().flat_map(|authority| authority.values.iter().cloned()).collect();
    if issuers.is_empty() { None } else { Some(issuers) }
}
