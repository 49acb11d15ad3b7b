//! # Query Evaluation
//!
//! The fine-grained phase: decides, for each (credential, credential-query)
//! pair, whether the credential matches, which claim patterns were
//! satisfied, and which patterns must be disclosed. Rejections carry a
//! structured reason and never abort the stream — the next candidate is
//! always attempted.

use std::collections::HashSet;

use super::path::ClaimPath;
use super::pattern::{ClaimPattern, PathResolver};
use super::prepare::{PreparedQuery, type_constraints};
use super::query::{ClaimValue, ClaimsQuery, CredentialQuery};

/// What the evaluator needs to know about a credential without touching its
/// claim values.
#[derive(Clone, Debug, Default)]
pub struct CredentialMetadata {
    /// The credential's format identifier.
    pub format: String,

    /// The credential's type (`vct` for SD-JWT, doctype for mdoc), when
    /// known.
    pub credential_type: Option<String>,

    /// The credential's issuer identifier, when known.
    pub issuer: Option<String>,

    /// The set of claim paths the credential carries, when enumerable.
    /// Wildcard patterns can only be expanded against a known universe.
    pub available_paths: Option<HashSet<ClaimPath>>,
}

/// A candidate credential the evaluator can interrogate.
///
/// Implemented per credential format; the engine stays format-agnostic and
/// only sees metadata and claim lookups.
pub trait Queryable {
    /// The credential's metadata.
    fn metadata(&self) -> CredentialMetadata;

    /// The value of the claim at `path`, if the credential carries one.
    fn claim(&self, path: &ClaimPath) -> Option<ClaimValue>;
}

/// One successful (credential, credential-query) pairing.
#[derive(Debug)]
pub struct QueryMatch<'a, C> {
    /// The matching credential.
    pub credential: &'a C,

    /// The credential query it satisfies.
    pub credential_query_id: String,

    /// Every requested pattern the credential satisfied.
    pub matched_patterns: HashSet<ClaimPattern>,

    /// The patterns that must be disclosed: the union of required claims
    /// query paths across the credential query.
    pub required_disclosure_patterns: HashSet<ClaimPattern>,
}

/// Why a (credential, credential-query) pairing was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectionReason {
    /// The credential's format differs from the query's.
    FormatMismatch,

    /// The credential's type is not in the query's constraint set.
    TypeNotAccepted,

    /// The credential's issuer is not named by any trusted authority.
    IssuerNotTrusted,

    /// A required claim is absent. Carries the pattern's string form.
    MissingRequiredClaim(String),

    /// A required claim is present but none of the acceptable values
    /// matched. Carries the pattern's string form.
    ValueConstraintFailed(String),

    /// No option of a required claim set was satisfied.
    ClaimSetUnsatisfied,
}

/// One rejected (credential, credential-query) pairing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    /// Position of the credential in the candidate sequence.
    pub credential_index: usize,

    /// The credential query the credential failed against.
    pub credential_query_id: String,

    /// Why it failed.
    pub reason: RejectionReason,
}

/// The outcome of evaluating a candidate sequence.
#[derive(Debug, Default)]
pub struct Evaluation<'a, C> {
    /// Successful pairings, in candidate order.
    pub matches: Vec<QueryMatch<'a, C>>,

    /// Rejected pairings with reasons, in candidate order.
    pub rejections: Vec<Rejection>,
}

/// Evaluate `candidates` against a prepared query.
///
/// Every credential is tried against every credential query; a credential
/// may therefore appear in several matches. The candidate sequence is
/// consumed lazily on the caller's thread — dropping the iterator early is
/// the cancellation mechanism.
pub fn evaluate<'a, C: Queryable>(
    prepared: &PreparedQuery, candidates: impl IntoIterator<Item = &'a C>,
) -> Evaluation<'a, C> {
    let mut evaluation = Evaluation { matches: Vec::new(), rejections: Vec::new() };

    for (index, credential) in candidates.into_iter().enumerate() {
        let metadata = credential.metadata();
        for query in &prepared.query.credentials {
            match evaluate_one(query, &metadata, credential) {
                Ok((matched_patterns, required_disclosure_patterns)) => {
                    evaluation.matches.push(QueryMatch {
                        credential,
                        credential_query_id: query.id.clone(),
                        matched_patterns,
                        required_disclosure_patterns,
                    });
                }
                Err(reason) => {
                    tracing::debug!(credential = index, query = %query.id, ?reason, "rejected");
                    evaluation.rejections.push(Rejection {
                        credential_index: index,
                        credential_query_id: query.id.clone(),
                        reason,
                    });
                }
            }
        }
    }

    evaluation
}

type Patterns = HashSet<ClaimPattern>;

fn evaluate_one<C: Queryable>(
    query: &CredentialQuery, metadata: &CredentialMetadata, credential: &C,
) -> Result<(Patterns, Patterns), RejectionReason> {
    // format gate: byte-exact
    if metadata.format != query.format {
        return Err(RejectionReason::FormatMismatch);
    }

    // type gate: only rejects when the credential's type is actually known
    if let Some(constraints) = type_constraints(query) {
        if let Some(credential_type) = &metadata.credential_type {
            if !constraints.contains(credential_type) {
                return Err(RejectionReason::TypeNotAccepted);
            }
        }
    }

    // issuer gate: same missing-metadata leniency
    if let Some(authorities) = &query.trusted_authorities {
        if !authorities.is_empty() {
            if let Some(issuer) = &metadata.issuer {
                if !authorities.iter().any(|authority| authority.values.contains(issuer)) {
                    return Err(RejectionReason::IssuerNotTrusted);
                }
            }
        }
    }

    let Some(claims) = query.claims.as_ref().filter(|claims| !claims.is_empty()) else {
        // no claim constraints: the credential matches as a whole
        return Ok((HashSet::new(), HashSet::new()));
    };

    // individual `required` flags only count when no claim sets are present
    let claim_sets_decide = query.claim_sets.is_some();

    let mut matched_patterns = HashSet::new();
    let mut failure: Option<RejectionReason> = None;

    for claim in claims {
        match check_claim(claim, metadata, credential) {
            ClaimOutcome::Satisfied => {
                matched_patterns.insert(claim.path.clone());
            }
            ClaimOutcome::Absent => {
                if claim.required && !claim_sets_decide && failure.is_none() {
                    failure =
                        Some(RejectionReason::MissingRequiredClaim(claim.path.to_string()));
                }
            }
            ClaimOutcome::ValueMismatch => {
                if claim.required && !claim_sets_decide && failure.is_none() {
                    failure =
                        Some(RejectionReason::ValueConstraintFailed(claim.path.to_string()));
                }
            }
        }
    }

    if let Some(reason) = failure {
        return Err(reason);
    }

    if let Some(claim_sets) = &query.claim_sets {
        let satisfied_ids: HashSet<String> = claims
            .iter()
            .filter(|claim| matched_patterns.contains(&claim.path))
            .map(ClaimsQuery::effective_id)
            .collect();

        for set in claim_sets.iter().filter(|set| set.required) {
            let satisfiable = set
                .options
                .iter()
                .any(|option| option.iter().all(|id| satisfied_ids.contains(id)));
            if !satisfiable {
                return Err(RejectionReason::ClaimSetUnsatisfied);
            }
        }
    }

    let required_disclosure_patterns = claims
        .iter()
        .filter(|claim| claim.required)
        .map(|claim| claim.path.clone())
        .collect();

    Ok((matched_patterns, required_disclosure_patterns))
}

enum ClaimOutcome {
    Satisfied,
    Absent,
    ValueMismatch,
}

/// Resolve one claims query against a credential: expand wildcards over the
/// credential's known paths, look up each candidate path, and apply the
/// value constraint. A claim is satisfied when at least one resolved path
/// yields an acceptable value.
fn check_claim<C: Queryable>(
    claim: &ClaimsQuery, metadata: &CredentialMetadata, credential: &C,
) -> ClaimOutcome {
    let resolved = PathResolver::resolve_all([&claim.path], metadata.available_paths.as_ref());

    let mut found_any = false;
    for path in &resolved {
        let Some(value) = credential.claim(path) else {
            continue;
        };
        found_any = true;

        match &claim.values {
            None => return ClaimOutcome::Satisfied,
            Some(acceptable) => {
                if acceptable.iter().any(|want| want.loosely_equals(&value)) {
                    return ClaimOutcome::Satisfied;
                }
            }
        }
    }

    if found_any { ClaimOutcome::ValueMismatch } else { ClaimOutcome::Absent }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::super::prepare::prepare;
    use super::*;

    /// An in-memory credential for exercising the engine.
    struct TestCredential {
        format: &'static str,
        credential_type: Option<&'static str>,
        issuer: Option<&'static str>,
        claims: HashMap<String, ClaimValue>,
        paths_known: bool,
    }

    impl TestCredential {
        fn sd_jwt(claims: &[(&str, ClaimValue)]) -> Self {
            Self {
                format: "dc+sd-jwt",
                credential_type: Some("IdentityCredential"),
                issuer: Some("https://issuer.example.com"),
                claims: claims
                    .iter()
                    .map(|(pointer, value)| ((*pointer).to_string(), value.clone()))
                    .collect(),
                paths_known: true,
            }
        }
    }

    impl Queryable for TestCredential {
        fn metadata(&self) -> CredentialMetadata {
            CredentialMetadata {
                format: self.format.to_string(),
                credential_type: self.credential_type.map(ToString::to_string),
                issuer: self.issuer.map(ToString::to_string),
                available_paths: self.paths_known.then(|| {
                    self.claims
                        .keys()
                        .map(|pointer| ClaimPath::from_pointer(pointer).expect("valid pointer"))
                        .collect()
                }),
            }
        }

        fn claim(&self, path: &ClaimPath) -> Option<ClaimValue> {
            self.claims.get(&path.to_string()).cloned()
        }
    }

    fn prepared(value: serde_json::Value) -> PreparedQuery {
        prepare(serde_json::from_value(value).expect("should deserialize"))
    }

    #[test]
    fn simple_match_with_disclosure() {
        let prepared = prepared(json!({
            "credentials": [{
                "id": "pid",
                "format": "dc+sd-jwt",
                "claims": [{ "path": ["given_name"] }, { "path": ["family_name"] }]
            }]
        }));
        let alice = TestCredential::sd_jwt(&[
            ("/given_name", ClaimValue::from("Alice")),
            ("/family_name", ClaimValue::from("Smith")),
            ("/birthdate", ClaimValue::from("1990-01-01")),
        ]);

        let outcome = evaluate(&prepared, [&alice]);
        assert_eq!(outcome.matches.len(), 1);
        assert!(outcome.rejections.is_empty());

        let matched = &outcome.matches[0];
        assert_eq!(matched.credential_query_id, "pid");
        assert_eq!(matched.matched_patterns.len(), 2);
        assert_eq!(matched.required_disclosure_patterns, matched.matched_patterns);
    }

    #[test]
    fn format_gate_is_byte_exact() {
        let prepared = prepared(json!({
            "credentials": [{ "id": "pid", "format": "mso_mdoc" }]
        }));
        let alice = TestCredential::sd_jwt(&[]);

        let outcome = evaluate(&prepared, [&alice]);
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.rejections[0].reason, RejectionReason::FormatMismatch);
    }

    #[test]
    fn unknown_metadata_passes_type_and_issuer_gates() {
        let prepared = prepared(json!({
            "credentials": [{
                "id": "pid",
                "format": "dc+sd-jwt",
                "meta": { "vct_values": ["SomethingElse"] },
                "trusted_authorities": [{ "type": "aki", "values": ["untrusted"] }]
            }]
        }));

        let mut anonymous = TestCredential::sd_jwt(&[]);
        anonymous.credential_type = None;
        anonymous.issuer = None;

        let outcome = evaluate(&prepared, [&anonymous]);
        assert_eq!(outcome.matches.len(), 1);
    }

    #[test]
    fn known_metadata_is_enforced() {
        let prepared = prepared(json!({
            "credentials": [{
                "id": "pid",
                "format": "dc+sd-jwt",
                "meta": { "vct_values": ["SomethingElse"] }
            }]
        }));
        let alice = TestCredential::sd_jwt(&[]);

        let outcome = evaluate(&prepared, [&alice]);
        assert_eq!(outcome.rejections[0].reason, RejectionReason::TypeNotAccepted);
    }

    #[test]
    fn wildcard_expansion() {
        let prepared = prepared(json!({
            "credentials": [{
                "id": "pid",
                "format": "dc+sd-jwt",
                "claims": [{ "path": ["citizenship", null, "country"] }]
            }]
        }));
        let traveller = TestCredential::sd_jwt(&[
            ("/citizenship/0/country", ClaimValue::from("FI")),
            ("/citizenship/1/country", ClaimValue::from("FI")),
        ]);

        let outcome = evaluate(&prepared, [&traveller]);
        assert_eq!(outcome.matches.len(), 1);
        let pattern: &ClaimPattern =
            outcome.matches[0].matched_patterns.iter().next().expect("one pattern");
        assert!(pattern.has_wildcards());
    }

    #[test]
    fn value_constraints_use_loose_equality() {
        let prepared = prepared(json!({
            "credentials": [{
                "id": "pid",
                "format": "dc+sd-jwt",
                "claims": [{ "path": ["age"], "values": [18] }]
            }]
        }));

        let exact = TestCredential::sd_jwt(&[("/age", ClaimValue::Number(18.0))]);
        let outcome = evaluate(&prepared, [&exact]);
        assert_eq!(outcome.matches.len(), 1);

        let wrong = TestCredential::sd_jwt(&[("/age", ClaimValue::Integer(17))]);
        let outcome = evaluate(&prepared, [&wrong]);
        assert!(matches!(
            outcome.rejections[0].reason,
            RejectionReason::ValueConstraintFailed(_)
        ));
    }

    #[test]
    fn missing_required_claim_rejects() {
        let prepared = prepared(json!({
            "credentials": [{
                "id": "pid",
                "format": "dc+sd-jwt",
                "claims": [{ "path": ["given_name"] }, { "path": ["tax_id"] }]
            }]
        }));
        let alice = TestCredential::sd_jwt(&[("/given_name", ClaimValue::from("Alice"))]);

        let outcome = evaluate(&prepared, [&alice]);
        assert_eq!(
            outcome.rejections[0].reason,
            RejectionReason::MissingRequiredClaim("/tax_id".to_string())
        );
    }

    #[test]
    fn optional_claims_do_not_reject() {
        let prepared = prepared(json!({
            "credentials": [{
                "id": "pid",
                "format": "dc+sd-jwt",
                "claims": [
                    { "path": ["given_name"] },
                    { "path": ["nickname"], "required": false }
                ]
            }]
        }));
        let alice = TestCredential::sd_jwt(&[("/given_name", ClaimValue::from("Alice"))]);

        let outcome = evaluate(&prepared, [&alice]);
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].matched_patterns.len(), 1);
    }

    #[test]
    fn claim_set_alternatives() {
        let wire = json!({
            "credentials": [{
                "id": "pid",
                "format": "dc+sd-jwt",
                "claims": [
                    { "id": "a", "path": ["a"] },
                    { "id": "b", "path": ["b"] },
                    { "id": "c", "path": ["c"] }
                ],
                "claim_sets": [["a", "b"], ["c"]]
            }]
        });

        // only claim c: the second alternative is satisfied
        let only_c = TestCredential::sd_jwt(&[("/c", ClaimValue::from("x"))]);
        let outcome = evaluate(&prepared(wire.clone()), [&only_c]);
        assert_eq!(outcome.matches.len(), 1);

        // only claim a: neither ["a","b"] nor ["c"] is satisfiable
        let only_a = TestCredential::sd_jwt(&[("/a", ClaimValue::from("x"))]);
        let outcome = evaluate(&prepared(wire), [&only_a]);
        assert_eq!(outcome.rejections[0].reason, RejectionReason::ClaimSetUnsatisfied);
    }

    #[test]
    fn claim_sets_override_required_flags() {
        // identical apart from `required` flags on individual claims; with
        // claim sets present the outcome must not change
        let with_required = json!({
            "credentials": [{
                "id": "pid", "format": "dc+sd-jwt",
                "claims": [
                    { "id": "a", "path": ["a"] },
                    { "id": "b", "path": ["b"] }
                ],
                "claim_sets": [["a"], ["b"]]
            }]
        });
        let without_required = json!({
            "credentials": [{
                "id": "pid", "format": "dc+sd-jwt",
                "claims": [
                    { "id": "a", "path": ["a"], "required": false },
                    { "id": "b", "path": ["b"], "required": false }
                ],
                "claim_sets": [["a"], ["b"]]
            }]
        });

        let only_b = TestCredential::sd_jwt(&[("/b", ClaimValue::from("x"))]);
        assert_eq!(evaluate(&prepared(with_required), [&only_b]).matches.len(), 1);
        assert_eq!(evaluate(&prepared(without_required), [&only_b]).matches.len(), 1);
    }

    #[test]
    fn empty_claims_list_matches_whole_credential() {
        let prepared = prepared(json!({
            "credentials": [{ "id": "pid", "format": "dc+sd-jwt", "claims": [] }]
        }));
        let alice = TestCredential::sd_jwt(&[("/given_name", ClaimValue::from("Alice"))]);

        let outcome = evaluate(&prepared, [&alice]);
        assert_eq!(outcome.matches.len(), 1);
        assert!(outcome.matches[0].matched_patterns.is_empty());
    }

    #[test]
    fn coarse_predicates_are_necessary_for_matches() {
        let prepared = prepared(json!({
            "credentials": [{
                "id": "pid",
                "format": "dc+sd-jwt",
                "meta": { "vct_values": ["IdentityCredential"] },
                "claims": [{ "path": ["given_name"] }],
                "trusted_authorities": [{ "type": "aki", "values": ["https://issuer.example.com"] }]
            }]
        }));
        let alice = TestCredential::sd_jwt(&[("/given_name", ClaimValue::from("Alice"))]);

        let outcome = evaluate(&prepared, [&alice]);
        assert_eq!(outcome.matches.len(), 1);

        // every match satisfies the coarse predicates for its query
        let metadata = alice.metadata();
        let coarse = &prepared.coarse_predicates[0];
        assert_eq!(metadata.format, coarse.must_match_format);
        let credential_type = metadata.credential_type.expect("known type");
        assert!(coarse.must_match_any_type.as_ref().expect("set").contains(&credential_type));
        let issuer = metadata.issuer.expect("known issuer");
        assert!(coarse.must_match_any_issuer.as_ref().expect("set").contains(&issuer));
        let available = metadata.available_paths.expect("known paths");
        for pattern in coarse.must_have_patterns.as_ref().expect("set") {
            assert!(available.iter().any(|path| pattern.matches(path)));
        }
    }
}
