//! End-to-end DCQL: decode, prepare, evaluate, and bit-exact re-encode.

use std::collections::{HashMap, HashSet};

use serde_json::json;
use verifiable_core::dcql::{
    ClaimPath, ClaimValue, CredentialMetadata, DcqlQuery, Queryable, prepare,
};

/// An in-memory SD-JWT-flavored credential.
struct Credential {
    format: &'static str,
    credential_type: &'static str,
    issuer: &'static str,
    claims: HashMap<String, ClaimValue>,
}

impl Credential {
    fn new(claims: &[(&str, &str)]) -> Self {
        Self {
            format: "dc+sd-jwt",
            credential_type: "IdentityCredential",
            issuer: "https://issuer.example.com",
            claims: claims
                .iter()
                .map(|(pointer, value)| ((*pointer).to_string(), ClaimValue::from(*value)))
                .collect(),
        }
    }
}

impl Queryable for Credential {
    fn metadata(&self) -> CredentialMetadata {
        CredentialMetadata {
            format: self.format.to_string(),
            credential_type: Some(self.credential_type.to_string()),
            issuer: Some(self.issuer.to_string()),
            available_paths: Some(
                self.claims
                    .keys()
                    .map(|pointer| ClaimPath::from_pointer(pointer).expect("valid pointer"))
                    .collect::<HashSet<_>>(),
            ),
        }
    }

    fn claim(&self, path: &ClaimPath) -> Option<ClaimValue> {
        self.claims.get(&path.to_string()).cloned()
    }
}

#[test]
fn decode_prepare_evaluate() {
    let wire = json!({
        "credentials": [{
            "id": "identity",
            "format": "dc+sd-jwt",
            "claims": [
                { "path": ["given_name"] },
                { "path": ["family_name"] }
            ]
        }]
    });

    let query: DcqlQuery = serde_json::from_value(wire).expect("should decode");
    let prepared = prepare(query);
    assert!(prepared.is_valid());

    let alice = Credential::new(&[
        ("/given_name", "Alice"),
        ("/family_name", "Smith"),
        ("/birthdate", "1990-01-01"),
    ]);

    let outcome = verifiable_core::dcql::evaluate(&prepared, [&alice]);
    assert_eq!(outcome.matches.len(), 1);

    let matched = &outcome.matches[0];
    assert_eq!(matched.credential_query_id, "identity");
    assert_eq!(matched.matched_patterns, prepared.all_requested_patterns);
    assert_eq!(matched.required_disclosure_patterns, prepared.all_requested_patterns);
}

#[test]
fn wildcard_paths_expand_against_available_paths() {
    let wire = json!({
        "credentials": [{
            "id": "citizenship",
            "format": "dc+sd-jwt",
            "claims": [{ "path": ["citizenship", null, "country"], "values": ["FI"] }]
        }]
    });

    let prepared = prepare(serde_json::from_value(wire).expect("should decode"));
    let traveller = Credential::new(&[
        ("/citizenship/0/country", "FI"),
        ("/citizenship/1/country", "FI"),
    ]);

    let outcome = verifiable_core::dcql::evaluate(&prepared, [&traveller]);
    assert_eq!(outcome.matches.len(), 1);
    let matched = &outcome.matches[0];
    assert_eq!(matched.matched_patterns.len(), 1);
    assert!(matched.matched_patterns.iter().next().expect("one").has_wildcards());
}

#[test]
fn claim_set_alternatives_decide_acceptance() {
    let wire = json!({
        "credentials": [{
            "id": "selective",
            "format": "dc+sd-jwt",
            "claims": [
                { "id": "a", "path": ["a"] },
                { "id": "b", "path": ["b"] },
                { "id": "c", "path": ["c"] }
            ],
            "claim_sets": [["a", "b"], ["c"]]
        }]
    });
    let prepared = prepare(serde_json::from_value(wire).expect("should decode"));

    let only_c = Credential::new(&[("/c", "value")]);
    assert_eq!(verifiable_core::dcql::evaluate(&prepared, [&only_c]).matches.len(), 1);

    let only_a = Credential::new(&[("/a", "value")]);
    let outcome = verifiable_core::dcql::evaluate(&prepared, [&only_a]);
    assert!(outcome.matches.is_empty());
    assert_eq!(
        outcome.rejections[0].reason,
        verifiable_core::dcql::RejectionReason::ClaimSetUnsatisfied
    );
}

#[test]
fn wire_round_trip_is_bit_exact() {
    let corpus = [
        json!({
            "credentials": [{ "id": "a", "format": "dc+sd-jwt" }]
        }),
        json!({
            "credentials": [{
                "id": "pid",
                "format": "dc+sd-jwt",
                "meta": { "vct_values": ["https://credentials.example.com/pid"] },
                "claims": [
                    { "path": ["given_name"] },
                    { "id": "nat", "path": ["nationalities", null], "values": ["DE", "FI"] },
                    { "path": ["age_over_18"], "values": [true] }
                ],
                "claim_sets": [["nat"], ["/given_name"]],
                "trusted_authorities": [{ "type": "aki", "values": ["s9tIpPmhxdiuNkHMEWNpyLm8"] }]
            }],
            "credential_sets": [
                { "options": [["pid"]], "purpose": "Identification" },
                { "options": [["pid"]], "required": false }
            ]
        }),
        json!({
            "credentials": [{
                "id": "mdl",
                "format": "mso_mdoc",
                "meta": { "doctype_value": "org.iso.18013.5.1.mDL" },
                "claims": [
                    { "path": ["org.iso.18013.5.1", "family_name"], "intent_to_retain": false },
                    { "path": ["org.iso.18013.5.1", "portrait"], "required": false }
                ]
            }]
        }),
    ];

    for wire in corpus {
        let decoded: DcqlQuery = serde_json::from_value(wire.clone()).expect("should decode");
        let encoded = serde_json::to_value(&decoded).expect("should encode");
        assert_eq!(encoded, wire);

        // and the string path round-trips too
        let text = serde_json::to_string(&wire).expect("should stringify");
        let reparsed: DcqlQuery = serde_json::from_str(&text).expect("should decode");
        assert_eq!(serde_json::to_value(&reparsed).expect("should encode"), wire);
    }
}

#[test]
fn invalid_queries_fail_validation_not_evaluation() {
    let wire = json!({
        "credentials": [
            { "id": "dup", "format": "dc+sd-jwt" },
            { "id": "dup", "format": "dc+sd-jwt" }
        ]
    });
    let prepared = prepare(serde_json::from_value(wire).expect("should decode"));
    assert!(!prepared.is_valid());
    assert!(!prepared.validation_issues.is_empty());
}
