//! # Credential-Set Resolution
//!
//! Decides whether an evaluation outcome satisfies the query's
//! `credential_sets`: the outer list of options is an OR, each option an
//! AND over credential-query ids. A query without credential sets requires
//! every credential query to have matched.

use std::collections::HashSet;

use super::evaluate::Evaluation;
use super::prepare::PreparedQuery;

/// The verdict for one credential set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetSelection {
    /// The verifier's stated purpose for this set, if any.
    pub purpose: Option<String>,

    /// Whether the set must be satisfied.
    pub required: bool,

    /// The first option whose credential queries all matched, in the
    /// verifier's preference order. `None` when no option is satisfiable.
    pub chosen: Option<Vec<String>>,
}

/// The outcome of resolving a query's credential sets against an
/// evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionOutcome {
    /// Whether the request as a whole can be answered: every required set
    /// (or, absent sets, every credential query) is satisfied.
    pub satisfied: bool,

    /// Per-set verdicts, in query order. Empty when the query has no
    /// credential sets.
    pub selections: Vec<SetSelection>,
}

/// Resolve the query's credential sets against `evaluation`.
///
/// Only match presence matters here; which concrete credential backs a
/// credential-query id is the application's choice.
#[must_use]
pub fn resolve_credential_sets<C>(
    prepared: &PreparedQuery, evaluation: &Evaluation<'_, C>,
) -> SelectionOutcome {
    let matched_ids: HashSet<&str> = evaluation
        .matches
        .iter()
        .map(|matched| matched.credential_query_id.as_str())
        .collect();

    let Some(credential_sets) = &prepared.query.credential_sets else {
        // no sets: every credential query is required
        let satisfied = prepared
            .query
            .credentials
            .iter()
            .all(|credential| matched_ids.contains(credential.id.as_str()));
        return SelectionOutcome { satisfied, selections: Vec::new() };
    };

    let mut satisfied = true;
    let mut selections = Vec::with_capacity(credential_sets.len());

    for set in credential_sets {
        let chosen = set
            .options
            .iter()
            .find(|option| option.iter().all(|id| matched_ids.contains(id.as_str())))
            .cloned();
        if set.required && chosen.is_none() {
            satisfied = false;
        }
        selections.push(SetSelection {
            purpose: set.purpose.clone(),
            required: set.required,
            chosen,
        });
    }

    SelectionOutcome { satisfied, selections }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::super::evaluate::{CredentialMetadata, Queryable, evaluate};
    use super::super::prepare::prepare;
    use super::super::query::ClaimValue;
    use super::super::path::ClaimPath;
    use super::*;

    struct Credential {
        format: &'static str,
        claims: HashMap<String, ClaimValue>,
    }

    impl Credential {
        fn of(format: &'static str) -> Self {
            Self { format, claims: HashMap::new() }
        }
    }

    impl Queryable for Credential {
        fn metadata(&self) -> CredentialMetadata {
            CredentialMetadata { format: self.format.to_string(), ..CredentialMetadata::default() }
        }

        fn claim(&self, path: &ClaimPath) -> Option<ClaimValue> {
            self.claims.get(&path.to_string()).cloned()
        }
    }

    fn prepared(value: serde_json::Value) -> PreparedQuery {
        prepare(serde_json::from_value(value).expect("should deserialize"))
    }

    #[test]
    fn first_satisfiable_option_wins() {
        let prepared = prepared(json!({
            "credentials": [
                { "id": "pid", "format": "dc+sd-jwt" },
                { "id": "mdl", "format": "mso_mdoc" }
            ],
            "credential_sets": [{ "options": [["pid", "mdl"], ["mdl"]] }]
        }));

        // only an mdoc credential is available
        let mdl = Credential::of("mso_mdoc");
        let evaluation = evaluate(&prepared, [&mdl]);

        let outcome = resolve_credential_sets(&prepared, &evaluation);
        assert!(outcome.satisfied);
        assert_eq!(outcome.selections[0].chosen, Some(vec!["mdl".to_string()]));
    }

    #[test]
    fn unsatisfied_required_set_fails_the_request() {
        let prepared = prepared(json!({
            "credentials": [
                { "id": "pid", "format": "dc+sd-jwt" },
                { "id": "mdl", "format": "mso_mdoc" }
            ],
            "credential_sets": [
                { "options": [["pid"]] },
                { "options": [["mdl"]], "required": false }
            ]
        }));

        let mdl = Credential::of("mso_mdoc");
        let evaluation = evaluate(&prepared, [&mdl]);

        let outcome = resolve_credential_sets(&prepared, &evaluation);
        assert!(!outcome.satisfied);
        assert_eq!(outcome.selections[0].chosen, None);
        assert_eq!(outcome.selections[1].chosen, Some(vec!["mdl".to_string()]));
    }

    #[test]
    fn without_sets_every_query_is_required() {
        let prepared = prepared(json!({
            "credentials": [
                { "id": "pid", "format": "dc+sd-jwt" },
                { "id": "mdl", "format": "mso_mdoc" }
            ]
        }));

        let mdl = Credential::of("mso_mdoc");
        let outcome = resolve_credential_sets(&prepared, &evaluate(&prepared, [&mdl]));
        assert!(!outcome.satisfied);

        let pid = Credential::of("dc+sd-jwt");
        let outcome = resolve_credential_sets(&prepared, &evaluate(&prepared, [&mdl, &pid]));
        assert!(outcome.satisfied);
        assert!(outcome.selections.is_empty());
    }
}
