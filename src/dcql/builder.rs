//! # Query Builder
//!
//! A mutable builder for assembling [`DcqlQuery`] values in code. `build`
//! routes the result through the preparer's validation, so a query that
//! builds successfully will also prepare cleanly.

use super::pattern::ClaimPattern;
use super::prepare::prepare;
use super::query::{
    ClaimSetQuery, ClaimValue, ClaimsQuery, CredentialQuery, CredentialSetQuery, DcqlQuery,
    MetaQuery, TrustedAuthoritiesQuery,
};

/// Builds a [`DcqlQuery`] from credential queries and credential sets.
#[derive(Clone, Debug, Default)]
pub struct QueryBuilder {
    credentials: Vec<CredentialQuery>,
    credential_sets: Vec<CredentialSetQuery>,
}

impl QueryBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential query.
    #[must_use]
    pub fn credential(mut self, credential: CredentialQuery) -> Self {
        self.credentials.push(credential);
        self
    }

    /// Add a credential set: one acceptable combination of credential ids.
    #[must_use]
    pub fn credential_set(mut self, options: Vec<Vec<String>>, required: bool) -> Self {
        self.credential_sets.push(CredentialSetQuery { options, required, purpose: None });
        self
    }

    /// Assemble and validate the query.
    ///
    /// # Errors
    ///
    /// Returns the preparer's validation issues when the assembled query is
    /// not well-formed (missing ids, duplicate ids, dangling references).
    pub fn build(self) -> Result<DcqlQuery, Vec<String>> {
        let query = DcqlQuery {
            credentials: self.credentials,
            credential_sets: if self.credential_sets.is_empty() {
                None
            } else {
                Some(self.credential_sets)
            },
        };

        let prepared = prepare(query);
        if prepared.is_valid() { Ok(prepared.query) } else { Err(prepared.validation_issues) }
    }
}

/// Builds one [`CredentialQuery`].
#[derive(Clone, Debug, Default)]
pub struct CredentialQueryBuilder {
    id: String,
    format: String,
    meta: Option<MetaQuery>,
    claims: Vec<ClaimsQuery>,
    claim_sets: Vec<ClaimSetQuery>,
    trusted_authorities: Vec<TrustedAuthoritiesQuery>,
}

impl CredentialQueryBuilder {
    /// Start a credential query with its id and format.
    #[must_use]
    pub fn new(id: impl Into<String>, format: impl Into<String>) -> Self {
        Self { id: id.into(), format: format.into(), ..Self::default() }
    }

    /// Constrain acceptable `vct` values (SD-JWT family).
    #[must_use]
    pub fn vct_values<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        let meta = self.meta.get_or_insert_with(MetaQuery::default);
        meta.vct_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Constrain the acceptable document type (mdoc).
    #[must_use]
    pub fn doctype_value(mut self, value: impl Into<String>) -> Self {
        let meta = self.meta.get_or_insert_with(MetaQuery::default);
        meta.doctype_value = Some(value.into());
        self
    }

    /// Request a required claim.
    #[must_use]
    pub fn claim(mut self, path: ClaimPattern) -> Self {
        self.claims.push(ClaimsQuery {
            id: None,
            path,
            required: true,
            values: None,
            intent_to_retain: None,
        });
        self
    }

    /// Request an optional claim.
    #[must_use]
    pub fn optional_claim(mut self, path: ClaimPattern) -> Self {
        self.claims.push(ClaimsQuery {
            id: None,
            path,
            required: false,
            values: None,
            intent_to_retain: None,
        });
        self
    }

    /// Request a claim by id with acceptable values.
    #[must_use]
    pub fn claim_with_values(
        mut self, id: impl Into<String>, path: ClaimPattern,
        values: impl IntoIterator<Item = ClaimValue>,
    ) -> Self {
        self.claims.push(ClaimsQuery {
            id: Some(id.into()),
            path,
            required: true,
            values: Some(values.into_iter().collect()),
            intent_to_retain: None,
        });
        self
    }

    /// Add a claim set: alternatives of claim-id combinations.
    #[must_use]
    pub fn claim_set(mut self, options: Vec<Vec<String>>) -> Self {
        self.claim_sets.push(ClaimSetQuery { options, required: true });
        self
    }

    /// Add a trusted authority entry.
    #[must_use]
    pub fn trusted_authority<S: Into<String>>(
        mut self, authority_type: impl Into<String>, values: impl IntoIterator<Item = S>,
    ) -> Self {
        self.trusted_authorities.push(TrustedAuthoritiesQuery {
            authority_type: authority_type.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Assemble the credential query.
    #[must_use]
    pub fn build(self) -> CredentialQuery {
        CredentialQuery {
            id: self.id,
            format: self.format,
            meta: self.meta,
            claims: if self.claims.is_empty() { None } else { Some(self.claims) },
            claim_sets: if self.claim_sets.is_empty() { None } else { Some(self.claim_sets) },
            trusted_authorities: if self.trusted_authorities.is_empty() {
                None
            } else {
                Some(self.trusted_authorities)
            },
        }
    }
}
