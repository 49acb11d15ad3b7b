//! # Digital Credentials Query Language (DCQL)
//!
//! A two-phase query engine for Verifiable Credential requests, as defined
//! in [OpenID for Verifiable Presentations].
//!
//! A verifier's query arrives as JSON and is decoded into [`DcqlQuery`]
//! (bit-exact round-trip). [`prepare`] validates it once and extracts
//! [`CoarsePredicates`] — properties derivable from credential metadata
//! alone — so storage can discard non-candidates cheaply. [`evaluate`] then
//! runs the fine-grained phase over the surviving candidates: claim patterns
//! (with wildcards) are resolved against each credential's available paths,
//! values are checked with the wire's loose numeric equality, and claim-set
//! and credential-set alternatives are honored. The result names, per match,
//! exactly which patterns were satisfied and which must be disclosed.
//!
//! [OpenID for Verifiable Presentations]: https://openid.net/specs/openid-4-verifiable-presentations-1_0.html

mod builder;
mod evaluate;
mod json;
mod path;
mod pattern;
mod prepare;
mod query;
mod select;

pub use builder::{CredentialQueryBuilder, QueryBuilder};
pub use evaluate::{
    CredentialMetadata, Evaluation, Queryable, QueryMatch, Rejection, RejectionReason, evaluate,
};
pub use json::JsonCredential;
pub use path::{ClaimPath, PathSegment};
pub use pattern::{ClaimPattern, PathResolver, PatternSegment};
pub use prepare::{CoarsePredicates, PreparedQuery, prepare};
pub use query::{
    ClaimSetQuery, ClaimValue, ClaimsQuery, CredentialQuery, CredentialSetQuery, DcqlQuery,
    MetaQuery, TrustedAuthoritiesQuery,
};
pub use select::{SelectionOutcome, SetSelection, resolve_credential_sets};

/// Credential format identifiers the engine recognizes for type-constraint
/// extraction. Format strings are otherwise opaque; unknown values pass
/// through untouched.
pub mod format {
    /// IETF SD-JWT-based Verifiable Credentials.
    pub const SD_JWT: &str = "dc+sd-jwt";
    /// SD-CWT-based Verifiable Credentials.
    pub const SD_CWT: &str = "dc+sd-cwt";
    /// ISO mdoc (18013-5) credentials.
    pub const MSO_MDOC: &str = "mso_mdoc";
    /// W3C Verifiable Credentials with Data Integrity proofs.
    pub const LDP_VC: &str = "ldp_vc";
    /// W3C Verifiable Credentials as JWTs.
    pub const JWT_VC_JSON: &str = "jwt_vc_json";
}
