//! Interfaces for the external collaborators spec §1 carves out of scope:
//! DID document resolution and verifiable-credential verification. The
//! engine only ever calls through these traits; concrete resolvers (a
//! `did:web` HTTP resolver, a `did:key` local resolver, …) live outside this
//! crate.

use crate::did::Did;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// A resolved DID document. Kept intentionally opaque (a JSON value) since
/// this crate does not interpret DID document contents — it only caches
/// and forwards them via [`crate::context::MessageContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidDocument {
    /// The DID this document describes.
    pub id: Did,
    /// The raw document, as returned by the resolver.
    pub document: Value,
}

/// Errors a [`DidResolver`] may raise.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The DID does not exist, or the method is unsupported.
    #[error("DID not found: {0}")]
    NotFound(Did),
    /// The resolver's backing service could not be reached in time.
    #[error("resolver unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a [`Did`] to its [`DidDocument`].
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Resolves `did`.
    ///
    /// # Errors
    /// Returns [`ResolveError`] if the DID cannot be resolved.
    async fn resolve(&self, did: &Did) -> Result<DidDocument, ResolveError>;
}

/// A verified or unverified credential carried alongside a message, in the
/// payload or a transport-specific sidecar header (spec §4.6 step 3 —
/// the carrying format is deliberately transport-agnostic here).
#[derive(Debug, Clone)]
pub struct Credential {
    /// Opaque credential bytes (e.g. a JWT or JSON-LD verifiable credential).
    pub raw: Vec<u8>,
}

/// Errors a [`CredentialVerifier`] may raise.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The credential's signature or proof did not validate.
    #[error("credential verification failed: {0}")]
    Invalid(String),
    /// The verifier's backing service could not be reached in time.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

/// Verifies a [`Credential`] asserted by `holder`.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verifies `credential` as asserted by `holder`.
    ///
    /// # Errors
    /// Returns [`VerifyError`] if the credential fails verification.
    async fn verify(&self, holder: &Did, credential: &Credential) -> Result<(), VerifyError>;
}

/// A resolver/verifier pair that always fails to resolve or verify anything.
///
/// Useful as a placeholder when wiring a node that has no DID infrastructure
/// configured yet — enrichment and authentication then degrade to no-ops
/// rather than panicking on a missing dependency.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDidInfrastructure;

#[async_trait]
impl DidResolver for NullDidInfrastructure {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, ResolveError> {
        Err(ResolveError::Unavailable(format!(
            "no DID resolver configured (requested {did})"
        )))
    }
}

#[async_trait]
impl CredentialVerifier for NullDidInfrastructure {
    async fn verify(&self, _holder: &Did, _credential: &Credential) -> Result<(), VerifyError> {
        Err(VerifyError::Unavailable("no credential verifier configured".to_string()))
    }
}
