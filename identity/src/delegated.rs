//! Optional delegated envelope retrieval.
//!
//! Some embedding environments ship their own resolver library. When one is
//! injected, the submodule consults it first and only falls back to the
//! direct endpoint when it comes back empty.

use async_trait::async_trait;

/// A resolver provided by the embedding environment.
#[async_trait]
pub trait DelegatedResolver: Send + Sync {
    /// Retrieve the raw envelope JSON, `{"envelope": <token>}`, or `None`
    /// when the resolver has nothing for the current user.
    async fn retrieve_envelope(&self) -> Option<String>;
}
