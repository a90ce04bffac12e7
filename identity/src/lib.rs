//! User-identity submodule resolving privacy envelopes for a partner.
//!
//! `decode` wraps a stored envelope value into the shape bid requests carry.
//! `request_id` starts an asynchronous envelope fetch with two strategies: an
//! injected [`DelegatedResolver`] when the embedding environment provides
//! one, falling back to the remote identity-resolution endpoint otherwise.

mod delegated;
mod envelope;
pub mod metrics_defs;

pub use delegated::DelegatedResolver;
pub use envelope::EnvelopeClient;

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use shared::counter;
use shared::registry::{IdResolution, UserIdSubmodule};

use crate::envelope::EnvelopeResponse;
use crate::metrics_defs::ENVELOPE_DELEGATED;

pub const MODULE_NAME: &str = "identityLink";
pub const DEFAULT_ENDPOINT: &str = "https://api.rlcdn.com/api/identity/envelope";

#[derive(thiserror::Error, Debug)]
pub enum IdentityError {
    #[error("could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Params the host hands over when it activates this submodule.
#[derive(Debug, Clone, Deserialize)]
pub struct PartnerConfig {
    pub pid: String,
}

/// The identity submodule. Stateless between calls; every `request_id`
/// resolves from scratch.
pub struct IdentitySubmodule {
    client: EnvelopeClient,
    delegated: Option<Arc<dyn DelegatedResolver>>,
}

impl IdentitySubmodule {
    pub fn new(endpoint: &str) -> Result<Self, IdentityError> {
        Ok(IdentitySubmodule {
            client: EnvelopeClient::new(endpoint)?,
            delegated: None,
        })
    }

    /// Inject a delegated resolver to consult before the direct endpoint.
    pub fn with_delegated(mut self, resolver: Arc<dyn DelegatedResolver>) -> Self {
        self.delegated = Some(resolver);
        self
    }
}

impl UserIdSubmodule for IdentitySubmodule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn decode(&self, value: &str) -> Value {
        json!({ "idl_env": value })
    }

    fn request_id(&self, params: &Value) -> Option<IdResolution> {
        let config = match serde_json::from_value::<PartnerConfig>(params.clone()) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(%err, "identity submodule requires a partner id");
                return None;
            }
        };

        let client = self.client.clone();
        let delegated = self.delegated.clone();
        Some(Box::pin(resolve(config.pid, client, delegated)))
    }
}

async fn resolve(
    pid: String,
    client: EnvelopeClient,
    delegated: Option<Arc<dyn DelegatedResolver>>,
) -> Option<String> {
    if let Some(resolver) = delegated {
        match resolver.retrieve_envelope().await {
            Some(raw) if !raw.is_empty() => {
                match serde_json::from_str::<EnvelopeResponse>(&raw) {
                    Ok(EnvelopeResponse {
                        envelope: Some(envelope),
                    }) if !envelope.is_empty() => {
                        counter!(ENVELOPE_DELEGATED).increment(1);
                        return Some(envelope);
                    }
                    Ok(_) => {
                        tracing::warn!("delegated resolver returned no envelope, using direct endpoint");
                    }
                    Err(err) => {
                        tracing::error!(%err, "could not parse delegated envelope, using direct endpoint");
                    }
                }
            }
            _ => tracing::debug!("delegated resolver came back empty, using direct endpoint"),
        }
    }

    client.fetch(&pid).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FakeResolver(Option<String>);

    #[async_trait::async_trait]
    impl DelegatedResolver for FakeResolver {
        async fn retrieve_envelope(&self) -> Option<String> {
            self.0.clone()
        }
    }

    fn submodule(endpoint: &str) -> IdentitySubmodule {
        IdentitySubmodule::new(endpoint).expect("build submodule")
    }

    #[test]
    fn decode_wraps_value() {
        let module = submodule(DEFAULT_ENDPOINT);
        assert_eq!(
            module.decode("some-envelope"),
            json!({ "idl_env": "some-envelope" })
        );
    }

    #[test]
    fn request_id_rejects_missing_or_non_string_pid() {
        let module = submodule(DEFAULT_ENDPOINT);
        assert!(module.request_id(&json!({})).is_none());
        assert!(module.request_id(&json!({ "pid": 42 })).is_none());
        assert!(module.request_id(&json!({ "pid": null })).is_none());
    }

    #[tokio::test]
    async fn delegated_envelope_wins_over_direct_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let module = submodule(&server.uri())
            .with_delegated(Arc::new(FakeResolver(Some(r#"{"envelope":"abc"}"#.into()))));

        let resolution = module.request_id(&json!({ "pid": "p-1" })).expect("resolution");
        assert_eq!(resolution.await, Some("abc".to_string()));
    }

    #[tokio::test]
    async fn empty_delegated_result_falls_back_to_direct_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("pid", "p-2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"envelope":"xyz"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let module = submodule(&server.uri()).with_delegated(Arc::new(FakeResolver(None)));

        let resolution = module.request_id(&json!({ "pid": "p-2" })).expect("resolution");
        assert_eq!(resolution.await, Some("xyz".to_string()));
    }

    #[tokio::test]
    async fn unparsable_response_resolves_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let module = submodule(&server.uri());
        let resolution = module.request_id(&json!({ "pid": "p-3" })).expect("resolution");
        assert_eq!(resolution.await, None);
    }

    #[tokio::test]
    async fn error_status_resolves_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let module = submodule(&server.uri());
        let resolution = module.request_id(&json!({ "pid": "p-4" })).expect("resolution");
        assert_eq!(resolution.await, None);
    }
}
