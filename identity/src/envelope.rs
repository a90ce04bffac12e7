//! Direct HTTP retrieval of identity envelopes.

use serde::Deserialize;
use shared::counter;

use crate::metrics_defs::{ENVELOPE_DIRECT, ENVELOPE_FETCH_FAILED};

/// Response body of the identity-resolution endpoint. The delegated resolver
/// returns the same shape as a raw JSON string.
#[derive(Debug, Deserialize)]
pub(crate) struct EnvelopeResponse {
    pub envelope: Option<String>,
}

/// Client for the remote identity-resolution endpoint.
#[derive(Clone)]
pub struct EnvelopeClient {
    client: reqwest::Client,
    endpoint: String,
}

impl EnvelopeClient {
    pub fn new(endpoint: &str) -> Result<Self, reqwest::Error> {
        // The endpoint keys resolution off its own cookies, so the client
        // must send them back on every request.
        let client = reqwest::Client::builder().cookie_store(true).build()?;

        Ok(EnvelopeClient {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the envelope for a partner id. Failures are logged and resolve
    /// to `None`; the caller has no recovery path beyond proceeding without
    /// an envelope.
    pub async fn fetch(&self, pid: &str) -> Option<String> {
        let response = match self
            .client
            .get(&self.endpoint)
            .query(&[("pid", pid)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(%err, "envelope request failed");
                counter!(ENVELOPE_FETCH_FAILED).increment(1);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::error!(status = %response.status(), "envelope endpoint returned an error");
            counter!(ENVELOPE_FETCH_FAILED).increment(1);
            return None;
        }

        match response.json::<EnvelopeResponse>().await {
            Ok(EnvelopeResponse {
                envelope: Some(envelope),
            }) if !envelope.is_empty() => {
                counter!(ENVELOPE_DIRECT).increment(1);
                Some(envelope)
            }
            Ok(_) => {
                tracing::warn!("envelope endpoint returned no envelope");
                None
            }
            Err(err) => {
                tracing::error!(%err, "could not parse envelope response");
                counter!(ENVELOPE_FETCH_FAILED).increment(1);
                None
            }
        }
    }
}
