//! Retrieval client: thin, single-attempt access to the knowledge base.
//!
//! Maps a free-text query to the raw text blob the retrieval service returns.
//! No retry, no caching, no timeout beyond the HTTP client default; resiliency
//! (fallback instructions) is the orchestrator's responsibility.

use crate::errors::{SessionError, SessionResult};

/// Stateless client for the external retrieval service.
#[derive(Debug, Clone)]
pub struct RetrievalClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RetrievalClient {
    /// Create a client for the service rooted at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/retrieve", base_url.trim_end_matches('/')),
        }
    }

    /// The resolved retrieve endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Retrieve document text for `query`.
    ///
    /// Sends `{"query": ...}` and returns the response body verbatim. Fails
    /// with `RetrievalUnavailable` if the service is unreachable or returns a
    /// non-success status.
    pub async fn retrieve(&self, query: &str) -> SessionResult<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|e| SessionError::RetrievalUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::RetrievalUnavailable(format!(
                "service returned {status}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| SessionError::RetrievalUnavailable(e.to_string()))
    }
}
