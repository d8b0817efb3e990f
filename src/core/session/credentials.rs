//! Ephemeral credential fetch for the negotiation request.
//!
//! The credential endpoint is an external collaborator; we only call it and
//! pull out the short-lived secret used as the bearer token.

use serde::Deserialize;

use crate::errors::{SessionError, SessionResult};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    client_secret: ClientSecret,
}

#[derive(Debug, Deserialize)]
struct ClientSecret {
    value: String,
}

/// Fetch the short-lived bearer credential from the token endpoint.
pub(crate) async fn fetch_ephemeral_key(
    http: &reqwest::Client,
    token_url: &str,
) -> SessionResult<String> {
    let response = http
        .get(token_url)
        .send()
        .await
        .map_err(|e| SessionError::Credential(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SessionError::Credential(format!(
            "token endpoint returned {status}"
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| SessionError::Credential(e.to_string()))?;

    if token.client_secret.value.is_empty() {
        return Err(SessionError::Credential(
            "token endpoint returned an empty client secret".to_string(),
        ));
    }

    Ok(token.client_secret.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_shape() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"client_secret": {"value": "ek_abc123"}}"#).unwrap();
        assert_eq!(token.client_secret.value, "ek_abc123");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_credential_error() {
        let http = reqwest::Client::new();
        let err = fetch_ephemeral_key(&http, "http://127.0.0.1:9/token")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Credential(_)));
    }
}
