//! OAuth token endpoint calls
//!
//! Three grants all POST a form to the token endpoint:
//! 1. Authorization code exchange (end of the installed-app flow)
//! 2. Refresh token grant (expired user token)
//! 3. JWT-bearer grant (service-account assertion)
//!
//! A rejected grant (`invalid_grant`, 401, 403) maps to `Error::AuthInvalid`
//! so callers can tell a dead refresh token from a transient failure.

use common::Secret;
use serde::{Deserialize, Serialize};

use crate::constants::JWT_BEARER_GRANT;
use crate::error::{Error, Result};

/// OAuth client identity used for code exchange and refresh.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub token_uri: String,
}

/// Response from the token endpoint.
///
/// Google omits `refresh_token` on refresh grants and on service-account
/// grants; callers keep the refresh token they already hold.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires (delta, not absolute)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    /// Space-separated granted scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Exchange an authorization code for tokens.
pub async fn exchange_code(
    http: &reqwest::Client,
    client: &OAuthClient,
    code: &str,
    verifier: &str,
    redirect_uri: &str,
) -> Result<TokenResponse> {
    post_grant(
        http,
        &client.token_uri,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("code_verifier", verifier),
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
        ],
        "authorization code exchange",
    )
    .await
}

/// Obtain a new access token with a refresh token.
pub async fn refresh_token(
    http: &reqwest::Client,
    client: &OAuthClient,
    refresh: &str,
) -> Result<TokenResponse> {
    post_grant(
        http,
        &client.token_uri,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh),
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
        ],
        "token refresh",
    )
    .await
}

/// Trade a signed service-account assertion for an access token.
pub async fn exchange_assertion(
    http: &reqwest::Client,
    token_uri: &str,
    assertion: &str,
) -> Result<TokenResponse> {
    post_grant(
        http,
        token_uri,
        &[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion)],
        "service account token exchange",
    )
    .await
}

async fn post_grant(
    http: &reqwest::Client,
    token_uri: &str,
    form: &[(&str, &str)],
    operation: &str,
) -> Result<TokenResponse> {
    let response = http
        .post(token_uri)
        .form(form)
        .send()
        .await
        .map_err(|e| Error::Http(format!("{operation} request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));

        if is_rejected_grant(status.as_u16(), &body) {
            return Err(Error::AuthInvalid(format!(
                "{operation} rejected ({status}): {body}"
            )));
        }

        return Err(Error::TokenExchange(format!(
            "{operation} returned {status}: {body}"
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid {operation} response: {e}")))
}

/// Google answers a revoked or expired refresh token with
/// `400 {"error": "invalid_grant"}`; 401/403 mean a bad client.
fn is_rejected_grant(status: u16, body: &str) -> bool {
    match status {
        401 | 403 => true,
        400 => body.contains("invalid_grant") || body.contains("unauthorized_client"),
        _ => false,
    }
}
