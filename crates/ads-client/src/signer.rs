//! Per-request header construction
//!
//! Every API call carries the bearer token, the developer token and, when a
//! manager account is configured, `login-customer-id`. Token values are
//! marked sensitive so they never show up in reqwest's debug output.

use ads_auth::CredentialStore;
use common::{Secret, format_customer_id};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use crate::config::ClientConfig;
use crate::error::{Error, Result};

const DEVELOPER_TOKEN: HeaderName = HeaderName::from_static("developer-token");
const LOGIN_CUSTOMER_ID: HeaderName = HeaderName::from_static("login-customer-id");

/// Builds authenticated headers for one client.
#[derive(Debug)]
pub struct RequestSigner {
    developer_token: Option<Secret<String>>,
    login_customer_id: Option<String>,
    credentials: CredentialStore,
}

impl RequestSigner {
    pub fn new(config: &ClientConfig, credentials: CredentialStore) -> Self {
        Self {
            developer_token: config.developer_token.clone(),
            login_customer_id: config
                .login_customer_id
                .as_deref()
                .filter(|id| !id.trim().is_empty())
                .map(format_customer_id),
            credentials,
        }
    }

    /// Headers for the next request.
    ///
    /// Fails with [`Error::MissingDeveloperToken`] before any credential
    /// work. Resolving the credential may refresh it (and, for OAuth, write
    /// the refreshed token back to disk).
    pub async fn headers(&self) -> Result<HeaderMap> {
        let developer_token = self
            .developer_token
            .as_ref()
            .filter(|t| !t.is_blank())
            .ok_or(Error::MissingDeveloperToken)?;

        let token = self.credentials.bearer_token().await?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, sensitive(&format!("Bearer {}", token.as_str()))?);
        headers.insert(DEVELOPER_TOKEN, sensitive(developer_token.as_str())?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(ref id) = self.login_customer_id {
            let value = HeaderValue::from_str(id)
                .map_err(|e| Error::Config(format!("invalid login customer id: {e}")))?;
            headers.insert(LOGIN_CUSTOMER_ID, value);
        }
        Ok(headers)
    }
}

fn sensitive(value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|e| Error::Config(format!("credential is not a valid header value: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}
