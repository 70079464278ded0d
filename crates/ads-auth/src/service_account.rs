//! Service-account key files and JWT-bearer assertions
//!
//! A service account signs a short-lived RS256 assertion with its private key
//! and trades it at the token endpoint for an access token. With domain-wide
//! delegation the assertion carries a `sub` claim naming the user to act as.

use std::path::Path;

use common::Secret;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::constants::{ADWORDS_SCOPE, ASSERTION_LIFETIME_SECS, SERVICE_ACCOUNT_TYPE, TOKEN_ENDPOINT};
use crate::error::{Error, Result};

/// The fields of a service-account JSON key this client uses.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub account_type: String,
    pub client_email: String,
    pub private_key: Secret<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_token_uri() -> String {
    TOKEN_ENDPOINT.to_string()
}

/// Claims of the JWT-bearer assertion.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Service account email
    pub iss: String,
    pub scope: String,
    /// Token endpoint the assertion is addressed to
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    /// Impersonated user (domain-wide delegation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

impl ServiceAccountKey {
    /// Read and validate a key file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::CredentialsNotFound(format!(
                "service account key file not found at {}",
                path.display()
            )));
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("reading {}: {e}", path.display())))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let key: Self = serde_json::from_str(contents)
            .map_err(|e| Error::CredentialParse(format!("invalid service account key: {e}")))?;
        if key.account_type != SERVICE_ACCOUNT_TYPE {
            return Err(Error::CredentialParse(format!(
                "expected type \"{SERVICE_ACCOUNT_TYPE}\", got \"{}\"",
                key.account_type
            )));
        }
        Ok(key)
    }

    /// Sign an assertion valid from `now` (unix seconds) for one hour.
    pub fn sign_assertion(&self, subject: Option<&str>, now: i64) -> Result<String> {
        let claims = Claims {
            iss: self.client_email.clone(),
            scope: ADWORDS_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
            sub: subject.map(str::to_string),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_str().as_bytes())
            .map_err(|e| Error::CredentialParse(format!("invalid service account private key: {e}")))?;
        encode(&header, &claims, &key)
            .map_err(|e| Error::CredentialParse(format!("signing service account assertion: {e}")))
    }
}
