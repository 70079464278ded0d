//! Error types for credential resolution and token endpoint calls

/// Errors from credential resolution and OAuth operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required setting (credentials path, client id/secret) is missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// A service-account key file was required but does not exist.
    #[error("credentials not found: {0}")]
    CredentialsNotFound(String),

    /// Credentials exist but are invalid and cannot be refreshed, or the
    /// user denied authorization.
    #[error("invalid credentials: {0}")]
    AuthInvalid(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("credential parse error: {0}")]
    CredentialParse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let err = Error::CredentialsNotFound("/keys/sa.json".into());
        assert_eq!(err.to_string(), "credentials not found: /keys/sa.json");

        let err = Error::AuthInvalid("refresh token revoked".into());
        assert!(err.to_string().contains("refresh token revoked"));
    }
}
