//! Error types for the query client

/// Errors from signing, sending and decoding API requests.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    /// Checked before credentials are touched.
    #[error("GOOGLE_ADS_DEVELOPER_TOKEN not set")]
    MissingDeveloperToken,

    #[error(transparent)]
    Auth(#[from] ads_auth::Error),

    /// Any non-2xx response. The body is kept verbatim for diagnosis.
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("unexpected API response: {0}")]
    Decode(String),
}

impl From<common::Error> for Error {
    fn from(e: common::Error) -> Self {
        match e {
            common::Error::Config(msg) => Error::Config(msg),
            other => Error::Config(other.to_string()),
        }
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_carries_status_and_body() {
        let err = Error::Api {
            status: 403,
            body: "{\"error\":{\"status\":\"PERMISSION_DENIED\"}}".into(),
        };
        let text = err.to_string();
        assert!(text.starts_with("API error 403"));
        assert!(text.contains("PERMISSION_DENIED"));
    }

    #[test]
    fn auth_errors_pass_through_unchanged() {
        let err = Error::from(ads_auth::Error::AuthInvalid("revoked".into()));
        assert_eq!(err.to_string(), "invalid credentials: revoked");
        assert!(matches!(err, Error::Auth(ads_auth::Error::AuthInvalid(_))));
    }
}
