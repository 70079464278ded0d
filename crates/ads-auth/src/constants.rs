//! Google OAuth constants
//!
//! Endpoints and the single scope the Ads API requires. These are defaults:
//! `AuthSettings` carries them into the credential store so tests and
//! alternative deployments can point elsewhere.

/// The only OAuth scope the Google Ads API accepts.
pub const ADWORDS_SCOPE: &str = "https://www.googleapis.com/auth/adwords";

/// Authorization endpoint for the installed-app consent screen.
pub const AUTHORIZE_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";

/// Token endpoint for code exchange, refresh, and JWT-bearer grants.
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Grant type for service-account assertions (RFC 7523).
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for a service-account assertion, in seconds.
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// A token is treated as expired this many seconds before its stated expiry,
/// so a request never leaves with a token that dies in flight.
pub const EXPIRY_SKEW_SECS: i64 = 225;

/// `type` value that marks a service-account key file.
pub const SERVICE_ACCOUNT_TYPE: &str = "service_account";

/// Environment variables read by the auth layer.
pub mod env {
    pub const CLIENT_ID: &str = "GOOGLE_ADS_CLIENT_ID";
    pub const CLIENT_SECRET: &str = "GOOGLE_ADS_CLIENT_SECRET";
    pub const IMPERSONATION_EMAIL: &str = "GOOGLE_ADS_IMPERSONATION_EMAIL";
}
