//! Google Ads API authentication
//!
//! Resolves the credential a client signs requests with. Two kinds exist:
//! installed-app OAuth user tokens and service-account keys. Both are read
//! from a single credentials path and exposed through [`TokenSource`].
//!
//! Resolution order for the OAuth path:
//! 1. Reuse a stored token while it is unexpired
//! 2. Refresh it with the stored refresh token
//! 3. Otherwise run the browser flow (`flow::run_local_server`) with PKCE
//! 4. Write the resulting token back with `credentials::save`
//!
//! Service accounts mint a short-lived token from a signed JWT assertion
//! (`service_account::ServiceAccountKey::sign_assertion`) on every request.

pub mod constants;
pub mod credential;
pub mod credentials;
pub mod error;
pub mod flow;
pub mod pkce;
pub mod service_account;
pub mod store;
pub mod token;

#[cfg(test)]
mod test_support;

pub use credential::{Credential, OAuthToken, ServiceAccountToken, TokenSource};
pub use error::{Error, Result};
pub use store::{AuthSettings, AuthType, CredentialStore};
