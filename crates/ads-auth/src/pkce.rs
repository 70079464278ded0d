//! PKCE (Proof Key for Code Exchange) implementation per RFC 7636
//!
//! The installed-app flow generates a verifier, sends its S256 challenge in
//! the authorization URL, and proves possession of the verifier when the
//! authorization code is exchanged at the token endpoint.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use reqwest::Url;
use sha2::{Digest, Sha256};

use crate::constants::ADWORDS_SCOPE;
use crate::error::{Error, Result};

/// Generate a cryptographically random PKCE code verifier.
///
/// 64 random bytes encoded as URL-safe base64 without padding gives 86
/// characters, inside the 43-128 range RFC 7636 allows.
pub fn generate_verifier() -> String {
    let mut bytes = [0u8; 64];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compute the S256 code challenge: `BASE64URL(SHA256(verifier))`.
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Build the consent-screen URL for the installed-app flow.
///
/// Requests offline access so the token endpoint issues a refresh token.
/// `state` is echoed back on the redirect and checked by the callback.
pub fn build_authorization_url(
    authorize_endpoint: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
    challenge: &str,
) -> Result<String> {
    let url = Url::parse_with_params(
        authorize_endpoint,
        &[
            ("response_type", "code"),
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("scope", ADWORDS_SCOPE),
            ("state", state),
            ("code_challenge", challenge),
            ("code_challenge_method", "S256"),
            ("access_type", "offline"),
        ],
    )
    .map_err(|e| Error::Config(format!("invalid authorization endpoint {authorize_endpoint}: {e}")))?;
    Ok(url.into())
}
