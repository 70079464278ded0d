//! Credential file formats and persistence
//!
//! A single path (`GOOGLE_ADS_CREDENTIALS_PATH`) may hold any of three JSON
//! documents:
//! - OAuth application secrets, keyed by `installed` or `web`
//! - an authorized-user token written by a previous run
//! - a service-account key (`"type": "service_account"`)
//!
//! Tokens are written back to the same path with an atomic temp-file +
//! rename, which replaces application secrets on first authorization.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{ADWORDS_SCOPE, SERVICE_ACCOUNT_TYPE, TOKEN_ENDPOINT};
use crate::error::{Error, Result};

/// OAuth application secrets from the Cloud console download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// Authorized-user token as persisted between runs.
///
/// Field names match the JSON other Google tooling writes, so a token file
/// can be shared with it. `access_token` is accepted as an alias of `token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUser {
    #[serde(default, alias = "access_token", skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(rename = "type", default = "default_user_type")]
    pub credential_type: String,
}

/// What a credentials file holds, as far as the OAuth path is concerned.
#[derive(Debug, Clone)]
pub enum StoredCredentials {
    ClientSecrets(ClientSecrets),
    AuthorizedUser(AuthorizedUser),
}

fn default_auth_uri() -> String {
    crate::constants::AUTHORIZE_ENDPOINT.to_string()
}

fn default_token_uri() -> String {
    TOKEN_ENDPOINT.to_string()
}

fn default_scopes() -> Vec<String> {
    vec![ADWORDS_SCOPE.to_string()]
}

fn default_user_type() -> String {
    "authorized_user".to_string()
}

/// Whether the file at `path` is a service-account key.
///
/// Missing or unparsable files are not service accounts; the caller decides
/// what to do with them.
pub fn is_service_account_file(path: &Path) -> bool {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return false;
    };
    serde_json::from_str::<serde_json::Value>(&contents)
        .ok()
        .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(|t| t == SERVICE_ACCOUNT_TYPE))
        .unwrap_or(false)
}

/// Load OAuth material from `path`.
///
/// Returns `Ok(None)` when the file does not exist. Application secrets win
/// when both `installed` and `web` are present.
pub fn load(path: &Path) -> Result<Option<StoredCredentials>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Io(format!("reading {}: {e}", path.display())))?;
    parse(&contents).map(Some)
}

/// Parse a credentials document.
pub fn parse(contents: &str) -> Result<StoredCredentials> {
    let mut value: serde_json::Value = serde_json::from_str(contents)
        .map_err(|e| Error::CredentialParse(format!("credentials file is not JSON: {e}")))?;

    for key in ["installed", "web"] {
        if let Some(section) = value.get_mut(key) {
            let secrets = serde_json::from_value(section.take()).map_err(|e| {
                Error::CredentialParse(format!("invalid `{key}` client secrets: {e}"))
            })?;
            return Ok(StoredCredentials::ClientSecrets(secrets));
        }
    }

    serde_json::from_value(value)
        .map(StoredCredentials::AuthorizedUser)
        .map_err(|e| Error::CredentialParse(format!("invalid authorized user token: {e}")))
}

/// Write an authorized-user token to `path`, creating parent directories.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. Permissions are set to 0600 since the file holds a refresh
/// token and client secret.
pub fn save(path: &Path, user: &AuthorizedUser) -> Result<()> {
    let json = serde_json::to_string_pretty(user)
        .map_err(|e| Error::CredentialParse(format!("serializing token: {e}")))?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::Io(format!("creating {}: {e}", dir.display())))?;

    let tmp_path = dir.join(format!(
        ".google-ads-token.tmp.{}.{}",
        std::process::id(),
        uuid::Uuid::new_v4().simple()
    ));

    std::fs::write(&tmp_path, json.as_bytes())
        .map_err(|e| Error::Io(format!("writing temp token file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&tmp_path, perms)
            .map_err(|e| Error::Io(format!("setting token file permissions: {e}")))?;
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| Error::Io(format!("renaming temp token file: {e}")))?;

    debug!(path = %path.display(), "persisted oauth token");
    Ok(())
}
