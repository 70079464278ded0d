//! Credential resolution and caching
//!
//! `CredentialStore` turns the configured credentials path into a usable
//! [`Credential`], once per store:
//!
//! - service account (forced by `auth_type`, or detected from the file's
//!   `type`): the key is loaded, no network call is made and nothing is
//!   persisted
//! - OAuth: a stored token is reused while valid, refreshed when it has a
//!   refresh token, and otherwise replaced through the interactive browser
//!   flow. New tokens are written back to the same path.
//!
//! A token rejected by the refresh grant falls through to the browser flow.
//! Transport failures do not.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use common::Secret;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::constants::{AUTHORIZE_ENDPOINT, TOKEN_ENDPOINT, env};
use crate::credential::{Credential, OAuthToken, ServiceAccountToken, TokenSource};
use crate::credentials::{self, ClientSecrets, StoredCredentials};
use crate::error::{Error, Result};
use crate::flow;
use crate::service_account::ServiceAccountKey;

/// Which credential kind the store should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthType {
    #[default]
    OAuth,
    ServiceAccount,
}

impl AuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::OAuth => "oauth",
            AuthType::ServiceAccount => "service_account",
        }
    }
}

impl FromStr for AuthType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oauth" => Ok(AuthType::OAuth),
            "service_account" => Ok(AuthType::ServiceAccount),
            other => Err(Error::Config(format!(
                "auth type must be \"oauth\" or \"service_account\", got \"{other}\""
            ))),
        }
    }
}

impl std::fmt::Display for AuthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs to credential resolution.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub credentials_path: Option<PathBuf>,
    pub auth_type: AuthType,
    /// Used to assemble application secrets when the credentials file holds
    /// none.
    pub client_id: Option<String>,
    pub client_secret: Option<Secret<String>>,
    /// Subject for service-account domain-wide delegation.
    pub impersonation_email: Option<String>,
    pub authorize_endpoint: String,
    pub token_endpoint: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            credentials_path: None,
            auth_type: AuthType::OAuth,
            client_id: None,
            client_secret: None,
            impersonation_email: None,
            authorize_endpoint: AUTHORIZE_ENDPOINT.to_string(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
        }
    }
}

/// Receives the consent URL during interactive authorization.
pub type AuthorizationPrompt = Arc<dyn Fn(&str) + Send + Sync>;

fn print_authorization_url(url: &str) {
    eprintln!("Please visit this URL to authorize this application:\n\n    {url}\n");
}

/// Resolves, caches and refreshes the credential for one client.
pub struct CredentialStore {
    settings: AuthSettings,
    http: reqwest::Client,
    prompt: AuthorizationPrompt,
    cached: Mutex<Option<Credential>>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(settings: AuthSettings, http: reqwest::Client) -> Self {
        Self {
            settings,
            http,
            prompt: Arc::new(print_authorization_url),
            cached: Mutex::new(None),
        }
    }

    /// Replace how the consent URL is shown to the user.
    pub fn with_authorization_prompt<F>(mut self, prompt: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.prompt = Arc::new(prompt);
        self
    }

    /// The active credential, resolving it on first use.
    ///
    /// Later calls return the cached credential without touching the file
    /// or the network.
    pub async fn resolve(&self) -> Result<Credential> {
        let mut cached = self.cached.lock().await;
        if let Some(credential) = cached.as_ref() {
            return Ok(credential.clone());
        }
        let credential = self.acquire().await?;
        info!(
            kind = credential.kind(),
            expiry = ?credential.expiry(),
            scopes = ?credential.scopes(),
            "credentials resolved"
        );
        *cached = Some(credential.clone());
        Ok(credential)
    }

    /// An access token ready to put on a request.
    ///
    /// Service-account tokens are minted fresh on every call. OAuth tokens
    /// are refreshed (and persisted) only when expired.
    pub async fn bearer_token(&self) -> Result<Secret<String>> {
        let mut cached = self.cached.lock().await;
        let mut credential = match cached.take() {
            Some(credential) => credential,
            None => self.acquire().await?,
        };

        let outcome = self.prepare(&mut credential).await;
        let token = credential.token().map(Secret::from);
        *cached = Some(credential);
        outcome?;

        token.ok_or_else(|| Error::AuthInvalid("credential produced no access token".into()))
    }

    async fn prepare(&self, credential: &mut Credential) -> Result<()> {
        match credential {
            Credential::ServiceAccount(sa) => {
                debug!(subject = ?sa.subject, "minting service account token");
                sa.refresh(&self.http).await
            }
            Credential::OAuth(token) if token.is_valid() => Ok(()),
            Credential::OAuth(token) => {
                if !token.can_refresh() {
                    return Err(Error::AuthInvalid(
                        "OAuth token is expired and carries no refresh token".into(),
                    ));
                }
                token.refresh(&self.http).await?;
                info!("refreshed expired oauth token");
                if let Some(path) = self.settings.credentials_path.as_deref() {
                    persist(path, token);
                }
                Ok(())
            }
        }
    }

    async fn acquire(&self) -> Result<Credential> {
        let path = self
            .settings
            .credentials_path
            .as_deref()
            .ok_or_else(|| Error::Config("GOOGLE_ADS_CREDENTIALS_PATH not set".into()))?;

        if self.settings.auth_type == AuthType::ServiceAccount {
            return self.service_account(path);
        }
        if credentials::is_service_account_file(path) {
            info!(path = %path.display(), "detected service account key file");
            return self.service_account(path);
        }
        self.oauth(path).await.map(Credential::OAuth)
    }

    fn service_account(&self, path: &Path) -> Result<Credential> {
        let key = ServiceAccountKey::from_file(path)?;
        info!(
            client_email = %key.client_email,
            project_id = ?key.project_id,
            subject = ?self.settings.impersonation_email,
            "using service account credentials"
        );
        Ok(Credential::ServiceAccount(ServiceAccountToken::new(
            key,
            self.settings.impersonation_email.clone(),
        )))
    }

    async fn oauth(&self, path: &Path) -> Result<OAuthToken> {
        let mut secrets = None;
        let mut stored = None;
        match credentials::load(path) {
            Ok(Some(StoredCredentials::ClientSecrets(s))) => secrets = Some(s),
            Ok(Some(StoredCredentials::AuthorizedUser(user))) => {
                stored = Some(OAuthToken::from_authorized_user(user));
            }
            Ok(None) => debug!(path = %path.display(), "no credentials file yet"),
            Err(e) => warn!(path = %path.display(), error = %e, "ignoring unreadable credentials file"),
        }

        let refreshed = match stored {
            Some(token) if token.is_valid() => {
                debug!("using stored oauth token");
                return Ok(token);
            }
            Some(mut token) if token.can_refresh() => match token.refresh(&self.http).await {
                Ok(()) => {
                    info!("refreshed stored oauth token");
                    Some(token)
                }
                Err(e @ (Error::AuthInvalid(_) | Error::TokenExchange(_))) => {
                    warn!(error = %e, "stored token could not be refreshed, re-authorizing");
                    None
                }
                Err(e) => return Err(e),
            },
            Some(_) => {
                return Err(Error::AuthInvalid(
                    "stored OAuth token is expired and carries no refresh token".into(),
                ));
            }
            None => None,
        };

        let token = match refreshed {
            Some(token) => token,
            None => {
                let secrets = match secrets {
                    Some(secrets) => secrets,
                    None => self.secrets_from_settings()?,
                };
                let prompt = self.prompt.clone();
                flow::run_local_server(&self.http, &secrets, move |url: &str| prompt(url)).await?
            }
        };

        persist(path, &token);
        Ok(token)
    }

    fn secrets_from_settings(&self) -> Result<ClientSecrets> {
        match (&self.settings.client_id, &self.settings.client_secret) {
            (Some(id), Some(secret)) if !id.trim().is_empty() && !secret.is_blank() => {
                Ok(ClientSecrets {
                    client_id: id.clone(),
                    client_secret: secret.as_str().to_string(),
                    auth_uri: self.settings.authorize_endpoint.clone(),
                    token_uri: self.settings.token_endpoint.clone(),
                    redirect_uris: vec!["http://localhost".to_string()],
                })
            }
            _ => Err(Error::Config(format!(
                "{} and {} must be set",
                env::CLIENT_ID,
                env::CLIENT_SECRET
            ))),
        }
    }
}

/// Persistence failures are logged; the in-memory token stays usable.
fn persist(path: &Path, token: &OAuthToken) {
    match credentials::save(path, &token.to_authorized_user()) {
        Ok(()) => debug!(path = %path.display(), "saved oauth token"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not save oauth token"),
    }
}
