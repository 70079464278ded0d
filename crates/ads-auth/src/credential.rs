//! The active credential of a client: an OAuth user token or a service
//! account.
//!
//! Both variants expose the same capability through [`TokenSource`]: hand out
//! the current access token, report whether it needs refreshing, and refresh
//! it in place against the token endpoint.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use common::Secret;

use crate::constants::{ADWORDS_SCOPE, EXPIRY_SKEW_SECS};
use crate::credentials::AuthorizedUser;
use crate::error::{Error, Result};
use crate::service_account::ServiceAccountKey;
use crate::token::{self, OAuthClient, TokenResponse};

/// Common capability of every credential variant.
pub trait TokenSource {
    /// Current access token, if one has been obtained.
    fn token(&self) -> Option<&str>;

    /// Whether the token is past (or within the skew of) its expiry.
    fn is_expired(&self) -> bool;

    /// Fetch a new access token and store it in place.
    fn refresh<'a>(
        &'a mut self,
        http: &'a reqwest::Client,
    ) -> impl Future<Output = Result<()>> + Send + 'a;

    /// A token is present and unexpired.
    fn is_valid(&self) -> bool {
        self.token().is_some() && !self.is_expired()
    }
}

/// Exactly one of these is active per client instance.
#[derive(Debug, Clone)]
pub enum Credential {
    OAuth(OAuthToken),
    ServiceAccount(ServiceAccountToken),
}

impl Credential {
    /// Label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Credential::OAuth(_) => "oauth",
            Credential::ServiceAccount(_) => "service_account",
        }
    }

    pub fn scopes(&self) -> Vec<String> {
        match self {
            Credential::OAuth(t) => t.scopes.clone(),
            Credential::ServiceAccount(_) => vec![ADWORDS_SCOPE.to_string()],
        }
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        match self {
            Credential::OAuth(t) => t.expiry,
            Credential::ServiceAccount(t) => t.expiry,
        }
    }
}

impl TokenSource for Credential {
    fn token(&self) -> Option<&str> {
        match self {
            Credential::OAuth(t) => t.token(),
            Credential::ServiceAccount(t) => t.token(),
        }
    }

    fn is_expired(&self) -> bool {
        match self {
            Credential::OAuth(t) => t.is_expired(),
            Credential::ServiceAccount(t) => t.is_expired(),
        }
    }

    fn refresh<'a>(
        &'a mut self,
        http: &'a reqwest::Client,
    ) -> impl Future<Output = Result<()>> + Send + 'a {
        async move {
            match self {
                Credential::OAuth(t) => t.refresh(http).await,
                Credential::ServiceAccount(t) => t.refresh(http).await,
            }
        }
    }
}

/// Whether `expiry` has passed at `now`, allowing for clock skew.
/// A token without an expiry never expires.
fn expired_at(expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expiry {
        Some(expiry) => now >= expiry - Duration::seconds(EXPIRY_SKEW_SECS),
        None => false,
    }
}

fn expiry_from(response: &TokenResponse, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    response.expires_in.map(|secs| now + Duration::seconds(secs))
}

/// An installed-app user token.
#[derive(Debug, Clone)]
pub struct OAuthToken {
    pub access_token: Option<Secret<String>>,
    pub refresh_token: Option<Secret<String>>,
    pub expiry: Option<DateTime<Utc>>,
    pub scopes: Vec<String>,
    pub client: OAuthClient,
}

impl OAuthToken {
    pub fn from_authorized_user(user: AuthorizedUser) -> Self {
        Self {
            access_token: user.token.map(Secret::new),
            refresh_token: user.refresh_token.map(Secret::new),
            expiry: user.expiry,
            scopes: user.scopes,
            client: OAuthClient {
                client_id: user.client_id,
                client_secret: Secret::new(user.client_secret),
                token_uri: user.token_uri,
            },
        }
    }

    /// Build a token from a fresh authorization-code exchange.
    pub fn from_token_response(response: TokenResponse, client: OAuthClient, now: DateTime<Utc>) -> Self {
        let expiry = expiry_from(&response, now);
        let scopes = match response.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => vec![ADWORDS_SCOPE.to_string()],
        };
        Self {
            access_token: Some(Secret::new(response.access_token)),
            refresh_token: response.refresh_token.map(Secret::new),
            expiry,
            scopes,
            client,
        }
    }

    /// The persisted form of this token.
    pub fn to_authorized_user(&self) -> AuthorizedUser {
        AuthorizedUser {
            token: self.access_token.as_ref().map(|t| t.as_str().to_string()),
            refresh_token: self.refresh_token.as_ref().map(|t| t.as_str().to_string()),
            token_uri: self.client.token_uri.clone(),
            client_id: self.client.client_id.clone(),
            client_secret: self.client.client_secret.as_str().to_string(),
            scopes: self.scopes.clone(),
            expiry: self.expiry,
            credential_type: "authorized_user".to_string(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        expired_at(self.expiry, now)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_ref().is_some_and(|t| !t.is_blank())
    }
}

impl TokenSource for OAuthToken {
    fn token(&self) -> Option<&str> {
        self.access_token.as_ref().map(Secret::as_str)
    }

    fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    fn refresh<'a>(
        &'a mut self,
        http: &'a reqwest::Client,
    ) -> impl Future<Output = Result<()>> + Send + 'a {
        async move {
            let refresh = match &self.refresh_token {
                Some(refresh) if !refresh.is_blank() => refresh.clone(),
                _ => {
                    return Err(Error::AuthInvalid(
                        "OAuth credentials are invalid and carry no refresh token".into(),
                    ));
                }
            };

            let now = Utc::now();
            let response = token::refresh_token(http, &self.client, refresh.as_str()).await?;
            self.expiry = expiry_from(&response, now);
            if let Some(rotated) = response.refresh_token {
                self.refresh_token = Some(Secret::new(rotated));
            }
            self.access_token = Some(Secret::new(response.access_token));
            Ok(())
        }
    }
}

/// A service-account credential. The access token is minted from the key on
/// demand and never written to disk.
#[derive(Debug, Clone)]
pub struct ServiceAccountToken {
    pub key: ServiceAccountKey,
    /// User to impersonate through domain-wide delegation.
    pub subject: Option<String>,
    pub access_token: Option<Secret<String>>,
    pub expiry: Option<DateTime<Utc>>,
}

impl ServiceAccountToken {
    pub fn new(key: ServiceAccountKey, subject: Option<String>) -> Self {
        Self {
            key,
            subject,
            access_token: None,
            expiry: None,
        }
    }
}

impl TokenSource for ServiceAccountToken {
    fn token(&self) -> Option<&str> {
        self.access_token.as_ref().map(Secret::as_str)
    }

    fn is_expired(&self) -> bool {
        self.access_token.is_none() || expired_at(self.expiry, Utc::now())
    }

    fn refresh<'a>(
        &'a mut self,
        http: &'a reqwest::Client,
    ) -> impl Future<Output = Result<()>> + Send + 'a {
        async move {
            let now = Utc::now();
            let assertion = self.key.sign_assertion(self.subject.as_deref(), now.timestamp())?;
            let response = token::exchange_assertion(http, &self.key.token_uri, &assertion).await?;
            self.expiry = expiry_from(&response, now);
            self.access_token = Some(Secret::new(response.access_token));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TOKEN_ENDPOINT;
    use crate::service_account::tests::key_json;
    use crate::test_support::{TokenEndpoint, token_json};
    use axum::http::StatusCode;

    fn oauth_token(token_uri: &str, expiry: Option<DateTime<Utc>>, refresh: Option<&str>) -> OAuthToken {
        OAuthToken {
            access_token: Some("ya29.old".into()),
            refresh_token: refresh.map(Secret::from),
            expiry,
            scopes: vec![ADWORDS_SCOPE.into()],
            client: OAuthClient {
                client_id: "id".into(),
                client_secret: "secret".into(),
                token_uri: token_uri.into(),
            },
        }
    }

    #[test]
    fn expiry_honours_skew() {
        let now = Utc::now();
        let token = oauth_token(TOKEN_ENDPOINT, Some(now + Duration::seconds(60)), None);
        assert!(token.is_expired_at(now), "60s left is inside the skew window");

        let token = oauth_token(TOKEN_ENDPOINT, Some(now + Duration::hours(1)), None);
        assert!(!token.is_expired_at(now));
        assert!(token.is_valid());
    }

    #[test]
    fn token_without_expiry_never_expires() {
        let token = oauth_token(TOKEN_ENDPOINT, None, None);
        assert!(!token.is_expired());
    }

    #[test]
    fn authorized_user_conversion_keeps_fields() {
        let expiry = Some("2031-02-03T04:05:06Z".parse().unwrap());
        let token = oauth_token(TOKEN_ENDPOINT, expiry, Some("1//r"));
        let back = OAuthToken::from_authorized_user(token.to_authorized_user());
        assert_eq!(back.token(), Some("ya29.old"));
        assert_eq!(back.refresh_token.unwrap().as_str(), "1//r");
        assert_eq!(back.expiry, expiry);
        assert_eq!(back.client.client_id, "id");
    }

    #[test]
    fn scopes_and_expiry_follow_the_variant() {
        let expiry = Some("2031-02-03T04:05:06Z".parse().unwrap());
        let oauth = Credential::OAuth(oauth_token(TOKEN_ENDPOINT, expiry, Some("1//r")));
        assert_eq!(oauth.scopes(), vec![ADWORDS_SCOPE.to_string()]);
        assert_eq!(oauth.expiry(), expiry);

        let key = ServiceAccountKey::from_json(&key_json(TOKEN_ENDPOINT)).unwrap();
        assert_eq!(key.project_id.as_deref(), Some("ads-reporting"));
        let sa = Credential::ServiceAccount(ServiceAccountToken::new(key, None));
        assert_eq!(sa.scopes(), vec![ADWORDS_SCOPE.to_string()]);
        assert_eq!(sa.expiry(), None, "nothing minted yet");
    }

    #[tokio::test]
    async fn oauth_refresh_replaces_token_in_place() {
        let endpoint = TokenEndpoint::spawn(vec![(StatusCode::OK, token_json("ya29.new", None))]).await;
        let http = reqwest::Client::new();
        let mut token = oauth_token(&endpoint.url, Some(Utc::now() - Duration::hours(1)), Some("1//r"));
        assert!(token.is_expired());

        token.refresh(&http).await.unwrap();

        assert_eq!(token.token(), Some("ya29.new"));
        assert!(!token.is_expired());
        // Google does not rotate refresh tokens on refresh
        assert_eq!(token.refresh_token.as_ref().unwrap().as_str(), "1//r");
    }

    #[tokio::test]
    async fn oauth_refresh_without_refresh_token_is_auth_invalid() {
        let http = reqwest::Client::new();
        let mut token = oauth_token(TOKEN_ENDPOINT, Some(Utc::now() - Duration::hours(1)), None);
        let result = token.refresh(&http).await;
        assert!(matches!(result, Err(Error::AuthInvalid(_))));
    }

    #[tokio::test]
    async fn service_account_refresh_exchanges_assertion() {
        let endpoint = TokenEndpoint::spawn(vec![(StatusCode::OK, token_json("ya29.sa", None))]).await;
        let http = reqwest::Client::new();
        let key = ServiceAccountKey::from_json(&key_json(&endpoint.url)).unwrap();
        let mut credential = Credential::ServiceAccount(ServiceAccountToken::new(key, None));
        assert!(credential.is_expired(), "no token yet");

        credential.refresh(&http).await.unwrap();

        assert_eq!(credential.token(), Some("ya29.sa"));
        assert_eq!(credential.kind(), "service_account");
        let form = &endpoint.forms()[0];
        assert_eq!(form["grant_type"], crate::constants::JWT_BEARER_GRANT);
        assert_eq!(form["assertion"].split('.').count(), 3);
    }
}
