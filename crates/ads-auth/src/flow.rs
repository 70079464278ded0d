//! Installed-app authorization with a loopback redirect
//!
//! 1. Bind an ephemeral port on 127.0.0.1 and serve a one-shot callback route
//! 2. Hand the consent URL (PKCE S256, random `state`) to the prompt
//! 3. Wait for the browser redirect carrying `code` and `state`
//! 4. Exchange the code at the token endpoint
//!
//! The wait has no timeout: a human is on the other end.

use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::response::Html;
use chrono::Utc;
use common::Secret;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::credential::OAuthToken;
use crate::credentials::ClientSecrets;
use crate::error::{Error, Result};
use crate::pkce::{build_authorization_url, compute_challenge, generate_verifier};
use crate::token::{OAuthClient, exchange_code};

const SUCCESS_PAGE: &str =
    "<html><body>The authentication flow has completed. You may close this window.</body></html>";

/// Query parameters of the authorization redirect.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Clone)]
struct CallbackState {
    sender: Arc<Mutex<Option<oneshot::Sender<CallbackParams>>>>,
}

/// Run the interactive flow and return the freshly issued token.
///
/// `prompt` receives the consent URL; it is expected to show it to the user
/// (or open a browser). The call suspends until the redirect arrives.
pub async fn run_local_server<P>(
    http: &reqwest::Client,
    secrets: &ClientSecrets,
    prompt: P,
) -> Result<OAuthToken>
where
    P: FnOnce(&str) + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| Error::Io(format!("binding redirect listener: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| Error::Io(format!("reading redirect listener address: {e}")))?;
    let redirect_uri = format!("http://{addr}/");

    let verifier = generate_verifier();
    let challenge = compute_challenge(&verifier);
    let state = uuid::Uuid::new_v4().simple().to_string();
    let url = build_authorization_url(
        &secrets.auth_uri,
        &secrets.client_id,
        &redirect_uri,
        &state,
        &challenge,
    )?;

    let (params_tx, params_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let app = axum::Router::new()
        .route("/", axum::routing::get(callback_handler))
        .with_state(CallbackState {
            sender: Arc::new(Mutex::new(Some(params_tx))),
        });
    let server = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
        if let Err(e) = result {
            warn!(error = %e, "redirect listener failed");
        }
    });

    info!(redirect_uri, "waiting for browser authorization");
    prompt(&url);

    let params = params_rx
        .await
        .map_err(|_| Error::AuthInvalid("redirect listener closed before authorization".into()));
    let _ = shutdown_tx.send(());
    let _ = server.await;
    let params = params?;

    let code = validate_callback(params, &state)?;
    debug!("authorization code received, exchanging");

    let client = OAuthClient {
        client_id: secrets.client_id.clone(),
        client_secret: Secret::new(secrets.client_secret.clone()),
        token_uri: secrets.token_uri.clone(),
    };
    let now = Utc::now();
    let response = exchange_code(http, &client, &code, &verifier, &redirect_uri).await?;
    info!("browser authorization completed");
    Ok(OAuthToken::from_token_response(response, client, now))
}

async fn callback_handler(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> Html<&'static str> {
    let sender = state.sender.lock().ok().and_then(|mut slot| slot.take());
    match sender {
        Some(sender) => {
            let _ = sender.send(params);
        }
        None => debug!("ignoring repeated authorization redirect"),
    }
    Html(SUCCESS_PAGE)
}

/// Check the redirect against the expected `state` and extract the code.
fn validate_callback(params: CallbackParams, expected_state: &str) -> Result<String> {
    if let Some(error) = params.error {
        return Err(Error::AuthInvalid(format!("authorization denied: {error}")));
    }
    if params.state.as_deref() != Some(expected_state) {
        return Err(Error::AuthInvalid(
            "authorization redirect state mismatch".into(),
        ));
    }
    params
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| Error::AuthInvalid("authorization redirect carried no code".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::AUTHORIZE_ENDPOINT;
    use crate::credential::TokenSource;
    use crate::test_support::{TokenEndpoint, browser, token_json};
    use axum::http::StatusCode;

    fn secrets(token_uri: &str) -> ClientSecrets {
        ClientSecrets {
            client_id: "desktop.apps.googleusercontent.com".into(),
            client_secret: "desktop-secret".into(),
            auth_uri: AUTHORIZE_ENDPOINT.into(),
            token_uri: token_uri.into(),
            redirect_uris: vec!["http://localhost".into()],
        }
    }

    #[test]
    fn validate_callback_cases() {
        let ok = CallbackParams {
            code: Some("4/abc".into()),
            state: Some("s1".into()),
            error: None,
        };
        assert_eq!(validate_callback(ok, "s1").unwrap(), "4/abc");

        let denied = CallbackParams {
            error: Some("access_denied".into()),
            ..Default::default()
        };
        assert!(matches!(validate_callback(denied, "s1"), Err(Error::AuthInvalid(_))));

        let no_code = CallbackParams {
            state: Some("s1".into()),
            ..Default::default()
        };
        assert!(matches!(validate_callback(no_code, "s1"), Err(Error::AuthInvalid(_))));
    }

    #[tokio::test]
    async fn completes_flow_and_exchanges_code() {
        let endpoint = TokenEndpoint::spawn(vec![(
            StatusCode::OK,
            token_json("ya29.interactive", Some("1//offline")),
        )])
        .await;
        let http = reqwest::Client::new();

        let token = run_local_server(&http, &secrets(&endpoint.url), browser(&[("code", "4/granted")], true))
            .await
            .unwrap();

        assert_eq!(token.token(), Some("ya29.interactive"));
        assert!(token.can_refresh());
        let form = &endpoint.forms()[0];
        assert_eq!(form["code"], "4/granted");
        assert_eq!(form["client_secret"], "desktop-secret");
        assert!(form["redirect_uri"].starts_with("http://127.0.0.1:"));
        assert!(!form["code_verifier"].is_empty());
    }

    #[tokio::test]
    async fn denied_consent_is_auth_invalid() {
        let endpoint = TokenEndpoint::spawn(vec![(StatusCode::OK, token_json("unused", None))]).await;
        let http = reqwest::Client::new();

        let result = run_local_server(
            &http,
            &secrets(&endpoint.url),
            browser(&[("error", "access_denied")], true),
        )
        .await;

        assert!(matches!(result, Err(Error::AuthInvalid(_))), "got {result:?}");
        assert_eq!(endpoint.hits(), 0, "no exchange after denial");
    }

    #[tokio::test]
    async fn forged_state_is_rejected() {
        let endpoint = TokenEndpoint::spawn(vec![(StatusCode::OK, token_json("unused", None))]).await;
        let http = reqwest::Client::new();

        let result =
            run_local_server(&http, &secrets(&endpoint.url), browser(&[("code", "4/x")], false)).await;

        assert!(matches!(result, Err(Error::AuthInvalid(_))), "got {result:?}");
    }
}
