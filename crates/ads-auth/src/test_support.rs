//! In-process mock token endpoint for tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use tokio::net::TcpListener;

type Forms = Arc<Mutex<Vec<HashMap<String, String>>>>;

#[derive(Clone)]
struct EndpointState {
    responses: Arc<Mutex<VecDeque<(StatusCode, serde_json::Value)>>>,
    forms: Forms,
}

/// Token endpoint that replays canned responses in order (the last one
/// repeats) and records every form it receives.
pub struct TokenEndpoint {
    pub url: String,
    forms: Forms,
}

impl TokenEndpoint {
    pub async fn spawn(responses: Vec<(StatusCode, serde_json::Value)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let forms: Forms = Arc::default();
        let state = EndpointState {
            responses: Arc::new(Mutex::new(responses.into())),
            forms: forms.clone(),
        };

        tokio::spawn(async move {
            let app = axum::Router::new()
                .route("/token", axum::routing::post(handle))
                .with_state(state);
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}/token"),
            forms,
        }
    }

    pub fn forms(&self) -> Vec<HashMap<String, String>> {
        self.forms.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.forms.lock().unwrap().len()
    }
}

async fn handle(
    State(state): State<EndpointState>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, axum::Json<serde_json::Value>) {
    state.forms.lock().unwrap().push(form);
    let mut responses = state.responses.lock().unwrap();
    let (status, body) = if responses.len() > 1 {
        responses.pop_front().unwrap()
    } else {
        responses.front().cloned().unwrap()
    };
    (status, axum::Json(body))
}

/// A successful token endpoint body.
pub fn token_json(access: &str, refresh: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "access_token": access,
        "expires_in": 3599,
        "scope": crate::constants::ADWORDS_SCOPE,
        "token_type": "Bearer",
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = refresh.into();
    }
    body
}

/// Simulated browser for the interactive flow: follows the consent URL's
/// `redirect_uri`, appending `extra` query parameters and either the real or
/// a forged `state`.
pub fn browser(
    extra: &'static [(&'static str, &'static str)],
    echo_state: bool,
) -> impl Fn(&str) + Send + Sync + 'static {
    move |url: &str| {
        let params: HashMap<String, String> = reqwest::Url::parse(url)
            .unwrap()
            .query_pairs()
            .into_owned()
            .collect();
        let mut redirect = reqwest::Url::parse(&params["redirect_uri"]).unwrap();
        {
            let mut query = redirect.query_pairs_mut();
            for (k, v) in extra {
                query.append_pair(k, v);
            }
            let state = if echo_state { params["state"].as_str() } else { "forged" };
            query.append_pair("state", state);
        }
        tokio::spawn(async move {
            reqwest::get(redirect).await.unwrap();
        });
    }
}
