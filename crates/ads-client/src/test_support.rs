//! In-process mock Ads API and credential fixtures for tests

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use ads_auth::credentials::{self, AuthorizedUser};
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use chrono::{Duration, Utc};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;

use crate::config::{ApiConfig, ClientConfig};
use crate::executor::AdsClient;

/// One request as seen by the mock API.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Clone)]
struct ApiState {
    responses: Arc<Mutex<VecDeque<(StatusCode, Value)>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

/// API server that replays canned responses in order (the last one repeats)
/// and records every request it receives.
pub struct MockApi {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockApi {
    pub async fn spawn(responses: Vec<(StatusCode, Value)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests: Arc<Mutex<Vec<Recorded>>> = Arc::default();
        let state = ApiState {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: requests.clone(),
        };

        tokio::spawn(async move {
            let app = axum::Router::new().fallback(handle).with_state(state);
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    /// Respond to everything with a single `200` body.
    pub async fn ok(body: Value) -> Self {
        Self::spawn(vec![(StatusCode::OK, body)]).await
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// The GAQL text of the most recent search request.
    pub fn last_query(&self) -> String {
        let requests = self.requests();
        let last = requests.last().expect("no request recorded");
        last.body["query"].as_str().unwrap_or_default().to_string()
    }
}

async fn handle(
    State(state): State<ApiState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    state.requests.lock().unwrap().push(Recorded {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });

    let mut responses = state.responses.lock().unwrap();
    let (status, body) = if responses.len() > 1 {
        responses.pop_front().unwrap()
    } else {
        responses.front().cloned().unwrap()
    };
    (status, Json(body))
}

fn write_token(path: &Path, expiry_offset: Duration, refresh: Option<&str>) {
    let user = AuthorizedUser {
        token: Some("ya29.test-token".into()),
        refresh_token: refresh.map(str::to_string),
        token_uri: "http://127.0.0.1:9/token".into(),
        client_id: "client".into(),
        client_secret: "secret".into(),
        scopes: vec![ads_auth::constants::ADWORDS_SCOPE.into()],
        expiry: Some(Utc::now() + expiry_offset),
        credential_type: "authorized_user".into(),
    };
    credentials::save(path, &user).unwrap();
}

/// Config backed by an unexpired OAuth token file, so signing never leaves
/// the process. Keep the `TempDir` alive for the duration of the test.
pub fn oauth_config(base_url: &str) -> (TempDir, ClientConfig) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    write_token(&path, Duration::hours(1), Some("1//refresh"));
    let config = ClientConfig {
        credentials_path: Some(path),
        developer_token: Some("dev-token".into()),
        api: ApiConfig {
            base_url: base_url.to_string(),
            version: "v19".into(),
        },
        ..ClientConfig::default()
    };
    (dir, config)
}

/// Config whose stored OAuth token is expired and cannot be refreshed.
pub fn expired_oauth_config() -> (TempDir, ClientConfig) {
    let (dir, config) = oauth_config("http://127.0.0.1:9");
    let path = dir.path().join("token.json");
    write_token(&path, -Duration::hours(1), None);
    (dir, config)
}

/// Client pointed at `api`, signing with a stored OAuth token.
pub fn client_for(api: &MockApi) -> (TempDir, AdsClient) {
    let (dir, config) = oauth_config(&api.base_url);
    (dir, AdsClient::new(config).unwrap())
}
