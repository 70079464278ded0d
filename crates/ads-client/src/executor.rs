//! Google Ads REST calls
//!
//! One request at a time, no retry. Customer IDs are normalized to ten
//! digits before they are put in a URL. Any non-2xx status becomes
//! [`Error::Api`] with the response body kept verbatim.

use ads_auth::CredentialStore;
use common::format_customer_id;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::signer::RequestSigner;

/// A result row: a JSON object mirroring the selected fields, nested by
/// resource (`{"campaign": {"id": "1", ...}, "metrics": {...}}`).
pub type Row = serde_json::Map<String, Value>;

/// Response of `googleAds:search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(default)]
    pub results: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_mask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    /// int64 on the wire, which the API encodes as a JSON string.
    #[serde(
        default,
        deserialize_with = "lenient_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_results_count: Option<i64>,
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessibleCustomers {
    #[serde(default)]
    resource_names: Vec<String>,
}

/// Authenticated client for one configuration.
#[derive(Debug)]
pub struct AdsClient {
    http: reqwest::Client,
    signer: RequestSigner,
    base_url: String,
    version: String,
}

impl AdsClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Http(format!("building HTTP client: {e}")))?;
        let credentials = CredentialStore::new(config.auth_settings(), http.clone());
        Ok(Self::with_credentials(config, http, credentials))
    }

    /// Build a client around an existing credential store, e.g. one with a
    /// custom authorization prompt.
    pub fn with_credentials(config: ClientConfig, http: reqwest::Client, credentials: CredentialStore) -> Self {
        let signer = RequestSigner::new(&config, credentials);
        Self {
            http,
            signer,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            version: config.api.version,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.version, path)
    }

    /// Run a GAQL query against one account.
    pub async fn search(&self, customer_id: &str, query: &str) -> Result<QueryResult> {
        let customer_id = format_customer_id(customer_id);
        let url = self.url(&format!("customers/{customer_id}/googleAds:search"));
        debug!(customer_id, "search");
        let request = self.http.post(url).json(&json!({ "query": query }));
        let value = self.send(request).await?;
        serde_json::from_value(value).map_err(|e| Error::Decode(format!("search response: {e}")))
    }

    /// Apply mutate operations; the response is returned as the API sent it.
    pub async fn mutate(&self, customer_id: &str, operations: Vec<Value>) -> Result<Value> {
        let customer_id = format_customer_id(customer_id);
        let url = self.url(&format!("customers/{customer_id}/googleAds:mutate"));
        debug!(customer_id, operations = operations.len(), "mutate");
        let request = self
            .http
            .post(url)
            .json(&json!({ "mutateOperations": operations }));
        self.send(request).await
    }

    /// GET a resource path relative to the versioned base URL.
    pub async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        let mut request = self.http.get(self.url(endpoint.trim_start_matches('/')));
        if !params.is_empty() {
            request = request.query(params);
        }
        debug!(endpoint, "get");
        self.send(request).await
    }

    /// IDs of every account the credential can reach directly.
    pub async fn list_accessible_customers(&self) -> Result<Vec<String>> {
        let value = self.get("customers:listAccessibleCustomers", &[]).await?;
        let customers: AccessibleCustomers = serde_json::from_value(value)
            .map_err(|e| Error::Decode(format!("listAccessibleCustomers response: {e}")))?;
        Ok(customers
            .resource_names
            .iter()
            .filter_map(|name| name.rsplit('/').next())
            .map(str::to_string)
            .collect())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let headers = self.signer.headers().await?;
        let response = request
            .headers(headers)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "API request failed");
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::Decode(e.to_string()))
    }
}
