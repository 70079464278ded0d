//! Account-level lookups

use serde::Serialize;

use super::{rows, text};
use crate::error::Result;
use crate::executor::AdsClient;
use crate::flatten::lookup;

const ACCOUNT_INFO_QUERY: &str = "
    SELECT
        customer.id,
        customer.descriptive_name,
        customer.currency_code,
        customer.time_zone,
        customer.manager
    FROM customer
    LIMIT 1";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountInfo {
    pub id: Option<String>,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub timezone: Option<String>,
    pub is_manager: bool,
}

/// Outcome of [`health_check`]. Serializes with a `status` tag of `ok` or
/// `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Health {
    Ok {
        accessible_accounts: usize,
        accounts: Vec<String>,
    },
    Error {
        error: String,
    },
}

/// Customer IDs the credential can access directly.
pub async fn list_accounts(client: &AdsClient) -> Result<Vec<String>> {
    client.list_accessible_customers().await
}

/// `None` when the query returns no row.
pub async fn get_account_info(client: &AdsClient, customer_id: &str) -> Result<Option<AccountInfo>> {
    let rows = rows(client, customer_id, ACCOUNT_INFO_QUERY).await?;
    Ok(rows.first().map(|row| AccountInfo {
        id: text(row, "customer.id"),
        name: text(row, "customer.descriptiveName"),
        currency: text(row, "customer.currencyCode"),
        timezone: text(row, "customer.timeZone"),
        is_manager: lookup(row, "customer.manager")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
    }))
}

/// Currency code such as `USD`, or `Unknown`.
pub async fn get_account_currency(client: &AdsClient, customer_id: &str) -> Result<String> {
    let info = get_account_info(client, customer_id).await?;
    Ok(info
        .and_then(|info| info.currency)
        .unwrap_or_else(|| "Unknown".to_string()))
}

/// Never fails: any error is reported inside [`Health::Error`].
pub async fn health_check(client: &AdsClient) -> Health {
    match list_accounts(client).await {
        Ok(accounts) => Health::Ok {
            accessible_accounts: accounts.len(),
            accounts,
        },
        Err(e) => Health::Error { error: e.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockApi, client_for};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn account_info_maps_customer_fields() {
        let api = MockApi::ok(json!({"results": [{"customer": {
            "id": "1234567890",
            "descriptiveName": "Acme Shoes",
            "currencyCode": "EUR",
            "timeZone": "Europe/Berlin",
            "manager": true
        }}]}))
        .await;
        let (_dir, client) = client_for(&api);

        let info = get_account_info(&client, "123-456-7890").await.unwrap().unwrap();
        assert_eq!(
            info,
            AccountInfo {
                id: Some("1234567890".into()),
                name: Some("Acme Shoes".into()),
                currency: Some("EUR".into()),
                timezone: Some("Europe/Berlin".into()),
                is_manager: true,
            }
        );
        assert!(api.last_query().contains("FROM customer"));
    }

    #[tokio::test]
    async fn currency_is_unknown_without_rows() {
        let api = MockApi::ok(json!({"results": []})).await;
        let (_dir, client) = client_for(&api);
        assert!(get_account_info(&client, "1").await.unwrap().is_none());
        assert_eq!(get_account_currency(&client, "1").await.unwrap(), "Unknown");
    }

    #[tokio::test]
    async fn health_reports_accounts() {
        let api = MockApi::ok(json!({"resourceNames": ["customers/1", "customers/2"]})).await;
        let (_dir, client) = client_for(&api);

        let health = health_check(&client).await;
        assert_eq!(
            serde_json::to_value(&health).unwrap(),
            json!({"status": "ok", "accessible_accounts": 2, "accounts": ["1", "2"]})
        );
    }

    #[tokio::test]
    async fn health_reports_errors_instead_of_failing() {
        let api = MockApi::spawn(vec![(StatusCode::UNAUTHORIZED, json!({"error": "UNAUTHENTICATED"}))]).await;
        let (_dir, client) = client_for(&api);

        match health_check(&client).await {
            Health::Error { error } => assert!(error.contains("401"), "got: {error}"),
            other => panic!("expected error health, got {other:?}"),
        }
    }
}
