//! Typed reports over common GAQL queries
//!
//! Each function builds a query, runs it through [`AdsClient::search`] and
//! maps the nested rows to a flat record. int64 metrics arrive as JSON
//! strings; they are parsed leniently, with missing or unparsable values
//! read as zero.

pub mod accounts;
pub mod ad_groups;
pub mod ads;
pub mod assets;
pub mod campaigns;
pub mod gaql;
pub mod reporting;

pub use accounts::{AccountInfo, Health, get_account_currency, get_account_info, health_check, list_accounts};
pub use ad_groups::{AdGroup, AdGroupDetail, AdGroupPerformance, get_ad_group, get_ad_group_performance, list_ad_groups};
pub use ads::{AdCreative, AdPerformance, get_ad_creatives, get_ad_performance};
pub use assets::{ImageAsset, ViolatingAsset, get_image_assets, get_violating_assets};
pub use campaigns::{
    Campaign, CampaignDetail, CampaignPerformance, get_campaign, get_campaign_performance, list_campaigns,
    update_campaign_status,
};
pub use gaql::{execute_gaql_query, run_gaql};
pub use reporting::{
    BudgetReport, ConversionReport, KeywordPerformance, SearchTerm, get_budget_report, get_conversion_report,
    get_keyword_performance, get_search_terms_report,
};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::executor::{AdsClient, Row};
use crate::flatten::lookup;

/// int64 field, accepting numbers or numeric strings.
pub(crate) fn int(row: &Row, path: &str) -> i64 {
    match lookup(row, path) {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| s.trim().parse::<f64>().ok().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// double field, accepting numbers or numeric strings.
pub(crate) fn float(row: &Row, path: &str) -> f64 {
    match lookup(row, path) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// String-ish field. IDs are int64 and so arrive as strings, but numbers
/// are accepted too.
pub(crate) fn text(row: &Row, path: &str) -> Option<String> {
    match lookup(row, path) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

/// `segments.date DURING LAST_<n>_DAYS`
pub(crate) fn during_last(days: u32) -> String {
    format!("segments.date DURING LAST_{days}_DAYS")
}

/// IDs are interpolated into GAQL, so only digits are accepted.
pub(crate) fn numeric_id<'a>(kind: &str, raw: &'a str) -> Result<&'a str> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Config(format!("{kind} id must be numeric, got {raw:?}")));
    }
    Ok(raw)
}

/// Enum literals such as `ENABLED` or `IMAGE`, upper-cased.
pub(crate) fn enum_literal(kind: &str, raw: &str) -> Result<String> {
    let upper = raw.trim().to_ascii_uppercase();
    if upper.is_empty() || !upper.bytes().all(|b| b.is_ascii_uppercase() || b == b'_') {
        return Err(Error::Config(format!("invalid {kind}: {raw:?}")));
    }
    Ok(upper)
}

pub(crate) async fn rows(client: &AdsClient, customer_id: &str, query: &str) -> Result<Vec<Row>> {
    Ok(client.search(customer_id, query).await?.results)
}
