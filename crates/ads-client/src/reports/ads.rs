//! Ad performance and creative content

use serde::Serialize;

use super::{during_last, float, int, rows, text};
use crate::error::Result;
use crate::executor::{AdsClient, Row};
use crate::flatten::lookup;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdPerformance {
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub campaign_name: Option<String>,
    pub ad_group_name: Option<String>,
    pub impressions: i64,
    pub clicks: i64,
    pub cost_micros: i64,
    pub conversions: f64,
}

/// A responsive search ad with its text assets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdCreative {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ad_type: Option<String>,
    pub status: Option<String>,
    pub campaign_name: Option<String>,
    pub ad_group_name: Option<String>,
    pub final_urls: Vec<String>,
    pub headlines: Vec<String>,
    pub descriptions: Vec<String>,
}

pub async fn get_ad_performance(
    client: &AdsClient,
    customer_id: &str,
    days: u32,
    limit: u32,
) -> Result<Vec<AdPerformance>> {
    let query = format!(
        "
        SELECT
            ad_group_ad.ad.id,
            ad_group_ad.ad.name,
            ad_group_ad.status,
            campaign.name,
            ad_group.name,
            metrics.impressions,
            metrics.clicks,
            metrics.cost_micros,
            metrics.conversions
        FROM ad_group_ad
        WHERE {}
        ORDER BY metrics.impressions DESC
        LIMIT {limit}",
        during_last(days)
    );

    let rows = rows(client, customer_id, &query).await?;
    Ok(rows
        .iter()
        .map(|row| AdPerformance {
            id: text(row, "adGroupAd.ad.id"),
            name: text(row, "adGroupAd.ad.name"),
            status: text(row, "adGroupAd.status"),
            campaign_name: text(row, "campaign.name"),
            ad_group_name: text(row, "adGroup.name"),
            impressions: int(row, "metrics.impressions"),
            clicks: int(row, "metrics.clicks"),
            cost_micros: int(row, "metrics.costMicros"),
            conversions: float(row, "metrics.conversions"),
        })
        .collect())
}

/// Non-removed ads with headlines, descriptions and final URLs.
pub async fn get_ad_creatives(client: &AdsClient, customer_id: &str, limit: u32) -> Result<Vec<AdCreative>> {
    let query = format!(
        "
        SELECT
            ad_group_ad.ad.id,
            ad_group_ad.ad.name,
            ad_group_ad.ad.type,
            ad_group_ad.ad.final_urls,
            ad_group_ad.status,
            ad_group_ad.ad.responsive_search_ad.headlines,
            ad_group_ad.ad.responsive_search_ad.descriptions,
            ad_group.name,
            campaign.name
        FROM ad_group_ad
        WHERE ad_group_ad.status != 'REMOVED'
        ORDER BY campaign.name, ad_group.name
        LIMIT {limit}"
    );

    let rows = rows(client, customer_id, &query).await?;
    Ok(rows
        .iter()
        .map(|row| AdCreative {
            id: text(row, "adGroupAd.ad.id"),
            name: text(row, "adGroupAd.ad.name"),
            ad_type: text(row, "adGroupAd.ad.type"),
            status: text(row, "adGroupAd.status"),
            campaign_name: text(row, "campaign.name"),
            ad_group_name: text(row, "adGroup.name"),
            final_urls: strings(row, "adGroupAd.ad.finalUrls"),
            headlines: asset_texts(row, "adGroupAd.ad.responsiveSearchAd.headlines"),
            descriptions: asset_texts(row, "adGroupAd.ad.responsiveSearchAd.descriptions"),
        })
        .collect())
}

fn strings(row: &Row, path: &str) -> Vec<String> {
    lookup(row, path)
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(|v| v.as_str()).map(str::to_string).collect())
        .unwrap_or_default()
}

/// `text` of each `AdTextAsset` in a list; missing text reads as empty.
fn asset_texts(row: &Row, path: &str) -> Vec<String> {
    lookup(row, path)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .map(|asset| asset.get("text").and_then(|t| t.as_str()).unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}
