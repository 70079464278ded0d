//! Ad group listing, detail and performance

use serde::Serialize;

use super::{during_last, enum_literal, float, int, numeric_id, rows, text};
use crate::error::Result;
use crate::executor::AdsClient;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdGroup {
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub ad_group_type: Option<String>,
    pub campaign_id: Option<String>,
    pub campaign_name: Option<String>,
    pub campaign_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdGroupDetail {
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub ad_group_type: Option<String>,
    pub cpc_bid_micros: Option<String>,
    pub campaign_id: Option<String>,
    pub campaign_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdGroupPerformance {
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub campaign_name: Option<String>,
    pub impressions: i64,
    pub clicks: i64,
    pub cost_micros: i64,
    pub conversions: f64,
}

pub async fn list_ad_groups(
    client: &AdsClient,
    customer_id: &str,
    campaign_id: Option<&str>,
    status_filter: Option<&str>,
    limit: u32,
) -> Result<Vec<AdGroup>> {
    let mut conditions = Vec::new();
    if let Some(id) = campaign_id {
        conditions.push(format!("campaign.id = {}", numeric_id("campaign", id)?));
    }
    if let Some(status) = status_filter {
        conditions.push(format!("ad_group.status = '{}'", enum_literal("status", status)?));
    }
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let query = format!(
        "
        SELECT
            ad_group.id,
            ad_group.name,
            ad_group.status,
            ad_group.type,
            campaign.id,
            campaign.name,
            campaign.status
        FROM ad_group
        {where_clause}
        ORDER BY campaign.name, ad_group.name
        LIMIT {limit}"
    );

    let rows = rows(client, customer_id, &query).await?;
    Ok(rows
        .iter()
        .map(|row| AdGroup {
            id: text(row, "adGroup.id"),
            name: text(row, "adGroup.name"),
            status: text(row, "adGroup.status"),
            ad_group_type: text(row, "adGroup.type"),
            campaign_id: text(row, "campaign.id"),
            campaign_name: text(row, "campaign.name"),
            campaign_status: text(row, "campaign.status"),
        })
        .collect())
}

pub async fn get_ad_group(client: &AdsClient, customer_id: &str, ad_group_id: &str) -> Result<Option<AdGroupDetail>> {
    let ad_group_id = numeric_id("ad group", ad_group_id)?;
    let query = format!(
        "
        SELECT
            ad_group.id,
            ad_group.name,
            ad_group.status,
            ad_group.type,
            ad_group.cpc_bid_micros,
            campaign.id,
            campaign.name
        FROM ad_group
        WHERE ad_group.id = {ad_group_id}
        LIMIT 1"
    );

    let rows = rows(client, customer_id, &query).await?;
    Ok(rows.first().map(|row| AdGroupDetail {
        id: text(row, "adGroup.id"),
        name: text(row, "adGroup.name"),
        status: text(row, "adGroup.status"),
        ad_group_type: text(row, "adGroup.type"),
        cpc_bid_micros: text(row, "adGroup.cpcBidMicros"),
        campaign_id: text(row, "campaign.id"),
        campaign_name: text(row, "campaign.name"),
    }))
}

pub async fn get_ad_group_performance(
    client: &AdsClient,
    customer_id: &str,
    days: u32,
    campaign_id: Option<&str>,
    limit: u32,
) -> Result<Vec<AdGroupPerformance>> {
    let mut where_clause = during_last(days);
    if let Some(id) = campaign_id {
        where_clause.push_str(&format!(" AND campaign.id = {}", numeric_id("campaign", id)?));
    }
    let query = format!(
        "
        SELECT
            ad_group.id,
            ad_group.name,
            ad_group.status,
            campaign.name,
            metrics.impressions,
            metrics.clicks,
            metrics.cost_micros,
            metrics.conversions
        FROM ad_group
        WHERE {where_clause}
        ORDER BY metrics.cost_micros DESC
        LIMIT {limit}"
    );

    let rows = rows(client, customer_id, &query).await?;
    Ok(rows
        .iter()
        .map(|row| AdGroupPerformance {
            id: text(row, "adGroup.id"),
            name: text(row, "adGroup.name"),
            status: text(row, "adGroup.status"),
            campaign_name: text(row, "campaign.name"),
            impressions: int(row, "metrics.impressions"),
            clicks: int(row, "metrics.clicks"),
            cost_micros: int(row, "metrics.costMicros"),
            conversions: float(row, "metrics.conversions"),
        })
        .collect())
}
