//! Campaign listing, detail, performance and status changes

use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

use super::{during_last, enum_literal, float, int, numeric_id, rows, text};
use crate::error::Result;
use crate::executor::AdsClient;
use common::format_customer_id;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Campaign {
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub channel_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignDetail {
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub channel_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub bidding_strategy: Option<String>,
    pub budget_micros: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignPerformance {
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub impressions: i64,
    pub clicks: i64,
    pub cost_micros: i64,
    pub conversions: f64,
    pub average_cpc: i64,
}

/// Campaigns ordered by name, optionally restricted to one status
/// (`ENABLED`, `PAUSED`, `REMOVED`).
pub async fn list_campaigns(
    client: &AdsClient,
    customer_id: &str,
    status_filter: Option<&str>,
    limit: u32,
) -> Result<Vec<Campaign>> {
    let where_clause = match status_filter {
        Some(status) => format!("WHERE campaign.status = '{}'", enum_literal("status", status)?),
        None => String::new(),
    };
    let query = format!(
        "
        SELECT
            campaign.id,
            campaign.name,
            campaign.status,
            campaign.advertising_channel_type,
            campaign.start_date,
            campaign.end_date
        FROM campaign
        {where_clause}
        ORDER BY campaign.name
        LIMIT {limit}"
    );

    let rows = rows(client, customer_id, &query).await?;
    Ok(rows
        .iter()
        .map(|row| Campaign {
            id: text(row, "campaign.id"),
            name: text(row, "campaign.name"),
            status: text(row, "campaign.status"),
            channel_type: text(row, "campaign.advertisingChannelType"),
            start_date: text(row, "campaign.startDate"),
            end_date: text(row, "campaign.endDate"),
        })
        .collect())
}

/// `None` when no campaign has that ID.
pub async fn get_campaign(client: &AdsClient, customer_id: &str, campaign_id: &str) -> Result<Option<CampaignDetail>> {
    let campaign_id = numeric_id("campaign", campaign_id)?;
    let query = format!(
        "
        SELECT
            campaign.id,
            campaign.name,
            campaign.status,
            campaign.advertising_channel_type,
            campaign.start_date,
            campaign.end_date,
            campaign.bidding_strategy_type,
            campaign_budget.amount_micros
        FROM campaign
        WHERE campaign.id = {campaign_id}
        LIMIT 1"
    );

    let rows = rows(client, customer_id, &query).await?;
    Ok(rows.first().map(|row| CampaignDetail {
        id: text(row, "campaign.id"),
        name: text(row, "campaign.name"),
        status: text(row, "campaign.status"),
        channel_type: text(row, "campaign.advertisingChannelType"),
        start_date: text(row, "campaign.startDate"),
        end_date: text(row, "campaign.endDate"),
        bidding_strategy: text(row, "campaign.biddingStrategyType"),
        budget_micros: text(row, "campaignBudget.amountMicros"),
    }))
}

/// Per-campaign metrics over the last `days` days, highest spend first.
pub async fn get_campaign_performance(
    client: &AdsClient,
    customer_id: &str,
    days: u32,
    limit: u32,
) -> Result<Vec<CampaignPerformance>> {
    let query = format!(
        "
        SELECT
            campaign.id,
            campaign.name,
            campaign.status,
            metrics.impressions,
            metrics.clicks,
            metrics.cost_micros,
            metrics.conversions,
            metrics.average_cpc
        FROM campaign
        WHERE {}
        ORDER BY metrics.cost_micros DESC
        LIMIT {limit}",
        during_last(days)
    );

    let rows = rows(client, customer_id, &query).await?;
    Ok(rows
        .iter()
        .map(|row| CampaignPerformance {
            id: text(row, "campaign.id"),
            name: text(row, "campaign.name"),
            status: text(row, "campaign.status"),
            impressions: int(row, "metrics.impressions"),
            clicks: int(row, "metrics.clicks"),
            cost_micros: int(row, "metrics.costMicros"),
            conversions: float(row, "metrics.conversions"),
            average_cpc: int(row, "metrics.averageCpc"),
        })
        .collect())
}

/// Set a campaign's status through `googleAds:mutate`. Returns the mutate
/// response verbatim.
pub async fn update_campaign_status(
    client: &AdsClient,
    customer_id: &str,
    campaign_id: &str,
    status: &str,
) -> Result<Value> {
    let campaign_id = numeric_id("campaign", campaign_id)?;
    let status = enum_literal("status", status)?;
    let resource_name = format!(
        "customers/{}/campaigns/{campaign_id}",
        format_customer_id(customer_id)
    );
    info!(resource_name, status, "updating campaign status");

    let operation = json!({
        "campaignOperation": {
            "update": {
                "resourceName": resource_name,
                "status": status,
            },
            "updateMask": "status",
        }
    });
    client.mutate(customer_id, vec![operation]).await
}
