//! Keyword, search term, budget and conversion reports

use serde::Serialize;

use super::{during_last, float, int, rows, text};
use crate::error::Result;
use crate::executor::AdsClient;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordPerformance {
    pub keyword: Option<String>,
    pub match_type: Option<String>,
    pub campaign_name: Option<String>,
    pub ad_group_name: Option<String>,
    pub impressions: i64,
    pub clicks: i64,
    pub cost_micros: i64,
    pub conversions: f64,
    pub ctr: f64,
    pub average_cpc: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchTerm {
    pub search_term: Option<String>,
    pub status: Option<String>,
    pub campaign_name: Option<String>,
    pub ad_group_name: Option<String>,
    pub impressions: i64,
    pub clicks: i64,
    pub cost_micros: i64,
    pub conversions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetReport {
    pub campaign_id: Option<String>,
    pub campaign_name: Option<String>,
    pub campaign_status: Option<String>,
    pub daily_budget_micros: i64,
    pub total_budget_micros: Option<String>,
    pub budget_status: Option<String>,
    pub delivery_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    pub campaign_id: Option<String>,
    pub campaign_name: Option<String>,
    pub conversions: f64,
    pub conversions_value: f64,
    pub cost_micros: i64,
    pub cost_per_conversion: f64,
    pub conversion_rate: f64,
}

pub async fn get_keyword_performance(
    client: &AdsClient,
    customer_id: &str,
    days: u32,
    limit: u32,
) -> Result<Vec<KeywordPerformance>> {
    let query = format!(
        "
        SELECT
            keyword_view.resource_name,
            ad_group_criterion.keyword.text,
            ad_group_criterion.keyword.match_type,
            ad_group.name,
            campaign.name,
            metrics.impressions,
            metrics.clicks,
            metrics.cost_micros,
            metrics.conversions,
            metrics.ctr,
            metrics.average_cpc
        FROM keyword_view
        WHERE {}
        ORDER BY metrics.impressions DESC
        LIMIT {limit}",
        during_last(days)
    );

    let rows = rows(client, customer_id, &query).await?;
    Ok(rows
        .iter()
        .map(|row| KeywordPerformance {
            keyword: text(row, "adGroupCriterion.keyword.text"),
            match_type: text(row, "adGroupCriterion.keyword.matchType"),
            campaign_name: text(row, "campaign.name"),
            ad_group_name: text(row, "adGroup.name"),
            impressions: int(row, "metrics.impressions"),
            clicks: int(row, "metrics.clicks"),
            cost_micros: int(row, "metrics.costMicros"),
            conversions: float(row, "metrics.conversions"),
            ctr: float(row, "metrics.ctr"),
            average_cpc: int(row, "metrics.averageCpc"),
        })
        .collect())
}

/// The queries users actually typed that triggered ads.
pub async fn get_search_terms_report(
    client: &AdsClient,
    customer_id: &str,
    days: u32,
    limit: u32,
) -> Result<Vec<SearchTerm>> {
    let query = format!(
        "
        SELECT
            search_term_view.search_term,
            search_term_view.status,
            campaign.name,
            ad_group.name,
            metrics.impressions,
            metrics.clicks,
            metrics.cost_micros,
            metrics.conversions
        FROM search_term_view
        WHERE {}
        ORDER BY metrics.impressions DESC
        LIMIT {limit}",
        during_last(days)
    );

    let rows = rows(client, customer_id, &query).await?;
    Ok(rows
        .iter()
        .map(|row| SearchTerm {
            search_term: text(row, "searchTermView.searchTerm"),
            status: text(row, "searchTermView.status"),
            campaign_name: text(row, "campaign.name"),
            ad_group_name: text(row, "adGroup.name"),
            impressions: int(row, "metrics.impressions"),
            clicks: int(row, "metrics.clicks"),
            cost_micros: int(row, "metrics.costMicros"),
            conversions: float(row, "metrics.conversions"),
        })
        .collect())
}

/// Budgets of the first 50 non-removed campaigns by name.
pub async fn get_budget_report(client: &AdsClient, customer_id: &str) -> Result<Vec<BudgetReport>> {
    const QUERY: &str = "
        SELECT
            campaign.id,
            campaign.name,
            campaign.status,
            campaign_budget.amount_micros,
            campaign_budget.total_amount_micros,
            campaign_budget.status,
            campaign_budget.delivery_method
        FROM campaign
        WHERE campaign.status != 'REMOVED'
        ORDER BY campaign.name
        LIMIT 50";

    let rows = rows(client, customer_id, QUERY).await?;
    Ok(rows
        .iter()
        .map(|row| BudgetReport {
            campaign_id: text(row, "campaign.id"),
            campaign_name: text(row, "campaign.name"),
            campaign_status: text(row, "campaign.status"),
            daily_budget_micros: int(row, "campaignBudget.amountMicros"),
            total_budget_micros: text(row, "campaignBudget.totalAmountMicros"),
            budget_status: text(row, "campaignBudget.status"),
            delivery_method: text(row, "campaignBudget.deliveryMethod"),
        })
        .collect())
}

/// Campaigns with at least one conversion, most conversions first.
pub async fn get_conversion_report(
    client: &AdsClient,
    customer_id: &str,
    days: u32,
    limit: u32,
) -> Result<Vec<ConversionReport>> {
    let query = format!(
        "
        SELECT
            campaign.id,
            campaign.name,
            metrics.conversions,
            metrics.conversions_value,
            metrics.cost_micros,
            metrics.cost_per_conversion,
            metrics.conversions_from_interactions_rate
        FROM campaign
        WHERE {}
            AND metrics.conversions > 0
        ORDER BY metrics.conversions DESC
        LIMIT {limit}",
        during_last(days)
    );

    let rows = rows(client, customer_id, &query).await?;
    Ok(rows
        .iter()
        .map(|row| ConversionReport {
            campaign_id: text(row, "campaign.id"),
            campaign_name: text(row, "campaign.name"),
            conversions: float(row, "metrics.conversions"),
            conversions_value: float(row, "metrics.conversionsValue"),
            cost_micros: int(row, "metrics.costMicros"),
            cost_per_conversion: float(row, "metrics.costPerConversion"),
            conversion_rate: float(row, "metrics.conversionsFromInteractionsRate"),
        })
        .collect())
}
