//! Subcommand definitions and their execution

use ads_client::AdsClient;
use ads_client::flatten::{OutputFormat, Rendered};
use ads_client::reports::{self, AdCreative, Health};
use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use serde_json::json;

use crate::output;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List accessible accounts
    Accounts,
    /// Account operations
    Account {
        /// Customer ID
        customer_id: String,
        #[arg(value_enum)]
        action: AccountAction,
    },
    /// Campaign operations
    Campaigns {
        #[command(subcommand)]
        action: CampaignsCommand,
    },
    /// Campaign performance
    Performance {
        customer_id: String,
        /// Days to look back
        #[arg(long, default_value_t = 30)]
        days: u32,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Ad operations
    Ads {
        #[command(subcommand)]
        action: AdsCommand,
    },
    /// List ad groups
    AdGroups {
        customer_id: String,
        /// Only ad groups in this campaign
        #[arg(long)]
        campaign_id: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Asset operations
    Assets {
        #[command(subcommand)]
        action: AssetsCommand,
    },
    /// Run a GAQL query
    Gaql {
        customer_id: String,
        /// GAQL query string
        query: String,
        #[arg(long, default_value_t = OutputFormat::Dict, value_parser = parse_format)]
        format: OutputFormat,
    },
    /// Keyword performance
    Keywords {
        customer_id: String,
        #[arg(long, default_value_t = 30)]
        days: u32,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Search terms report
    SearchTerms {
        customer_id: String,
        #[arg(long, default_value_t = 30)]
        days: u32,
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
    /// Budget report
    Budgets { customer_id: String },
    /// Conversion report
    Conversions {
        customer_id: String,
        #[arg(long, default_value_t = 30)]
        days: u32,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Check API connectivity
    Health,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountAction {
    Info,
    Currency,
}

#[derive(Subcommand, Debug)]
pub enum CampaignsCommand {
    /// List campaigns
    List {
        customer_id: String,
        /// ENABLED, PAUSED or REMOVED
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Campaign details
    Get {
        customer_id: String,
        #[arg(long)]
        campaign_id: String,
    },
    /// Enable, pause or remove a campaign
    SetStatus {
        customer_id: String,
        #[arg(long)]
        campaign_id: String,
        #[arg(long)]
        status: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum AdsCommand {
    /// Ad performance
    Performance {
        customer_id: String,
        #[arg(long, default_value_t = 30)]
        days: u32,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Ad headlines and descriptions
    Creatives {
        customer_id: String,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum AssetsCommand {
    /// Image assets
    Images {
        customer_id: String,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Assets not approved by policy review
    Violations {
        customer_id: String,
        /// IMAGE, TEXT, YOUTUBE_VIDEO, ...
        #[arg(long)]
        asset_type: Option<String>,
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
}

fn parse_format(raw: &str) -> Result<OutputFormat, String> {
    raw.parse().map_err(|e: ads_client::Error| e.to_string())
}

/// Run `command` and return what should be printed to stdout.
pub async fn execute(command: Command, client: &AdsClient, as_json: bool) -> Result<String> {
    match command {
        Command::Accounts => {
            let accounts = reports::list_accounts(client).await?;
            if as_json {
                return output::json(&json!({ "accounts": accounts }));
            }
            let mut lines = vec!["Accessible Google Ads Accounts:".to_string(), "-".repeat(40)];
            lines.extend(accounts.iter().map(|id| format!("  {id}")));
            Ok(lines.join("\n"))
        }
        Command::Account {
            customer_id,
            action: AccountAction::Info,
        } => {
            let info = reports::get_account_info(client, &customer_id).await?;
            match (info, as_json) {
                (info, true) => output::json(&info),
                (Some(info), false) => output::key_values(&format!("Account Information for {customer_id}:"), &info),
                (None, false) => Ok(format!("No account information for {customer_id}.")),
            }
        }
        Command::Account {
            customer_id,
            action: AccountAction::Currency,
        } => {
            let currency = reports::get_account_currency(client, &customer_id).await?;
            if as_json {
                output::json(&json!({ "currency": currency }))
            } else {
                Ok(format!("Account {customer_id} currency: {currency}"))
            }
        }
        Command::Campaigns { action } => campaigns(action, client, as_json).await,
        Command::Performance {
            customer_id,
            days,
            limit,
        } => {
            let data = reports::get_campaign_performance(client, &customer_id, days, limit).await?;
            records(
                &data,
                &["name", "status", "impressions", "clicks", "cost_micros", "conversions"],
                as_json,
            )
        }
        Command::Ads {
            action: AdsCommand::Performance {
                customer_id,
                days,
                limit,
            },
        } => {
            let data = reports::get_ad_performance(client, &customer_id, days, limit).await?;
            records(
                &data,
                &["name", "campaign_name", "impressions", "clicks", "conversions"],
                as_json,
            )
        }
        Command::Ads {
            action: AdsCommand::Creatives { customer_id, limit },
        } => {
            let data = reports::get_ad_creatives(client, &customer_id, limit).await?;
            if as_json {
                output::json(&data)
            } else {
                Ok(creatives(&data))
            }
        }
        Command::AdGroups {
            customer_id,
            campaign_id,
            status,
            limit,
        } => {
            let data =
                reports::list_ad_groups(client, &customer_id, campaign_id.as_deref(), status.as_deref(), limit).await?;
            records(&data, &["id", "name", "status", "campaign_name"], as_json)
        }
        Command::Assets {
            action: AssetsCommand::Images { customer_id, limit },
        } => {
            let data = reports::get_image_assets(client, &customer_id, limit).await?;
            records(&data, &["id", "name", "width", "height", "url"], as_json)
        }
        Command::Assets {
            action: AssetsCommand::Violations {
                customer_id,
                asset_type,
                limit,
            },
        } => {
            let data = reports::get_violating_assets(client, &customer_id, asset_type.as_deref(), limit).await?;
            records(
                &data,
                &["id", "name", "type", "approval_status", "review_status"],
                as_json,
            )
        }
        Command::Gaql {
            customer_id,
            query,
            format,
        } => {
            let format = if as_json { OutputFormat::Json } else { format };
            match reports::run_gaql(client, &customer_id, &query, format).await? {
                Rendered::Rows(rows) => output::json(&rows),
                Rendered::Text(text) => Ok(text),
            }
        }
        Command::Keywords {
            customer_id,
            days,
            limit,
        } => {
            let data = reports::get_keyword_performance(client, &customer_id, days, limit).await?;
            records(
                &data,
                &["keyword", "match_type", "impressions", "clicks", "conversions"],
                as_json,
            )
        }
        Command::SearchTerms {
            customer_id,
            days,
            limit,
        } => {
            let data = reports::get_search_terms_report(client, &customer_id, days, limit).await?;
            records(&data, &["search_term", "campaign_name", "impressions", "clicks"], as_json)
        }
        Command::Budgets { customer_id } => {
            let data = reports::get_budget_report(client, &customer_id).await?;
            records(
                &data,
                &["campaign_name", "campaign_status", "daily_budget_micros"],
                as_json,
            )
        }
        Command::Conversions {
            customer_id,
            days,
            limit,
        } => {
            let data = reports::get_conversion_report(client, &customer_id, days, limit).await?;
            records(
                &data,
                &["campaign_name", "conversions", "conversions_value", "cost_per_conversion"],
                as_json,
            )
        }
        Command::Health => {
            let health = reports::health_check(client).await;
            if as_json {
                output::json(&health)
            } else {
                Ok(health_summary(&health))
            }
        }
    }
}

async fn campaigns(action: CampaignsCommand, client: &AdsClient, as_json: bool) -> Result<String> {
    match action {
        CampaignsCommand::List {
            customer_id,
            status,
            limit,
        } => {
            let data = reports::list_campaigns(client, &customer_id, status.as_deref(), limit).await?;
            records(&data, &["id", "name", "status", "channel_type"], as_json)
        }
        CampaignsCommand::Get {
            customer_id,
            campaign_id,
        } => {
            let campaign = reports::get_campaign(client, &customer_id, &campaign_id).await?;
            match (campaign, as_json) {
                (campaign, true) => output::json(&campaign),
                (Some(campaign), false) => output::key_values(&format!("Campaign {campaign_id}:"), &campaign),
                (None, false) => Ok(format!("Campaign {campaign_id} not found.")),
            }
        }
        CampaignsCommand::SetStatus {
            customer_id,
            campaign_id,
            status,
        } => {
            let response = reports::update_campaign_status(client, &customer_id, &campaign_id, &status)
                .await
                .with_context(|| format!("failed to update campaign {campaign_id}"))?;
            if as_json {
                output::json(&response)
            } else {
                Ok(format!(
                    "Campaign {campaign_id} status set to {}.",
                    status.trim().to_ascii_uppercase()
                ))
            }
        }
    }
}

fn records<T: serde::Serialize>(data: &[T], columns: &[&str], as_json: bool) -> Result<String> {
    if as_json {
        output::json(data)
    } else {
        output::table(data, columns)
    }
}

/// One block per ad: its placement, status, the first three headlines and
/// the first two descriptions.
fn creatives(ads: &[AdCreative]) -> String {
    if ads.is_empty() {
        return output::NO_DATA.to_string();
    }
    let mut blocks = Vec::with_capacity(ads.len());
    for ad in ads {
        let mut lines = vec![
            format!("Ad ID: {}", ad.id.as_deref().unwrap_or_default()),
            format!("  Campaign: {}", ad.campaign_name.as_deref().unwrap_or_default()),
            format!("  Ad Group: {}", ad.ad_group_name.as_deref().unwrap_or_default()),
            format!("  Status: {}", ad.status.as_deref().unwrap_or_default()),
        ];
        if !ad.headlines.is_empty() {
            lines.push(format!("  Headlines: {}", first(&ad.headlines, 3)));
        }
        if !ad.descriptions.is_empty() {
            lines.push(format!("  Descriptions: {}", first(&ad.descriptions, 2)));
        }
        blocks.push(lines.join("\n"));
    }
    blocks.join("\n\n")
}

fn first(items: &[String], n: usize) -> String {
    items.iter().take(n).map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn health_summary(health: &Health) -> String {
    match health {
        Health::Ok {
            accessible_accounts, ..
        } => format!("Status: ok\nAccounts accessible: {accessible_accounts}"),
        Health::Error { error } => format!("Status: error\nError: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creative(id: &str, headlines: &[&str], descriptions: &[&str]) -> AdCreative {
        AdCreative {
            id: Some(id.into()),
            name: None,
            ad_type: Some("RESPONSIVE_SEARCH_AD".into()),
            status: Some("ENABLED".into()),
            campaign_name: Some("Brand".into()),
            ad_group_name: Some("Sneakers".into()),
            final_urls: vec![],
            headlines: headlines.iter().map(|s| s.to_string()).collect(),
            descriptions: descriptions.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn creatives_truncate_headlines_and_descriptions() {
        let out = creatives(&[creative(
            "9",
            &["One", "Two", "Three", "Four"],
            &["First line.", "Second line.", "Third line."],
        )]);
        assert_eq!(
            out,
            "Ad ID: 9\n  Campaign: Brand\n  Ad Group: Sneakers\n  Status: ENABLED\n  \
             Headlines: One, Two, Three\n  Descriptions: First line., Second line."
        );
    }

    #[test]
    fn creatives_skip_empty_text_lists() {
        let out = creatives(&[creative("9", &[], &[]), creative("10", &["Solo"], &[])]);
        let blocks: Vec<&str> = out.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(!blocks[0].contains("Headlines"));
        assert!(blocks[1].ends_with("Headlines: Solo"));
        assert_eq!(creatives(&[]), output::NO_DATA);
    }

    #[test]
    fn health_summary_per_status() {
        let ok = Health::Ok {
            accessible_accounts: 2,
            accounts: vec!["1".into(), "2".into()],
        };
        assert_eq!(health_summary(&ok), "Status: ok\nAccounts accessible: 2");

        let err = Health::Error {
            error: "invalid credentials: no refresh token".into(),
        };
        assert!(health_summary(&err).ends_with("Error: invalid credentials: no refresh token"));
    }

    #[test]
    fn format_flag_parses() {
        assert_eq!(parse_format("csv").unwrap(), OutputFormat::Csv);
        assert!(parse_format("yaml").unwrap_err().contains("dict, json, csv, table"));
    }
}
