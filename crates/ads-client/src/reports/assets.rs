//! Image assets and policy violations

use serde::Serialize;

use super::{enum_literal, rows, text};
use crate::error::Result;
use crate::executor::AdsClient;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageAsset {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub url: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub file_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolatingAsset {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub approval_status: Option<String>,
    pub review_status: Option<String>,
}

pub async fn get_image_assets(client: &AdsClient, customer_id: &str, limit: u32) -> Result<Vec<ImageAsset>> {
    let query = format!(
        "
        SELECT
            asset.id,
            asset.name,
            asset.type,
            asset.image_asset.full_size.url,
            asset.image_asset.full_size.height_pixels,
            asset.image_asset.full_size.width_pixels,
            asset.image_asset.file_size
        FROM asset
        WHERE asset.type = 'IMAGE'
        LIMIT {limit}"
    );

    let rows = rows(client, customer_id, &query).await?;
    Ok(rows
        .iter()
        .map(|row| ImageAsset {
            id: text(row, "asset.id"),
            name: text(row, "asset.name"),
            asset_type: text(row, "asset.type"),
            url: text(row, "asset.imageAsset.fullSize.url"),
            width: text(row, "asset.imageAsset.fullSize.widthPixels"),
            height: text(row, "asset.imageAsset.fullSize.heightPixels"),
            file_size: text(row, "asset.imageAsset.fileSize"),
        })
        .collect())
}

/// Assets whose policy approval is anything but `APPROVED`, optionally of
/// one type (`IMAGE`, `TEXT`, `YOUTUBE_VIDEO`, ...).
pub async fn get_violating_assets(
    client: &AdsClient,
    customer_id: &str,
    asset_type: Option<&str>,
    limit: u32,
) -> Result<Vec<ViolatingAsset>> {
    let mut conditions = vec!["asset.policy_summary.approval_status != 'APPROVED'".to_string()];
    if let Some(asset_type) = asset_type {
        conditions.push(format!("asset.type = '{}'", enum_literal("asset type", asset_type)?));
    }
    let query = format!(
        "
        SELECT
            asset.id,
            asset.name,
            asset.type,
            asset.policy_summary.approval_status,
            asset.policy_summary.review_status
        FROM asset
        WHERE {}
        LIMIT {limit}",
        conditions.join(" AND ")
    );

    let rows = rows(client, customer_id, &query).await?;
    Ok(rows
        .iter()
        .map(|row| ViolatingAsset {
            id: text(row, "asset.id"),
            name: text(row, "asset.name"),
            asset_type: text(row, "asset.type"),
            approval_status: text(row, "asset.policySummary.approvalStatus"),
            review_status: text(row, "asset.policySummary.reviewStatus"),
        })
        .collect())
}
