//! Arbitrary GAQL queries

use common::format_customer_id;

use crate::error::Result;
use crate::executor::{AdsClient, Row};
use crate::flatten::{OutputFormat, Rendered, flatten, render_rows_table};

/// Rows exactly as the API returned them.
pub async fn execute_gaql_query(client: &AdsClient, customer_id: &str, query: &str) -> Result<Vec<Row>> {
    Ok(client.search(customer_id, query).await?.results)
}

/// Run `query` and render the rows in `format`. A non-empty table is
/// prefixed with the account it came from.
pub async fn run_gaql(client: &AdsClient, customer_id: &str, query: &str, format: OutputFormat) -> Result<Rendered> {
    let rows = execute_gaql_query(client, customer_id, query).await?;
    match format {
        OutputFormat::Table if !rows.is_empty() => Ok(Rendered::Text(format!(
            "Query Results for Account {}:\n{}\n{}",
            format_customer_id(customer_id),
            "-".repeat(100),
            render_rows_table(&rows)
        ))),
        _ => flatten(rows, format),
    }
}
