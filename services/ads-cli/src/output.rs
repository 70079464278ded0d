//! Terminal rendering of report records

use anyhow::{Context, Result};
use ads_client::flatten::{render_table, render_value};
use serde::Serialize;
use serde_json::{Map, Value};

pub const NO_DATA: &str = "No data found.";

/// Pretty JSON with two-space indent.
pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("serializing output")
}

/// Fixed-width table of `records` restricted to `columns`.
pub fn table<T: Serialize>(records: &[T], columns: &[&str]) -> Result<String> {
    if records.is_empty() {
        return Ok(NO_DATA.to_string());
    }
    let rows = records
        .iter()
        .map(|record| -> Result<Vec<String>> {
            let fields = fields(record)?;
            Ok(columns
                .iter()
                .map(|column| render_value(fields.get(*column)))
                .collect())
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(render_table(columns, &rows))
}

/// `title`, a 40-dash rule, then one indented `key: value` line per field.
pub fn key_values<T: Serialize>(title: &str, record: &T) -> Result<String> {
    let mut lines = vec![title.to_string(), "-".repeat(40)];
    for (key, value) in fields(record)? {
        lines.push(format!("  {key}: {}", render_value(Some(&value))));
    }
    Ok(lines.join("\n"))
}

fn fields<T: Serialize>(record: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(record).context("serializing record")? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("expected a record, got {other}"),
    }
}
