//! Reshape nested result rows into flat records
//!
//! The column set is discovered from the **first row only**: a depth-first
//! walk where scalars and lists become dot-joined paths and objects are
//! recursed into. Later rows are read through those paths, so a path they
//! lack renders empty and a path only they have is dropped.
//!
//! Values render as strings: strings verbatim, numbers and booleans in their
//! JSON form, null as empty, lists and objects as compact JSON.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::executor::Row;

/// Shown by the table renderer when there is nothing to show.
pub const NO_RESULTS: &str = "No results found.";

/// Output shape requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// The rows themselves, untouched.
    #[default]
    Dict,
    Json,
    Csv,
    Table,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Dict => "dict",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Table => "table",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dict" => Ok(OutputFormat::Dict),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "table" => Ok(OutputFormat::Table),
            other => Err(Error::Config(format!(
                "output format must be one of dict, json, csv, table; got {other}"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What [`flatten`] produces: the raw rows for `dict`, text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Rows(Vec<Row>),
    Text(String),
}

impl fmt::Display for Rendered {
    /// Rows print as pretty JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rendered::Text(text) => f.write_str(text),
            Rendered::Rows(rows) => {
                let json = serde_json::to_string_pretty(rows).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

/// A dot-joined path paired with its rendered value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedField {
    pub path: String,
    pub value: String,
}

/// Leaf paths of `row` in depth-first order.
pub fn field_paths(row: &Row) -> Vec<String> {
    fn walk(object: &Row, prefix: &str, out: &mut Vec<String>) {
        for (key, value) in object {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            match value {
                Value::Object(inner) => walk(inner, &path, out),
                _ => out.push(path),
            }
        }
    }

    let mut paths = Vec::new();
    walk(row, "", &mut paths);
    paths
}

/// Follow a dot path into a row. `None` if any segment is missing or a
/// non-object is met before the end.
pub fn lookup<'a>(row: &'a Row, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = row.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

pub fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// A row read through `paths`.
pub fn flatten_row(row: &Row, paths: &[String]) -> Vec<FlattenedField> {
    paths
        .iter()
        .map(|path| FlattenedField {
            path: path.clone(),
            value: render_value(lookup(row, path)),
        })
        .collect()
}

/// Header line plus one line per row. Commas inside values become
/// semicolons; nothing is quoted.
pub fn render_csv(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };
    let paths = field_paths(first);

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(paths.join(","));
    for row in rows {
        let values: Vec<String> = flatten_row(row, &paths)
            .into_iter()
            .map(|field| field.value.replace(',', ";"))
            .collect();
        lines.push(values.join(","));
    }
    lines.join("\n")
}

/// Fixed-width text table: left-aligned columns joined by `" | "`, a dash
/// rule as long as the header line.
pub fn render_table<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.as_ref().chars().count()).collect();
    for row in rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    let header = padded_line(headers.iter().map(AsRef::as_ref), &widths);
    let rule = "-".repeat(header.chars().count());
    let mut lines = vec![header, rule];
    for row in rows {
        lines.push(padded_line(row.iter().map(String::as_str), &widths));
    }
    lines.join("\n")
}

fn padded_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Table of `rows` over the first row's paths, or [`NO_RESULTS`].
pub fn render_rows_table(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return NO_RESULTS.to_string();
    };
    let paths = field_paths(first);
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| flatten_row(row, &paths).into_iter().map(|f| f.value).collect())
        .collect();
    render_table(&paths, &cells)
}

/// Render `rows` in `format`.
///
/// Empty input gives `[]` (json), an empty string (csv), [`NO_RESULTS`]
/// (table) or no rows (dict).
pub fn flatten(rows: Vec<Row>, format: OutputFormat) -> Result<Rendered> {
    Ok(match format {
        OutputFormat::Dict => Rendered::Rows(rows),
        OutputFormat::Json => Rendered::Text(
            serde_json::to_string_pretty(&rows).map_err(|e| Error::Decode(e.to_string()))?,
        ),
        OutputFormat::Csv => Rendered::Text(render_csv(&rows)),
        OutputFormat::Table => Rendered::Text(render_rows_table(&rows)),
    })
}
