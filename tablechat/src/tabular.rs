//! Parsing for the textual tabular formats this app deals with: the
//! newline/comma response of the schema introspection service and local
//! file samples for LLM schema inference.

use anyhow::{bail, Result};
use std::collections::BTreeMap;

use crate::types::{ColumnInfo, TableSchema};

/// Parse the two-column `column_name,data_type` structure output.
///
/// The service returns plain text, one row per line; blank lines are
/// ignored. Rows missing the type column get an empty type rather than
/// failing the whole response.
pub fn parse_structure(text: &str) -> Vec<ColumnInfo> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut parts = line.splitn(2, ',');
            ColumnInfo {
                column_name: parts.next().unwrap_or("").trim().to_string(),
                data_type: parts.next().unwrap_or("").trim().to_string(),
            }
        })
        .collect()
}

/// Parse sample rows: first non-blank line is the header, every following
/// line maps header -> value. Short rows yield empty strings for the
/// missing trailing columns; extra cells are dropped.
pub fn parse_sample_rows(text: &str) -> Result<(Vec<String>, Vec<BTreeMap<String, String>>)> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let header_line = match lines.next() {
        Some(line) => line,
        None => bail!("Empty response from schema introspection service"),
    };
    let headers: Vec<String> = header_line
        .split(',')
        .map(|cell| cell.trim().to_string())
        .collect();

    let rows = lines
        .map(|line| {
            let values: Vec<&str> = line.split(',').map(str::trim).collect();
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    (
                        header.clone(),
                        values.get(i).map(|v| (*v).to_string()).unwrap_or_default(),
                    )
                })
                .collect()
        })
        .collect();

    Ok((headers, rows))
}

/// Combine structure and sample responses into one schema description
pub fn build_table_schema(structure_text: &str, sample_text: &str) -> Result<TableSchema> {
    let structure = parse_structure(structure_text);
    let (_, sample_data) = parse_sample_rows(sample_text)?;
    Ok(TableSchema {
        structure,
        sample_data,
    })
}

/// Detect whether an uploaded file is pipe- or comma-delimited by counting
/// both on the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");
    let pipes = first_line.matches('|').count();
    let commas = first_line.matches(',').count();
    if pipes > commas {
        '|'
    } else {
        ','
    }
}

/// First `limit` non-blank rows of a file, used as the LLM inference sample
pub fn sample_rows(content: &str, limit: usize) -> Result<String> {
    let rows: Vec<&str> = content
        .lines()
        .filter(|row| !row.trim().is_empty())
        .take(limit)
        .collect();
    if rows.is_empty() {
        bail!("File is empty");
    }
    Ok(rows.join("\n"))
}

/// Split the first `limit` data rows of a local file on the given
/// delimiter: header first, then raw cell grids for the preview.
pub fn parse_delimited(
    content: &str,
    delimiter: char,
    limit: usize,
) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());
    let header_line = match lines.next() {
        Some(line) => line,
        None => bail!("File is empty"),
    };
    let headers: Vec<String> = header_line
        .split(delimiter)
        .map(|cell| cell.trim().to_string())
        .collect();
    let rows = lines
        .take(limit)
        .map(|line| {
            line.split(delimiter)
                .map(|cell| cell.trim().to_string())
                .collect()
        })
        .collect();
    Ok((headers, rows))
}

/// Render a schema as the `name (type)` list the agents receive
pub fn format_structure(structure: &[ColumnInfo]) -> String {
    structure
        .iter()
        .map(|col| format!("{} ({})", col.column_name, col.data_type))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render sample rows back into header + comma-joined lines for the agents
pub fn format_sample_data(sample_data: &[BTreeMap<String, String>]) -> String {
    let Some(first) = sample_data.first() else {
        return String::new();
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let mut out = vec![headers.join(",")];
    for row in sample_data {
        let cells: Vec<&str> = headers
            .iter()
            .map(|h| row.get(*h).map(String::as_str).unwrap_or(""))
            .collect();
        out.push(cells.join(","));
    }
    out.join("\n")
}
