//! Output formatting for query results.
//!
//! Supports table, JSON and CSV output formats. Every row is rendered
//! against the same column list (`id` followed by the sorted union of field
//! names); a field a row lacks renders as an empty cell.

use std::str::FromStr;

use comfy_table::{Cell, ContentArrangement, Table};
use serde_json::Value as JsonValue;

use widecol_data::row::result_columns;
use widecol_data::ResultRow;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Formatted table output.
    Table,
    /// JSON output.
    Json,
    /// CSV output.
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

/// Formats result rows according to the specified format.
pub fn format_rows(rows: &[ResultRow], format: OutputFormat) -> String {
    let columns = result_columns(rows);
    match format {
        OutputFormat::Table => format_table(&columns, rows),
        OutputFormat::Json => format_json(rows),
        OutputFormat::Csv => format_csv(&columns, rows),
    }
}

/// Formats a list of names (tables, queries) as a single column.
pub fn format_list(header: &str, items: &[(String, String)], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(vec![Cell::new(header), Cell::new("description")]);
            for (name, description) in items {
                table.add_row(vec![Cell::new(name), Cell::new(description)]);
            }
            table.to_string()
        }
        OutputFormat::Json => {
            let values: Vec<JsonValue> = items
                .iter()
                .map(|(name, description)| {
                    let mut obj = serde_json::Map::new();
                    obj.insert(header.to_string(), JsonValue::String(name.clone()));
                    obj.insert(
                        "description".to_string(),
                        JsonValue::String(description.clone()),
                    );
                    JsonValue::Object(obj)
                })
                .collect();
            serde_json::to_string_pretty(&values).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Csv => {
            let mut output = format!("{header},description\n");
            for (name, description) in items {
                output.push_str(&escape_csv(name));
                output.push(',');
                output.push_str(&escape_csv(description));
                output.push('\n');
            }
            output
        }
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

fn cell_values<'a>(columns: &'a [String], row: &'a ResultRow) -> impl Iterator<Item = &'a str> {
    columns.iter().map(move |c| row.get(c).unwrap_or(""))
}

/// Formats the rows as a table.
fn format_table(columns: &[String], rows: &[ResultRow]) -> String {
    let mut table = new_table();
    table.set_header(columns.iter().map(Cell::new));

    for row in rows {
        table.add_row(cell_values(columns, row).map(Cell::new));
    }

    table.to_string()
}

/// Formats the rows as a JSON array of objects.
fn format_json(rows: &[ResultRow]) -> String {
    serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string())
}

/// Formats the rows as CSV.
fn format_csv(columns: &[String], rows: &[ResultRow]) -> String {
    let mut output = String::new();

    let header: Vec<String> = columns.iter().map(|c| escape_csv(c)).collect();
    output.push_str(&header.join(","));
    output.push('\n');

    for row in rows {
        let values: Vec<String> = cell_values(columns, row).map(escape_csv).collect();
        output.push_str(&values.join(","));
        output.push('\n');
    }

    output
}

/// Escapes a value for CSV output.
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use widecol_data::Row;

    fn make_rows() -> Vec<ResultRow> {
        vec![
            Row::new("user_1")
                .with_field("info", "name", "Alice")
                .with_field("info", "address", "1 Oak Street, Northfield")
                .into_result(),
            Row::new("user_2")
                .with_field("info", "name", "Bob")
                .with_field("info", "email", "bob@example.com")
                .into_result(),
        ]
    }

    #[test]
    fn test_format_table() {
        let output = format_rows(&make_rows(), OutputFormat::Table);
        assert!(output.contains("id"));
        assert!(output.contains("email"));
        assert!(output.contains("Alice"));
        assert!(output.contains("bob@example.com"));
    }

    #[test]
    fn test_format_json() {
        let output = format_rows(&make_rows(), OutputFormat::Json);
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["id"], "user_1");
        assert_eq!(parsed[1]["email"], "bob@example.com");
        assert!(parsed[0].get("email").is_none());
    }

    #[test]
    fn test_format_csv() {
        let output = format_rows(&make_rows(), OutputFormat::Csv);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "id,address,email,name");
        assert_eq!(lines[1], "user_1,\"1 Oak Street, Northfield\",,Alice");
        assert_eq!(lines[2], "user_2,,bob@example.com,Bob");
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_rows(&[], OutputFormat::Csv), "id\n");
        assert_eq!(format_rows(&[], OutputFormat::Json), "[]");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("hello"), "hello");
        assert_eq!(escape_csv("hello,world"), "\"hello,world\"");
        assert_eq!(escape_csv("hello\"world"), "\"hello\"\"world\"");
    }

    #[test]
    fn test_format_list() {
        let items = vec![("products".to_string(), "5 rows".to_string())];
        let output = format_list("table", &items, OutputFormat::Csv);
        assert_eq!(output, "table,description\nproducts,5 rows\n");
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
