//! Record presentation: result tables, record detail, field tables, history.

use super::messages::{heading, info};
use crate::crm::types::{display_value, Record};
use crate::navigation::ResultSet;
use chrono::{DateTime, NaiveDateTime};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::Value;

const CELL_WIDTH: usize = 50;
const HISTORY_VALUE_WIDTH: usize = 40;

/// Shorten to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", head)
}

/// Salesforce timestamps (`2024-01-15T10:30:00.000+0000`) as `2024-01-15 10:30:00`.
/// Anything unparseable is returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    const OUT: &str = "%Y-%m-%d %H:%M:%S";
    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return parsed.format(OUT).to_string();
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format(OUT).to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format(OUT).to_string();
    }
    raw.to_string()
}

fn cell(value: Option<&Value>) -> String {
    value
        .map(|v| truncate(&display_value(v), CELL_WIDTH))
        .unwrap_or_default()
}

/// Numbered table of a result set: `#`, `Id`, then the remaining columns.
/// At most `rows` records are shown.
pub fn format_result_set(results: &ResultSet, rows: Option<usize>) -> String {
    if results.is_empty() {
        return info("No records found.");
    }
    let columns: Vec<String> = results
        .field_names()
        .into_iter()
        .filter(|f| f != "Id")
        .collect();

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    let mut header = vec!["#".to_string(), "Id".to_string()];
    header.extend(columns.iter().cloned());
    table.set_header(header);

    let shown = rows.unwrap_or(results.len()).min(results.len());
    for (i, record) in results.records.iter().take(shown).enumerate() {
        let mut row = vec![(i + 1).to_string(), record.id().unwrap_or_default().to_string()];
        row.extend(columns.iter().map(|c| cell(record.get(c))));
        table.add_row(row);
    }

    let mut out = format!("{}\n{}\n", heading(&results.title), table);
    let total = results.total();
    if shown < total {
        out.push_str(&format!("Showing {} of {} matching records", shown, total));
    } else {
        out.push_str(&format!("Found {} record(s)", shown));
    }
    out
}

/// Records returned by a raw query, numbered like a result set.
pub fn format_query_result(records: &[Record], total: usize) -> String {
    let results = ResultSet::new("", "Query Results", records.to_vec()).with_total(total);
    let mut out = format!("Query returned {} record(s)\n", total);
    if !records.is_empty() {
        out.push_str(&format_result_set(&results, None));
    }
    out
}

/// Flatten nested relationship objects to `Parent.Field` rows.
fn flatten<'a>(prefix: &str, value: &'a Value, rows: &mut Vec<(String, &'a Value)>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map.iter().filter(|(k, _)| k.as_str() != "attributes") {
                flatten(&format!("{}.{}", prefix, key), nested, rows);
            }
        }
        Value::Null => {}
        Value::String(s) if s.is_empty() => {}
        other => rows.push((prefix.to_string(), other)),
    }
}

fn detail_value(value: &Value) -> String {
    match value {
        Value::Bool(true) => "✓".to_string(),
        Value::Bool(false) => "✗".to_string(),
        other => display_value(other),
    }
}

/// Record detail: populated fields sorted by name, plus the record link.
pub fn format_record(record: &Record, object_type: &str, instance_url: Option<&str>) -> String {
    let mut rows: Vec<(String, &Value)> = Vec::new();
    for (name, value) in record.populated_fields() {
        flatten(name, value, &mut rows);
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Field", "Value"]);
    for (name, value) in &rows {
        table.add_row(vec![name.clone(), detail_value(value)]);
    }

    let title = format!("{}: {}", object_type, record.display_name());
    let mut out = format!("{}\n{}", heading(&title), table);
    if let (Some(base), Some(id)) = (instance_url, record.id()) {
        out.push_str(&format!("\nURL: {}/{}", base.trim_end_matches('/'), id));
    }
    out
}

/// Two-column table of selected field values.
pub fn format_field_table(title: &str, rows: &[(String, String)]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Field", "Value"]);
    for (name, value) in rows {
        table.add_row(vec![name.clone(), value.clone()]);
    }
    format!("{}\n{}", heading(title), table)
}

/// Field history rows, newest first.
pub fn format_history(title: &str, entries: &[Record]) -> String {
    if entries.is_empty() {
        return info("No field history found (history tracking may not be enabled for this object).");
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Date", "Field", "Old Value", "New Value", "Changed By"]);
    for entry in entries {
        table.add_row(vec![
            format_timestamp(&entry.text("CreatedDate")),
            entry.text("Field"),
            truncate(&entry.text("OldValue"), HISTORY_VALUE_WIDTH),
            truncate(&entry.text("NewValue"), HISTORY_VALUE_WIDTH),
            entry.text("CreatedBy.Name"),
        ]);
    }
    format!(
        "{}\n{}\n{} change(s)",
        heading(title),
        table,
        entries.len()
    )
}
