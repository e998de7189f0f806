pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("JSON serialization error: {e}"),
        },
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The `result` object of a computation envelope, or the value itself.
pub(crate) fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// Split a result object into scalar fields and the first row-list field
/// (e.g. amortization `entries`).
pub(crate) fn split_rows(map: &Map<String, Value>) -> (Vec<(&str, &Value)>, Option<(&str, &[Value])>) {
    let mut scalars = Vec::new();
    let mut rows = None;
    for (key, val) in map {
        match val {
            Value::Array(items) if rows.is_none() && items.iter().all(Value::is_object) && !items.is_empty() => {
                rows = Some((key.as_str(), items.as_slice()));
            }
            _ => scalars.push((key.as_str(), val)),
        }
    }
    (scalars, rows)
}

/// Render a JSON value as a single cell.
pub(crate) fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
