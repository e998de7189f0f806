use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{cell, result_of, split_rows};

/// Format output as tables: result fields, then any schedule rows, then
/// warnings and methodology from the envelope.
pub fn print_table(value: &Value) {
    match result_of(value) {
        Value::Object(map) => {
            let (scalars, rows) = split_rows(map);
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, val) in scalars {
                builder.push_record([key.to_string(), cell(val)]);
            }
            println!("{}", Table::from(builder));

            if let Some((name, items)) = rows {
                println!("\n{name}:");
                print_rows(items);
            }
        }
        other => println!("{}", cell(other)),
    }

    if let Some(envelope) = value.as_object() {
        if let Some(Value::Array(warnings)) = envelope.get("warnings") {
            if !warnings.is_empty() {
                println!("\nWarnings:");
                for w in warnings {
                    println!("  - {}", cell(w));
                }
            }
        }
        if let Some(Value::String(meth)) = envelope.get("methodology") {
            println!("\nMethodology: {meth}");
        }
    }
}

fn print_rows(items: &[Value]) {
    let Some(Value::Object(first)) = items.first() else {
        return;
    };
    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for item in items {
        if let Value::Object(map) = item {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| map.get(h).map(cell).unwrap_or_default()),
            );
        }
    }
    println!("{}", Table::from(builder));
}
