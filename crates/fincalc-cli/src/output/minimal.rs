use serde_json::Value;

use super::{cell, result_of};

/// Headline field of each result type, in priority order.
const HEADLINE_KEYS: [&str; 10] = [
    "xirr",
    "yield_to_maturity",
    "price",
    "future_value",
    "present_value",
    "payment",
    "monthly_payment",
    "months_saved",
    "value",
    "max_amount",
];

/// Print just the headline number of the result.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(result_of(value)));
}

fn headline(result: &Value) -> String {
    let Value::Object(map) = result else {
        return cell(result);
    };

    for key in HEADLINE_KEYS {
        if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
            return cell(val);
        }
    }

    map.iter()
        .next()
        .map(|(key, val)| format!("{key}: {}", cell(val)))
        .unwrap_or_default()
}
