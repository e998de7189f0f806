use serde_json::Value;
use std::io;

use super::{cell, result_of, split_rows};

/// Write output as CSV to stdout.
///
/// Results carrying a schedule are written one row per entry; everything
/// else as `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Err(e) = write_result(&mut wtr, result_of(value)).and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV write error: {e}");
    }
}

fn write_result<W: io::Write>(wtr: &mut csv::Writer<W>, result: &Value) -> Result<(), csv::Error> {
    let Value::Object(map) = result else {
        return wtr.write_record([cell(result)]);
    };

    let (scalars, rows) = split_rows(map);
    if let Some((_, items)) = rows {
        let Some(Value::Object(first)) = items.first() else {
            return Ok(());
        };
        let headers: Vec<&str> = first.keys().map(String::as_str).collect();
        wtr.write_record(&headers)?;
        for item in items {
            if let Value::Object(row) = item {
                wtr.write_record(headers.iter().map(|h| row.get(*h).map(cell).unwrap_or_default()))?;
            }
        }
        return Ok(());
    }

    wtr.write_record(["field", "value"])?;
    for (key, val) in scalars {
        wtr.write_record([key.to_string(), cell(val)])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_result(&mut wtr, result_of(value)).unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_schedule_rows() {
        let v = json!({"result": {"monthly_payment": "500", "entries": [
            {"period": 1, "payment": "500"},
            {"period": 2, "payment": "500"}
        ]}});
        assert_eq!(render(&v), "period,payment\n1,500\n2,500\n");
    }

    #[test]
    fn test_field_value_pairs() {
        let v = json!({"result": {"xirr": "0.1"}});
        assert_eq!(render(&v), "field,value\nxirr,0.1\n");
    }
}
