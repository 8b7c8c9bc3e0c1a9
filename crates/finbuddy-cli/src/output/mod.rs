pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
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

/// First field of `map` holding a non-empty array of objects, e.g. the
/// amortization `schedule` or comparison `entries`.
pub(crate) fn row_array(map: &Map<String, Value>) -> Option<(&str, &[Value])> {
    map.iter().find_map(|(k, v)| match v {
        Value::Array(items) if matches!(items.first(), Some(Value::Object(_))) => {
            Some((k.as_str(), items.as_slice()))
        }
        _ => None,
    })
}

/// Flatten an array of objects into a header row and string rows.
///
/// Scalar fields become columns; one level of nested objects is flattened
/// into `parent.child` columns, deeper arrays and objects are skipped. Headers
/// are the union of keys in first-seen order, so entries missing a field
/// (such as a failed comparison entry) get an empty cell.
pub(crate) fn flatten_rows(items: &[Value]) -> (Vec<String>, Vec<Vec<String>>) {
    let flattened: Vec<Vec<(String, String)>> = items
        .iter()
        .filter_map(|item| item.as_object().map(flatten_object))
        .collect();

    let mut headers: Vec<String> = Vec::new();
    for row in &flattened {
        for (key, _) in row {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = flattened
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|h| {
                    row.iter()
                        .find(|(k, _)| k == h)
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    (headers, rows)
}

fn flatten_object(map: &Map<String, Value>) -> Vec<(String, String)> {
    let mut cells = Vec::new();
    for (key, val) in map {
        match val {
            Value::Object(nested) => {
                for (sub, sub_val) in nested {
                    if is_scalar(sub_val) {
                        cells.push((format!("{key}.{sub}"), scalar_to_string(sub_val)));
                    }
                }
            }
            v if is_scalar(v) => cells.push((key.clone(), scalar_to_string(v))),
            _ => {}
        }
    }
    cells
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
