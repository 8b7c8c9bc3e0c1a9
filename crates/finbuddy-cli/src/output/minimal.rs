use serde_json::Value;

use super::{result_of, scalar_to_string};

/// Key answer of each command, in priority order.
const PRIORITY_KEYS: [&str; 6] = [
    "emi",
    "interest_saved",
    "lowest_total_interest_index",
    "path",
    "months_taken",
    "total_interest",
];

/// Print just the key answer value from the output.
///
/// Looks for the well-known result fields first, then falls back to the first
/// field of the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_answer(value));
}

fn minimal_answer(value: &Value) -> String {
    let result_obj = result_of(value);

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key) {
                if !val.is_null() {
                    return scalar_to_string(val);
                }
            }
        }
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, scalar_to_string(val));
        }
    }

    scalar_to_string(result_obj)
}
