use serde_json::Value;
use std::io;

use super::{flatten_rows, result_of, row_array, scalar_to_string};

/// Write output as CSV to stdout.
///
/// When the result carries a row array (schedule, comparison entries) those
/// rows are written as the table; otherwise a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(value, stdout.lock()) {
        eprintln!("CSV output error: {}", e);
    }
}

fn write_csv<W: io::Write>(value: &Value, out: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(out);

    match result_of(value) {
        Value::Object(map) => {
            if let Some((_, rows)) = row_array(map) {
                let (headers, cells) = flatten_rows(rows);
                wtr.write_record(&headers)?;
                for row in cells {
                    wtr.write_record(&row)?;
                }
            } else {
                wtr.write_record(["field", "value"])?;
                for (key, val) in map {
                    wtr.write_record([key.as_str(), scalar_to_string(val).as_str()])?;
                }
            }
        }
        Value::Array(arr) => {
            let (headers, cells) = flatten_rows(arr);
            wtr.write_record(&headers)?;
            for row in cells {
                wtr.write_record(&row)?;
            }
        }
        other => wtr.write_record([scalar_to_string(other)])?,
    }

    wtr.flush()?;
    Ok(())
}
