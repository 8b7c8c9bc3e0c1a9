//! Spreadsheet-friendly CSV export of an amortization schedule.
//!
//! Layout: a `Summary` block of label/value pairs, one blank line, then the
//! schedule table with one row per month. Money is written with two decimals.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::FinBuddyError;
use crate::loan::amortization::LoanResult;
use crate::types::{round_money, Money};
use crate::FinBuddyResult;

/// Column headers of the schedule table, in output order.
pub const SCHEDULE_HEADERS: [&str; 6] = [
    "Month",
    "Interest",
    "Principal",
    "Extra Payment",
    "Total Payment",
    "Balance",
];

/// Write the summary block and schedule table to any writer.
pub fn write_schedule_csv<W: Write>(result: &LoanResult, mut out: W) -> FinBuddyResult<()> {
    {
        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(&mut out);
        wtr.write_record(["Summary"])?;
        wtr.write_record(["Loan Amount", money(result.loan_amount).as_str()])?;
        wtr.write_record([
            "Annual Rate (%)",
            result.annual_rate_pct.normalize().to_string().as_str(),
        ])?;
        wtr.write_record(["EMI", money(result.emi).as_str()])?;
        wtr.write_record(["Total Interest", money(result.total_interest).as_str()])?;
        wtr.write_record(["Total Payment", money(result.total_payment).as_str()])?;
        wtr.write_record(["Months Taken", result.months_taken.to_string().as_str()])?;
        wtr.flush().map_err(csv::Error::from)?;
    }

    out.write_all(b"\n").map_err(csv::Error::from)?;

    let mut wtr = csv::Writer::from_writer(&mut out);
    wtr.write_record(SCHEDULE_HEADERS)?;
    for row in &result.schedule {
        wtr.write_record([
            row.month.to_string(),
            money(row.interest),
            money(row.principal),
            money(row.extra_payment),
            money(row.total_payment),
            money(row.balance),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Render the export as a string.
pub fn schedule_to_csv_string(result: &LoanResult) -> FinBuddyResult<String> {
    let mut buf: Vec<u8> = Vec::new();
    write_schedule_csv(result, &mut buf)?;
    String::from_utf8(buf).map_err(|e| FinBuddyError::Csv(e.to_string()))
}

/// Export the schedule to `path`, replacing any existing file.
///
/// The CSV is written to a hidden sibling file and renamed over `path` only
/// once it is complete, so a failed export never leaves a truncated file at
/// the destination.
pub fn export_schedule_to_csv(result: &LoanResult, path: impl AsRef<Path>) -> FinBuddyResult<()> {
    let path = path.as_ref();
    let tmp = temp_path_for(path);

    if let Err(e) = write_to_file(result, path, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    if let Err(source) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(FinBuddyError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    log::debug!(
        "exported {} schedule rows to {}",
        result.schedule.len(),
        path.display()
    );
    Ok(())
}

fn write_to_file(result: &LoanResult, path: &Path, tmp: &Path) -> FinBuddyResult<()> {
    let io_err = |source| FinBuddyError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(tmp).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    write_schedule_csv(result, &mut writer)?;
    let file = writer.into_inner().map_err(|e| io_err(e.into_error()))?;
    file.sync_all().map_err(io_err)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "schedule.csv".into());
    path.with_file_name(format!(".{name}.tmp"))
}

fn money(value: Money) -> String {
    round_money(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::amortization::{generate_amortization_schedule, LoanRequest};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn zero_rate_result() -> LoanResult {
        generate_amortization_schedule(&LoanRequest {
            loan_amount: dec!(120000),
            annual_rate_pct: Decimal::ZERO,
            months: Some(12),
            ..Default::default()
        })
        .unwrap()
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "finbuddy-export-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_csv_layout() {
        let csv = schedule_to_csv_string(&zero_rate_result()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            &lines[..10],
            &[
                "Summary",
                "Loan Amount,120000.00",
                "Annual Rate (%),0",
                "EMI,10000.00",
                "Total Interest,0.00",
                "Total Payment,120000.00",
                "Months Taken,12",
                "",
                "Month,Interest,Principal,Extra Payment,Total Payment,Balance",
                "1,0.00,10000.00,0.00,10000.00,110000.00",
            ]
        );
        assert_eq!(lines.len(), 9 + 12);
        assert_eq!(lines[20], "12,0.00,10000.00,0.00,10000.00,0.00");
    }

    #[test]
    fn test_csv_rate_is_normalized() {
        let result = generate_amortization_schedule(&LoanRequest {
            loan_amount: dec!(500000),
            annual_rate_pct: dec!(8.50),
            years: Some(20),
            ..Default::default()
        })
        .unwrap();
        let csv = schedule_to_csv_string(&result).unwrap();
        assert!(csv.contains("Annual Rate (%),8.5\n"));
        assert!(csv.contains("EMI,4339.12\n"));
    }

    #[test]
    fn test_export_writes_and_overwrites() {
        let dir = scratch_dir("overwrite");
        let path = dir.join("schedule.csv");
        fs::write(&path, "stale content that is much longer than nothing").unwrap();

        let result = zero_rate_result();
        export_schedule_to_csv(&result, &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, schedule_to_csv_string(&result).unwrap());
        assert!(!temp_path_for(&path).exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = scratch_dir("missing");
        let path = dir.join("does-not-exist").join("schedule.csv");

        let err = export_schedule_to_csv(&zero_rate_result(), &path).unwrap_err();
        match err {
            FinBuddyError::Io { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!path.exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let tmp = temp_path_for(Path::new("/data/out/loan.csv"));
        assert_eq!(tmp, PathBuf::from("/data/out/.loan.csv.tmp"));
    }
}
