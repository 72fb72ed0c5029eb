//! YNAB import file writer.
//!
//! Header row plus one line per [`CanonicalRow`], every field quoted.

use chrono::NaiveDate;
use std::io::Write;

use crate::error::ExportResult;
use crate::models::CanonicalRow;

/// Write rows as a fully quoted CSV to `writer`.
pub fn write_ynab_csv<W: Write>(rows: &[CanonicalRow], writer: W) -> ExportResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);

    csv_writer.write_record(CanonicalRow::HEADERS)?;
    for row in rows {
        csv_writer.write_record(row.fields())?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Render rows as a fully quoted CSV string.
pub fn to_ynab_csv(rows: &[CanonicalRow]) -> ExportResult<String> {
    let mut buffer = Vec::new();
    write_ynab_csv(rows, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Suggested output file name, e.g. `ynab-import-2024-03-01.csv`.
pub fn default_file_name(today: NaiveDate) -> String {
    format!("ynab-import-{}.csv", today.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_fields_quoted() {
        let rows = vec![CanonicalRow {
            date: "2023-12-31".into(),
            payee: "Say \"Cheese\", Inc".into(),
            memo: String::new(),
            outflow: "12.50".into(),
            inflow: String::new(),
        }];

        let csv = to_ynab_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(r#""Date","Payee","Memo","Outflow","Inflow""#));
        assert_eq!(
            lines.next(),
            Some(r#""2023-12-31","Say ""Cheese"", Inc","","12.50","""#)
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_empty_rows_still_have_header() {
        let csv = to_ynab_csv(&[]).unwrap();
        assert_eq!(csv.trim_end(), r#""Date","Payee","Memo","Outflow","Inflow""#);
    }

    #[test]
    fn test_default_file_name() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(default_file_name(today), "ynab-import-2024-03-01.csv");
    }
}
