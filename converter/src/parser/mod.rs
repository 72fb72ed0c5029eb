//! Bank statement reader with encoding and delimiter auto-detection.
//!
//! Turns raw file bytes into [`SourceRecord`]s keyed by header. No YNAB
//! specific logic here.

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::SourceRecord;

/// Delimiters offered for detection and re-parsing, in priority order.
pub const DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParsedCsv {
    /// One record per data row
    pub records: Vec<SourceRecord>,
    /// Column headers in file order
    pub headers: Vec<String>,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Detected encoding
    pub encoding: String,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown encodings and invalid UTF-8 fall back to lossy UTF-8. A leading
/// byte order mark is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// The most frequent candidate wins; ties keep the earlier one in
/// [`DELIMITERS`], and a line with none of them means comma.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = DELIMITERS[0];
    let mut best_count = 0;

    for &sep in &DELIMITERS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse decoded CSV text with an explicit delimiter.
///
/// The first row holds the headers (trimmed). Blank lines are skipped,
/// short rows are padded with empty cells and extra cells are ignored.
pub fn parse_str(content: &str, delimiter: char, encoding: impl Into<String>) -> CsvResult<ParsedCsv> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let delimiter_byte = u8::try_from(delimiter).map_err(|_| CsvError::ParseError {
        line: 1,
        message: format!("Unsupported delimiter '{}'", delimiter),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| to_parse_error(&e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| to_parse_error(&e))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let row: SourceRecord = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        records.push(row);
    }

    if records.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    Ok(ParsedCsv {
        records,
        headers,
        delimiter,
        encoding: encoding.into(),
    })
}

fn to_parse_error(err: &csv::Error) -> CsvError {
    let line = err.position().map_or(0, |p| p.line());
    CsvError::ParseError {
        line,
        message: err.to_string(),
    }
}

/// Parse CSV bytes with auto-detection of encoding and (optionally) delimiter.
pub fn parse_bytes(bytes: &[u8], delimiter: Option<char>) -> CsvResult<ParsedCsv> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));
    parse_str(&content, delimiter, encoding)
}

/// Parse a CSV file with auto-detection of encoding and (optionally) delimiter.
///
/// # Example
/// ```ignore
/// let parsed = parse_file("statement.csv", None)?;
/// println!("Encoding: {}, Delimiter: '{}'", parsed.encoding, parsed.delimiter);
/// println!("Records: {}", parsed.records.len());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P, delimiter: Option<char>) -> CsvResult<ParsedCsv> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes, delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let parsed = parse_str("Date;Amount\n2024-01-01;-3,50\n2024-01-02;10", ';', "utf-8").unwrap();

        assert_eq!(parsed.headers, vec!["Date", "Amount"]);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0]["Date"], "2024-01-01");
        assert_eq!(parsed.records[0]["Amount"], "-3,50");
        assert_eq!(parsed.records[1]["Amount"], "10");
    }

    #[test]
    fn test_quoted_values_keep_delimiters() {
        let csv = "Date,Payee,Amount\n01/15/2025,\"ACME, Inc.\",\"1,234.56\"";
        let parsed = parse_str(csv, ',', "utf-8").unwrap();

        assert_eq!(parsed.records[0]["Payee"], "ACME, Inc.");
        assert_eq!(parsed.records[0]["Amount"], "1,234.56");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let parsed = parse_str("a;b\n1;2\n\n;\n3;4\n", ';', "utf-8").unwrap();
        assert_eq!(parsed.records.len(), 2);
    }

    #[test]
    fn test_missing_and_extra_values() {
        let parsed = parse_str("a;b;c\n1;;3\n4\n5;6;7;8", ';', "utf-8").unwrap();

        assert_eq!(parsed.records[0]["b"], "");
        assert_eq!(parsed.records[1]["a"], "4");
        assert_eq!(parsed.records[1]["c"], "");
        assert_eq!(parsed.records[2].len(), 3);
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(matches!(parse_str("Date,Amount\n", ',', "utf-8"), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_str("", ',', "utf-8"), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes(b"Date;Amount\n2024-01-01;1,50", None).unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn test_delimiter_override() {
        let result = parse_bytes(b"Date;Amount,Note\n2024-01-01;1,50", Some(',')).unwrap();
        assert_eq!(result.headers, vec!["Date;Amount", "Note"]);
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"Date,Amount\n2024-01-01,5");
        let result = parse_bytes(&bytes, None).unwrap();
        assert_eq!(result.headers[0], "Date");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.csv");
        std::fs::write(&path, "Date,Description,Amount\n01/15/2025,COFFEE,-4.50\n").unwrap();

        let parsed = parse_file(&path, None).unwrap();
        assert_eq!(parsed.records[0]["Description"], "COFFEE");
        assert!(matches!(
            parse_file(dir.path().join("missing.csv"), None),
            Err(CsvError::IoError(_))
        ));
    }
}
