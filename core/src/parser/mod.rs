//! Observation loader with encoding and delimiter auto-detection.
//!
//! Turns the dataset's delimited text (header row first) into typed
//! [`Observation`]s. Coercion follows the dashboard's loading rules: empty
//! cells and `NA` are missing, measurement columns are floats, the year is an
//! integer, everything else stays text. Extra columns are ignored.

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::{CategoricalField, NumericField, Observation, RecordStore};

/// Result of loading with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Loaded observations
    pub records: RecordStore,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => String::from_utf8_lossy(bytes).into_owned(),
        },
        "iso-8859-1" | "latin-1" | "latin1" => {
            let (text, _, had_errors) = encoding_rs::ISO_8859_15.decode(bytes);
            if had_errors {
                return Err(CsvError::EncodingError(format!("invalid {} byte sequence", encoding)));
            }
            text.into_owned()
        }
        "windows-1252" | "cp1252" => {
            let (text, _, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
            if had_errors {
                return Err(CsvError::EncodingError(format!("invalid {} byte sequence", encoding)));
            }
            text.into_owned()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    // A UTF-8 BOM would otherwise end up in the first header name
    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Column positions of every declared field.
///
/// Resolution walks the categorical vocabulary, then the numeric one, and
/// reports the first declared field without a column.
struct ColumnIndex {
    categorical: Vec<(CategoricalField, usize)>,
    numeric: Vec<(NumericField, usize)>,
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> CsvResult<Self> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| CsvError::MissingColumn(name.to_string()))
        };

        let categorical = CategoricalField::ALL
            .into_iter()
            .map(|f| position(f.column()).map(|i| (f, i)))
            .collect::<CsvResult<Vec<_>>>()?;
        let numeric = NumericField::ALL
            .into_iter()
            .map(|f| position(f.column()).map(|i| (f, i)))
            .collect::<CsvResult<Vec<_>>>()?;

        Ok(Self { categorical, numeric })
    }
}

/// `None` for the missing markers, the trimmed cell otherwise.
fn present(cell: &str) -> Option<&str> {
    let cell = cell.trim();
    if cell.is_empty() || cell == "NA" {
        None
    } else {
        Some(cell)
    }
}

fn invalid(line: usize, column: &str, value: &str, message: &str) -> CsvError {
    CsvError::InvalidValue {
        line,
        column: column.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}

fn coerce_row(record: &csv::StringRecord, columns: &ColumnIndex, line: usize) -> CsvResult<Observation> {
    let mut obs = Observation::default();

    for &(field, idx) in &columns.categorical {
        let Some(cell) = present(record.get(idx).unwrap_or("")) else {
            continue;
        };
        if field == CategoricalField::Year {
            let year = cell
                .parse::<i32>()
                .map_err(|_| invalid(line, field.column(), cell, "expected an integer year"))?;
            obs.year = Some(year);
        } else {
            obs = obs.with_categorical(field, cell);
        }
    }

    for &(field, idx) in &columns.numeric {
        let Some(cell) = present(record.get(idx).unwrap_or("")) else {
            continue;
        };
        let value = cell
            .parse::<f64>()
            .map_err(|_| invalid(line, field.column(), cell, "expected a number"))?;
        obs = obs.with_numeric(field, value);
    }

    Ok(obs)
}

/// Parse decoded text with an explicit delimiter.
///
/// # Example
/// ```ignore
/// let result = parse_str(content, ',', "utf-8".into())?;
/// println!("{} observations", result.records.len());
/// ```
pub fn parse_str(content: &str, delimiter: char, encoding: String) -> CsvResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_matches('"').to_string())
        .collect();
    let columns = ColumnIndex::resolve(&headers)?;

    let mut records = Vec::new();
    for (row_idx, row) in reader.records().enumerate() {
        let row = row?;
        let line = row.position().map(|p| p.line() as usize).unwrap_or(row_idx + 2);
        records.push(coerce_row(&row, &columns, line)?);
    }

    Ok(ParseResult {
        records: RecordStore::new(records),
        encoding,
        delimiter,
        headers,
    })
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    parse_str(&content, delimiter, encoding)
}

/// Parse CSV bytes, forcing the delimiter when one is given.
pub fn parse_bytes(bytes: &[u8], delimiter: Option<char>) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));
    parse_str(&content, delimiter, encoding)
}

/// Load an observation file with auto-detection of encoding and delimiter.
///
/// # Example
/// ```ignore
/// let result = parse_csv_file_auto("data/palmerpenguins_extended.csv")?;
/// println!("Encoding: {}, Delimiter: '{}'", result.encoding, result.delimiter);
/// ```
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Load an observation file, forcing the delimiter when one is given.
pub fn parse_csv_file<P: AsRef<Path>>(path: P, delimiter: Option<char>) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes, delimiter)
}
