//! Tabular metadata store (CSV) reader and writer.
//!
//! The table is a header row plus one row per image. Two columns are
//! required:
//! - `image_id`: the image file name, joined against `Image.file_name`
//! - `fractured`: the positive-class flag (`1` marks a fractured image)
//!
//! Every other column is a pass-through feature column. Values are kept as
//! raw text, so a rewritten table reproduces the original cells byte for
//! byte and augmented rows copy their source row's cells verbatim.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::StringRecord;

use super::persist::write_atomic;
use crate::error::AugmentError;

/// Column holding the image file name.
pub const IMAGE_ID_COLUMN: &str = "image_id";

/// Column holding the positive-class flag.
pub const FRACTURED_COLUMN: &str = "fractured";

/// The tabular metadata store.
#[derive(Clone, Debug, PartialEq)]
pub struct TableStore {
    headers: StringRecord,
    rows: Vec<StringRecord>,
    image_id_col: usize,
    fractured_col: usize,
}

/// A fractured row selected as an augmentation source.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceRecord {
    /// Value of the `image_id` column.
    pub image_id: String,
    /// The full row, in header order.
    pub values: StringRecord,
}

impl TableStore {
    /// Builds a store from a header and rows, checking the required columns
    /// and row widths.
    pub fn new(
        headers: StringRecord,
        rows: Vec<StringRecord>,
        path: &Path,
    ) -> Result<Self, AugmentError> {
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| AugmentError::TableCsvInvalid {
                    path: path.to_path_buf(),
                    message: format!("missing required column '{}'", name),
                })
        };
        let image_id_col = column(IMAGE_ID_COLUMN)?;
        let fractured_col = column(FRACTURED_COLUMN)?;

        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != headers.len())
        {
            return Err(AugmentError::TableCsvInvalid {
                path: path.to_path_buf(),
                message: format!(
                    "row {} has {} field(s), header has {}",
                    i + 1,
                    row.len(),
                    headers.len()
                ),
            });
        }

        Ok(Self {
            headers,
            rows,
            image_id_col,
            fractured_col,
        })
    }

    /// Column names in file order.
    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Values of the `image_id` column, in file order.
    pub fn image_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(self.image_id_col).unwrap_or(""))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fractured rows, in file order.
    pub fn fractured_rows(&self) -> Vec<SourceRecord> {
        self.rows
            .iter()
            .filter(|row| is_positive_flag(row.get(self.fractured_col).unwrap_or("")))
            .map(|row| SourceRecord {
                image_id: row.get(self.image_id_col).unwrap_or("").to_string(),
                values: row.clone(),
            })
            .collect()
    }

    /// Number of fractured rows.
    pub fn fractured_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| is_positive_flag(row.get(self.fractured_col).unwrap_or("")))
            .count()
    }

    /// Returns a copy of `source` with its `image_id` cell replaced.
    pub fn with_image_id(&self, source: &SourceRecord, image_id: &str) -> StringRecord {
        source
            .values
            .iter()
            .enumerate()
            .map(|(i, value)| if i == self.image_id_col { image_id } else { value })
            .collect()
    }

    /// Appends a row. The row must match the header width.
    pub fn append(&mut self, row: StringRecord) -> Result<(), AugmentError> {
        if row.len() != self.headers.len() {
            return Err(AugmentError::TableCsvInvalid {
                path: Path::new("<memory>").to_path_buf(),
                message: format!(
                    "appended row has {} field(s), header has {}",
                    row.len(),
                    self.headers.len()
                ),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Drops every row whose `image_id` is in `image_ids`; returns how many
    /// rows were removed.
    pub fn remove_image_ids(&mut self, image_ids: &HashSet<String>) -> usize {
        let before = self.rows.len();
        let col = self.image_id_col;
        self.rows
            .retain(|row| !image_ids.contains(row.get(col).unwrap_or("")));
        before - self.rows.len()
    }

    /// Pairs each header with the matching value of `row`, for logging.
    pub fn labelled(&self, row: &StringRecord) -> Vec<(String, String)> {
        self.headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect()
    }
}

/// Returns true when a `fractured` cell marks a positive sample.
///
/// Accepts any numeric spelling of one (`1`, `1.0`, ` 1 `).
pub fn is_positive_flag(value: &str) -> bool {
    value.trim().parse::<f64>().map(|v| v == 1.0).unwrap_or(false)
}

// ============================================================================
// Public API
// ============================================================================

/// Reads the tabular store from a CSV file.
///
/// # Errors
/// Returns an error if the file cannot be read, is not valid CSV, lacks the
/// `image_id` or `fractured` column, or has ragged rows.
pub fn read_table_csv(path: &Path) -> Result<TableStore, AugmentError> {
    let file = File::open(path).map_err(AugmentError::Io)?;
    from_reader(BufReader::new(file), path)
}

/// Writes the full tabular store to `path`, replacing it atomically.
pub fn write_table_csv(path: &Path, table: &TableStore) -> Result<(), AugmentError> {
    write_atomic(path, |writer| {
        let mut csv_writer = csv::Writer::from_writer(writer);
        write_records(&mut csv_writer, table, path)?;
        csv_writer
            .flush()
            .map_err(AugmentError::Io)
    })
}

/// Reads the tabular store from a CSV string.
pub fn from_table_csv_str(csv_str: &str) -> Result<TableStore, AugmentError> {
    from_table_csv_slice(csv_str.as_bytes())
}

/// Reads the tabular store from CSV bytes.
///
/// Useful for fuzzing and processing raw bytes without requiring UTF-8 upfront.
pub fn from_table_csv_slice(bytes: &[u8]) -> Result<TableStore, AugmentError> {
    from_reader(bytes, Path::new("<bytes>"))
}

/// Writes the tabular store to a CSV string.
pub fn to_table_csv_string(table: &TableStore) -> Result<String, AugmentError> {
    let dummy_path = Path::new("<string>");
    let mut csv_writer = csv::Writer::from_writer(Vec::new());
    write_records(&mut csv_writer, table, dummy_path)?;

    let bytes = csv_writer
        .into_inner()
        .map_err(|e| AugmentError::Io(e.into_error()))?;

    String::from_utf8(bytes).map_err(|e| AugmentError::TableCsvInvalid {
        path: dummy_path.to_path_buf(),
        message: format!("Invalid UTF-8 in output: {}", e),
    })
}

fn from_reader<R: Read>(reader: R, path: &Path) -> Result<TableStore, AugmentError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let parse_err = |source| AugmentError::TableCsvParse {
        path: path.to_path_buf(),
        source,
    };

    let headers = csv_reader.headers().map_err(parse_err)?.clone();
    let mut rows = Vec::new();
    for result in csv_reader.records() {
        rows.push(result.map_err(parse_err)?);
    }

    TableStore::new(headers, rows, path)
}

fn write_records<W: std::io::Write>(
    csv_writer: &mut csv::Writer<W>,
    table: &TableStore,
    path: &Path,
) -> Result<(), AugmentError> {
    let write_err = |source| AugmentError::TableCsvWrite {
        path: path.to_path_buf(),
        source,
    };
    csv_writer.write_record(&table.headers).map_err(write_err)?;
    for row in &table.rows {
        csv_writer.write_record(row).map_err(write_err)?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
