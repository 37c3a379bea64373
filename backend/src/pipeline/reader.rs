//! Decodes an uploaded spreadsheet into a header row and untyped rows.

use crate::error::UploadError;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

/// An untyped cell as it came out of the file.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl RawCell {
    /// Blank text counts as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    fn header_text(&self) -> String {
        match self {
            RawCell::Empty => String::new(),
            RawCell::Text(s) => s.trim().to_string(),
            RawCell::Number(n) => n.to_string(),
            RawCell::Bool(b) => b.to_string(),
        }
    }
}

impl From<&Data> for RawCell {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::String(s) => RawCell::Text(s.clone()),
            Data::Float(f) => RawCell::Number(*f),
            Data::Int(i) => RawCell::Number(*i as f64),
            Data::Bool(b) => RawCell::Bool(*b),
            Data::DateTime(dt) => RawCell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
            _ => RawCell::Empty,
        }
    }
}

/// One data row, padded to the header width.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based sheet row; the header is row 1.
    pub number: usize,
    pub cells: Vec<RawCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SheetFormat {
    Workbook,
    Csv,
}

impl SheetFormat {
    fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.to_lowercase();
        if [".xlsx", ".xls", ".xlsm", ".xlsb", ".ods"]
            .iter()
            .any(|ext| lower.ends_with(ext))
        {
            Some(SheetFormat::Workbook)
        } else if lower.ends_with(".csv") {
            Some(SheetFormat::Csv)
        } else {
            None
        }
    }
}

pub fn read_sheet(file_name: &str, bytes: &[u8]) -> Result<RawSheet, UploadError> {
    let format = SheetFormat::from_file_name(file_name)
        .ok_or_else(|| UploadError::UnsupportedFormat(file_name.to_string()))?;

    let mut rows = match format {
        SheetFormat::Workbook => read_workbook(bytes)?,
        SheetFormat::Csv => read_csv(bytes)?,
    };

    if rows.is_empty() {
        return Err(UploadError::EmptyFile);
    }
    let (_, header_cells) = rows.remove(0);
    let headers: Vec<String> = header_cells.iter().map(RawCell::header_text).collect();
    let width = headers.len();

    let rows: Vec<RawRow> = rows
        .into_iter()
        .filter(|(_, cells)| !cells.iter().all(RawCell::is_empty))
        .map(|(number, mut cells)| {
            if cells.len() < width {
                cells.resize(width, RawCell::Empty);
            }
            RawRow { number, cells }
        })
        .collect();

    if rows.is_empty() {
        return Err(UploadError::EmptyFile);
    }

    Ok(RawSheet { headers, rows })
}

/// Sheet rows paired with their 1-based row number.
type NumberedRows = Vec<(usize, Vec<RawCell>)>;

/// Reads the first worksheet only.
fn read_workbook(bytes: &[u8]) -> Result<NumberedRows, UploadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(UploadError::EmptyFile)?;
    let range = workbook.worksheet_range(&sheet_name)?;
    // the range starts at the first used cell, not at A1
    let first_row = range.start().map_or(0, |(row, _)| row as usize);

    Ok(range
        .rows()
        .enumerate()
        .map(|(idx, row)| (first_row + idx + 1, row.iter().map(RawCell::from).collect()))
        .collect())
}

/// Picks the most frequent of `,` `;` tab `|` in the header line.
fn detect_delimiter(header_line: &str) -> u8 {
    [b',', b';', b'\t', b'|']
        .into_iter()
        .rev()
        .max_by_key(|&d| header_line.bytes().filter(|&b| b == d).count())
        .filter(|&d| header_line.as_bytes().contains(&d))
        .unwrap_or(b',')
}

fn read_csv(bytes: &[u8]) -> Result<NumberedRows, UploadError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| UploadError::Unreadable("file is not valid UTF-8".to_string()))?;
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let header_line = text.lines().next().unwrap_or_default();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(detect_delimiter(header_line))
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(rows.len() + 1, |pos| pos.line() as usize);
        rows.push((
            line,
            record
                .iter()
                .map(|cell| {
                    let cell = cell.replace('\u{00A0}', " ");
                    if cell.trim().is_empty() {
                        RawCell::Empty
                    } else {
                        RawCell::Text(cell)
                    }
                })
                .collect(),
        ));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_are_padded_and_blank_rows_skipped() {
        let csv = "sai_connect_id,full_name,age\n123,Ravi Kumar,34\n\n,,\n654321,Sita\n";
        let sheet = read_sheet("volunteers.csv", csv.as_bytes()).unwrap();

        assert_eq!(sheet.headers, vec!["sai_connect_id", "full_name", "age"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].number, 2);
        assert_eq!(sheet.rows[1].number, 5);
        assert_eq!(
            sheet.rows[1].cells,
            vec![
                RawCell::Text("654321".into()),
                RawCell::Text("Sita".into()),
                RawCell::Empty
            ]
        );
    }

    #[test]
    fn semicolon_delimiter_is_detected() {
        let csv = "\u{FEFF}Name;SAI Connect ID\nRavi, Jr.;000123\n";
        let sheet = read_sheet("export.CSV", csv.as_bytes()).unwrap();
        assert_eq!(sheet.headers, vec!["Name", "SAI Connect ID"]);
        assert_eq!(sheet.rows[0].cells[0], RawCell::Text("Ravi, Jr.".into()));
    }

    #[test]
    fn header_only_file_is_empty() {
        let err = read_sheet("empty.csv", b"full_name,sai_connect_id\n").unwrap_err();
        assert!(matches!(err, UploadError::EmptyFile));
        assert!(matches!(read_sheet("nothing.csv", b"").unwrap_err(), UploadError::EmptyFile));
    }

    #[test]
    fn unknown_extension_is_refused_before_decoding() {
        let err = read_sheet("volunteers.pdf", b"%PDF").unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedFormat(name) if name == "volunteers.pdf"));
    }

    #[test]
    fn corrupt_workbook_is_unreadable() {
        let err = read_sheet("volunteers.xlsx", b"definitely not a zip").unwrap_err();
        assert!(matches!(err, UploadError::Unreadable(_)));
    }

    #[test]
    fn workbook_cells_convert_to_raw_cells() {
        assert_eq!(RawCell::from(&Data::Int(123)), RawCell::Number(123.0));
        assert_eq!(RawCell::from(&Data::Float(45123.0)), RawCell::Number(45123.0));
        assert_eq!(RawCell::from(&Data::String("yes".into())), RawCell::Text("yes".into()));
        assert_eq!(RawCell::from(&Data::Bool(true)), RawCell::Bool(true));
        assert_eq!(RawCell::from(&Data::Empty), RawCell::Empty);
    }
}
