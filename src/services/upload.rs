// src/services/upload.rs
use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use log::info;
use regex::Regex;
use std::path::Path;

use crate::models::{CsvDelimiter, DateFormat};

pub const MIME_CSV: &str = "text/csv";
pub const MIME_XLS: &str = "application/vnd.ms-excel";
pub const MIME_XLSX: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xls,
    Xlsx,
}

impl FileKind {
    pub fn from_mime(mime: &str) -> Option<FileKind> {
        match mime {
            MIME_CSV => Some(FileKind::Csv),
            MIME_XLS => Some(FileKind::Xls),
            MIME_XLSX => Some(FileKind::Xlsx),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<FileKind> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(FileKind::Csv),
            "xls" => Some(FileKind::Xls),
            "xlsx" => Some(FileKind::Xlsx),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            FileKind::Csv => MIME_CSV,
            FileKind::Xls => MIME_XLS,
            FileKind::Xlsx => MIME_XLSX,
        }
    }
}

/// Raw upload blob as handed over by the upload widget. Content parsing is
/// the server's job; the client only checks the declared type and builds a
/// small preview for the data-summary display.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub kind: FileKind,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn from_parts(file_name: &str, mime: &str, bytes: Vec<u8>) -> Result<UploadedFile> {
        let kind = FileKind::from_mime(mime)
            .ok_or_else(|| anyhow!("Unsupported file type: {}", mime))?;
        Ok(UploadedFile {
            file_name: file_name.to_string(),
            kind,
            bytes,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<UploadedFile> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| anyhow!("File has no extension: {}", path.display()))?;
        let kind = FileKind::from_extension(ext)
            .ok_or_else(|| anyhow!("Unsupported file extension: .{}", ext))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let bytes = std::fs::read(path)?;
        info!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(UploadedFile {
            file_name,
            kind,
            bytes,
        })
    }

    fn first_line(&self) -> Option<&str> {
        let text = std::str::from_utf8(&self.bytes).ok()?;
        text.lines().next()
    }
}

/// Pick the most frequent candidate delimiter in the header line; comma when
/// none of them occurs at all.
pub fn detect_delimiter(first_line: &str) -> CsvDelimiter {
    let candidates = [
        (CsvDelimiter::Comma, ','),
        (CsvDelimiter::Tab, '\t'),
        (CsvDelimiter::Semicolon, ';'),
        (CsvDelimiter::Space, ' '),
    ];
    let (best, count) = candidates
        .iter()
        .map(|(delim, ch)| (*delim, first_line.matches(*ch).count()))
        .max_by_key(|(_, count)| *count)
        .unwrap_or((CsvDelimiter::Comma, 0));
    if count == 0 {
        CsvDelimiter::Comma
    } else {
        best
    }
}

impl CsvDelimiter {
    /// Concrete delimiter byte, sniffing the header line for `Auto`.
    pub fn resolve(&self, first_line: &str) -> u8 {
        let concrete = match self {
            CsvDelimiter::Auto => detect_delimiter(first_line),
            other => *other,
        };
        match concrete {
            CsvDelimiter::Comma | CsvDelimiter::Auto => b',',
            CsvDelimiter::Semicolon => b';',
            CsvDelimiter::Space => b' ',
            CsvDelimiter::Tab => b'\t',
        }
    }
}

/// Guess the date format of one sample value.
pub fn detect_date_format(sample: &str) -> Result<DateFormat> {
    let sample = sample.trim();
    if sample.contains('-') {
        return Ok(DateFormat::IsoDashed);
    }
    if sample.contains('.') {
        return Ok(DateFormat::DottedDmy);
    }
    if sample.contains('/') {
        let re = Regex::new(r"^(\d{1,4})/(\d{1,4})/(\d{1,4})$")?;
        let caps = re
            .captures(sample)
            .ok_or_else(|| anyhow!("Unknown date format: {}", sample))?;
        let day: u32 = caps[1].parse()?;
        let month: u32 = caps[2].parse()?;
        // A valid day/month reading means day-first, otherwise month-first
        if (1..=31).contains(&day) && (1..=12).contains(&month) {
            return Ok(DateFormat::SlashedDmy);
        }
        return Ok(DateFormat::SlashedMdy);
    }
    bail!("Unknown date format: {}", sample)
}

/// Head of an uploaded CSV plus what the sniffers made of it.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub delimiter: CsvDelimiter,
    pub date_format: Option<DateFormat>,
    /// First data-row date, when it parses under the detected format.
    pub first_date: Option<NaiveDate>,
}

/// First `limit` records of a CSV upload. Excel uploads yield an empty
/// preview since workbook parsing stays server-side.
pub fn preview(file: &UploadedFile, limit: usize) -> Result<UploadPreview> {
    if file.kind != FileKind::Csv {
        return Ok(UploadPreview {
            headers: Vec::new(),
            rows: Vec::new(),
            delimiter: CsvDelimiter::Auto,
            date_format: None,
            first_date: None,
        });
    }

    let first_line = file
        .first_line()
        .ok_or_else(|| anyhow!("Uploaded file is empty or not valid UTF-8"))?;
    let delimiter = detect_delimiter(first_line);
    let delimiter_byte = delimiter.resolve(first_line);

    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter_byte)
        .from_reader(file.bytes.as_slice());
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for record in rdr.records().take(limit) {
        let row = record?;
        rows.push(row.iter().map(|f| f.trim().to_string()).collect());
    }

    let first_cell = rows.first().and_then(|row: &Vec<String>| row.first());
    let date_format = first_cell.and_then(|cell| detect_date_format(cell).ok());
    let first_date = first_cell.zip(date_format.and_then(|f| f.strftime())).and_then(
        |(cell, pattern)| NaiveDate::parse_from_str(cell, pattern).ok(),
    );

    info!(
        "Upload preview for '{}': {} columns, {} rows shown",
        file.file_name,
        headers.len(),
        rows.len()
    );

    Ok(UploadPreview {
        headers,
        rows,
        delimiter,
        date_format,
        first_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_file(content: &str) -> UploadedFile {
        UploadedFile::from_parts("data.csv", MIME_CSV, content.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn mime_whitelist_rejects_anything_else() {
        assert!(UploadedFile::from_parts("a.csv", MIME_CSV, vec![]).is_ok());
        assert!(UploadedFile::from_parts("a.xls", MIME_XLS, vec![]).is_ok());
        assert!(UploadedFile::from_parts("a.xlsx", MIME_XLSX, vec![]).is_ok());
        assert!(UploadedFile::from_parts("a.txt", "text/plain", vec![]).is_err());
        assert!(UploadedFile::from_parts("a.json", "application/json", vec![]).is_err());
    }

    #[test]
    fn delimiter_detection_picks_most_frequent() {
        assert_eq!(detect_delimiter("date;value;extra"), CsvDelimiter::Semicolon);
        assert_eq!(detect_delimiter("date\tvalue"), CsvDelimiter::Tab);
        assert_eq!(detect_delimiter("date,value"), CsvDelimiter::Comma);
        assert_eq!(detect_delimiter("date value"), CsvDelimiter::Space);
        // no candidate present: fall back to comma
        assert_eq!(detect_delimiter("date|value"), CsvDelimiter::Comma);
    }

    #[test]
    fn date_format_detection_matches_converter_rules() {
        assert_eq!(detect_date_format("2021-05-13").unwrap(), DateFormat::IsoDashed);
        assert_eq!(detect_date_format("13.05.2021").unwrap(), DateFormat::DottedDmy);
        assert_eq!(detect_date_format("13/05/2021").unwrap(), DateFormat::SlashedDmy);
        assert_eq!(detect_date_format("2021/05/13").unwrap(), DateFormat::SlashedMdy);
        assert!(detect_date_format("May 13 2021").is_err());
        assert!(detect_date_format("13/05").is_err());
    }

    #[test]
    fn preview_reads_head_rows_with_detected_delimiter() {
        let file = csv_file("date;value\n2021-01-01;10.5\n2021-01-02;11.0\n2021-01-03;9.8\n");
        let preview = preview(&file, 2).unwrap();
        assert_eq!(preview.delimiter, CsvDelimiter::Semicolon);
        assert_eq!(preview.headers, vec!["date", "value"]);
        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.rows[0], vec!["2021-01-01", "10.5"]);
        assert_eq!(preview.date_format, Some(DateFormat::IsoDashed));
        assert_eq!(preview.first_date, NaiveDate::from_ymd_opt(2021, 1, 1));
    }

    #[test]
    fn preview_is_empty_for_excel_uploads() {
        let file = UploadedFile::from_parts("book.xlsx", MIME_XLSX, vec![0x50, 0x4b]).unwrap();
        let preview = preview(&file, 5).unwrap();
        assert!(preview.headers.is_empty());
        assert!(preview.rows.is_empty());
    }
}
