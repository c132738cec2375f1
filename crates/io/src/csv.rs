// CSV import/export

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, warn};

use creddedupe_engine::normalize::normalize_header;
use creddedupe_engine::{ProviderAdapter, Record, Row};

use crate::error::IoError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parsed CSV: header row plus one map per data row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

pub fn read_csv(path: &Path) -> Result<CsvTable, IoError> {
    let content = read_file_as_utf8(path)?;
    let table = parse_csv(&content)?;
    debug!(path = %path.display(), columns = table.headers.len(), rows = table.rows.len(), "read csv");
    Ok(table)
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let read_err = |source| IoError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;
    Ok(decode_bytes(bytes))
}

/// UTF-8 with an optional byte-order mark; anything else is decoded as
/// Windows-1252.
pub fn decode_bytes(mut bytes: Vec<u8>) -> String {
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }
    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            warn!("input is not valid UTF-8; decoding as Windows-1252");
            let (decoded, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(&bytes);
            decoded.into_owned()
        }
    }
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Header line must split into >1 field to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: (number of lines with same field count as line 1) * field_count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Parse CSV text. The first record is the header row; short rows are
/// padded with empty values, extra cells beyond the header are dropped.
pub fn parse_csv(content: &str) -> Result<CsvTable, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(content))
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(first) => first?.iter().map(|h| h.trim().to_string()).collect(),
        None => return Err(IoError::NoHeaders),
    };
    if headers.iter().all(String::is_empty) {
        return Err(IoError::NoHeaders);
    }

    let mut rows = Vec::new();
    for result in records {
        let record = result?;
        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(col, header)| (header.clone(), record.get(col).unwrap_or("").to_string()))
            .collect();
        rows.push(row);
    }

    Ok(CsvTable { headers, rows })
}

/// Map each file header onto the adapter's spelling of the same column.
fn canonical_headers(headers: &[String], adapter: &dyn ProviderAdapter) -> HashMap<String, String> {
    let schema = adapter.header_schema();
    let known: HashMap<String, &'static str> = schema
        .required
        .iter()
        .chain(schema.optional)
        .chain(adapter.export_columns())
        .map(|name| (normalize_header(name), *name))
        .collect();

    headers
        .iter()
        .map(|h| {
            let canonical = known
                .get(&normalize_header(h))
                .map(|name| name.to_string())
                .unwrap_or_else(|| h.clone());
            (h.clone(), canonical)
        })
        .collect()
}

/// Build records from a parsed table with the chosen adapter.
///
/// Fails if any of the adapter's required columns is absent.
pub fn import_records(table: &CsvTable, adapter: &dyn ProviderAdapter) -> Result<Vec<Record>, IoError> {
    let missing = adapter.header_schema().missing_required(&table.headers);
    if !missing.is_empty() {
        return Err(IoError::MissingColumns {
            format: adapter.format(),
            missing,
        });
    }

    let rename = canonical_headers(&table.headers, adapter);
    let records: Vec<Record> = table
        .rows
        .iter()
        .map(|row| {
            let canonical: Row = row
                .iter()
                .map(|(k, v)| (rename.get(k).cloned().unwrap_or_else(|| k.clone()), v.clone()))
                .collect();
            adapter.import_row(&canonical)
        })
        .collect();

    debug!(format = %adapter.format(), records = records.len(), "imported records");
    Ok(records)
}

/// Write `records` in the adapter's export column order.
pub fn export_records<W: Write>(writer: W, records: &[Record], adapter: &dyn ProviderAdapter) -> Result<(), IoError> {
    let columns = adapter.export_columns();
    let mut writer = csv::WriterBuilder::new().from_writer(writer);
    writer.write_record(columns)?;

    for record in records {
        let row = adapter.export_row(record);
        let cells: Vec<&str> = columns
            .iter()
            .map(|col| row.get(*col).map(String::as_str).unwrap_or(""))
            .collect();
        writer.write_record(&cells)?;
    }

    writer.flush().map_err(|e| IoError::Csv(e.into()))?;
    Ok(())
}

pub fn write_records(path: &Path, records: &[Record], adapter: &dyn ProviderAdapter) -> Result<(), IoError> {
    let file = File::create(path).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    export_records(file, records, adapter)?;
    debug!(path = %path.display(), format = %adapter.format(), records = records.len(), "wrote csv");
    Ok(())
}
