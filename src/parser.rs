//! CSV parser for AEMO aggregated price-and-demand files.

use chrono::NaiveDateTime;
use serde::Deserialize;
use std::path::Path;

use crate::error::PipelineError;

/// Columns the parser relies on. Any other column in the file is ignored.
pub const REQUIRED_COLUMNS: [&str; 5] =
    ["SETTLEMENTDATE", "REGION", "TOTALDEMAND", "RRP", "PERIODTYPE"];

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// One settlement-period row exactly as published.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub settlement_date: NaiveDateTime,
    pub region: String,
    pub total_demand: f64,
    pub rrp: f64,
    pub period_type: String,
}

#[derive(Deserialize)]
struct CsvRow {
    #[serde(rename = "SETTLEMENTDATE")]
    settlement_date: String,
    #[serde(rename = "REGION")]
    region: String,
    #[serde(rename = "TOTALDEMAND")]
    total_demand: f64,
    #[serde(rename = "RRP")]
    rrp: f64,
    #[serde(rename = "PERIODTYPE")]
    period_type: String,
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Parses CSV bytes into records, preserving file order.
///
/// # Errors
///
/// [`PipelineError::MissingColumns`] when the header lacks any of
/// [`REQUIRED_COLUMNS`], [`PipelineError::InvalidTimestamp`] for an
/// unrecognised `SETTLEMENTDATE`, and [`PipelineError::Csv`] for anything the
/// CSV reader rejects (ragged rows, non-numeric prices).
pub fn parse_records(bytes: &[u8]) -> Result<Vec<RawRecord>, PipelineError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = rdr.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns { missing });
    }

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row: CsvRow = record.deserialize(Some(&headers))?;
        let settlement_date = parse_timestamp(&row.settlement_date).ok_or_else(|| {
            PipelineError::InvalidTimestamp {
                line: record.position().map_or(0, |pos| line_of(bytes, pos.byte())),
                value: row.settlement_date.clone(),
            }
        })?;
        records.push(RawRecord {
            settlement_date,
            region: row.region,
            total_demand: row.total_demand,
            rrp: row.rrp,
            period_type: row.period_type,
        });
    }

    Ok(records)
}

/// 1-based line on which the record read from byte `offset` starts.
///
/// The reader hands out the offset just past the previous record's terminator,
/// so any line breaks that follow it (blank lines, the `\n` of a `\r\n`) are
/// skipped before counting.
fn line_of(bytes: &[u8], offset: u64) -> u64 {
    let start = (offset as usize).min(bytes.len());
    let skipped = bytes[start..]
        .iter()
        .take_while(|b| matches!(b, b'\r' | b'\n'))
        .count();
    let newlines = bytes[..start + skipped].iter().filter(|&&b| b == b'\n').count();
    newlines as u64 + 1
}

/// Reads and parses a CSV file from disk.
pub fn load_records(path: &Path) -> Result<Vec<RawRecord>, PipelineError> {
    let bytes = std::fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    parse_records(&bytes)
}
