//! Finish-results file reader.
//!
//! The venue hardware writes one results file per race:
//!
//! ```text
//! Race Results
//! 103
//!
//! Place,Time Rowed,Meters Rowed,Boat/Team Name,Avg. Pace,Total Strokes,Bib Number,Class
//! 1,7:31.4,2000,Test, 1:52.8,200,5,
//! ```
//!
//! Data rows start on line 5 and run until the first blank line or the end
//! of the file. Any bad row fails the whole file.

use std::io::{self, BufRead};
use std::time::Duration;

use thiserror::Error;

use crate::clock::{ClockError, parse_clock};
use crate::model::RaceResult;

/// First line of every results file.
pub const SIGNATURE: &str = "Race Results";

/// The only results format version understood.
pub const VERSION: &str = "103";

/// Number of comma-separated fields in a data row.
pub const FIELD_COUNT: usize = 8;

/// Line number of the first data row.
const FIRST_DATA_LINE: usize = 5;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid or corrupted race results (first line {found:?})")]
    InvalidSignature { found: String },

    #[error("found version {found:?} results, only version {VERSION} is supported")]
    UnsupportedVersion { found: String },

    #[error("line {line}: expected {FIELD_COUNT} fields, found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("line {line}: invalid {field} {value:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: invalid {field}")]
    InvalidTime {
        line: usize,
        field: &'static str,
        #[source]
        source: ClockError,
    },

    #[error("failed to read results")]
    Io(#[from] io::Error),
}

impl DecodeError {
    /// The 1-based source line the error refers to, for row errors.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::FieldCount { line, .. }
            | Self::InvalidNumber { line, .. }
            | Self::InvalidTime { line, .. } => Some(*line),
            Self::InvalidSignature { .. } | Self::UnsupportedVersion { .. } | Self::Io(_) => None,
        }
    }
}

/// Reads every result row from `reader`.
///
/// Nothing is returned unless the whole file decodes.
pub fn decode_results<R: BufRead>(reader: R) -> Result<Vec<RaceResult>, DecodeError> {
    let mut lines = reader.lines();

    let signature = lines.next().transpose()?.unwrap_or_default();
    if signature != SIGNATURE {
        return Err(DecodeError::InvalidSignature { found: signature });
    }

    let version = lines.next().transpose()?.unwrap_or_default();
    if version != VERSION {
        return Err(DecodeError::UnsupportedVersion { found: version });
    }

    // blank line, column headers
    for _ in 0..2 {
        if lines.next().transpose()?.is_none() {
            return Ok(Vec::new());
        }
    }

    let mut results = Vec::new();
    for (line_number, line) in (FIRST_DATA_LINE..).zip(lines) {
        let line = line?;
        if line.is_empty() {
            break;
        }
        results.push(decode_row(&line, line_number)?);
    }
    Ok(results)
}

/// Decodes one data row.
fn decode_row(row: &str, line: usize) -> Result<RaceResult, DecodeError> {
    let fields: Vec<&str> = row.split(',').collect();
    if fields.len() != FIELD_COUNT {
        return Err(DecodeError::FieldCount {
            line,
            found: fields.len(),
        });
    }

    let time = parse_time(fields[1], line, "race time")?;

    let pace = fields[4].trim();
    let avg_pace = if pace.is_empty() {
        Duration::ZERO
    } else {
        parse_time(pace, line, "average pace")?
    };

    Ok(RaceResult {
        place: parse_number(fields[0], line, "finish place")?,
        time,
        avg_pace,
        distance: parse_number(fields[2], line, "race distance")?,
        name: fields[3].to_string(),
        bib: parse_number(fields[6], line, "bib number")?,
        class: fields[7].to_string(),
    })
}

fn parse_time(token: &str, line: usize, field: &'static str) -> Result<Duration, DecodeError> {
    parse_clock(token).map_err(|source| DecodeError::InvalidTime {
        line,
        field,
        source,
    })
}

fn parse_number(value: &str, line: usize, field: &'static str) -> Result<u32, DecodeError> {
    value.parse().map_err(|_| DecodeError::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    })
}
