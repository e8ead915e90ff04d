//! Rowing clock times in `m:ss.f` notation.
//!
//! Seed times, finish times and average paces are all written by people and
//! by the venue hardware as minutes and decimal seconds separated by a colon
//! (`7:31.4`). A token without a colon is read as seconds alone.

use std::time::Duration;

use thiserror::Error;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// A token that is not a valid clock time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid clock time {token:?}")]
pub struct ClockError {
    pub token: String,
}

/// Parses `m:ss.f` (or plain decimal seconds) into a duration.
///
/// The first colon marks the end of the minutes component; everything after
/// it is decimal seconds. Both components accept a fractional part.
pub fn parse_clock(token: &str) -> Result<Duration, ClockError> {
    let invalid = || ClockError {
        token: token.to_string(),
    };

    let (minutes, seconds) = match token.split_once(':') {
        Some((minutes, seconds)) => (Some(minutes), seconds),
        None => (None, token),
    };

    let mut nanos = parse_decimal(seconds, NANOS_PER_SEC).ok_or_else(invalid)?;
    if let Some(minutes) = minutes {
        nanos += parse_decimal(minutes, 60 * NANOS_PER_SEC).ok_or_else(invalid)?;
    }

    let secs = u64::try_from(nanos / NANOS_PER_SEC).map_err(|_| invalid())?;
    // Remainder is always below one second.
    #[expect(clippy::cast_possible_truncation, reason = "remainder < 1e9")]
    let subsec = (nanos % NANOS_PER_SEC) as u32;
    Ok(Duration::new(secs, subsec))
}

/// Parses an unsigned decimal number scaled by `unit` nanoseconds.
fn parse_decimal(s: &str, unit: u128) -> Option<u128> {
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole_value: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };
    let mut total = whole_value.checked_mul(unit)?;

    // Digits past nanosecond precision are dropped.
    let mut scale = unit;
    for digit in frac.bytes().take(18) {
        scale /= 10;
        if scale == 0 {
            break;
        }
        total = total.checked_add(u128::from(digit - b'0') * scale)?;
    }
    Some(total)
}

/// Formats a duration as `m:ss.f`, rounded to the nearest tenth of a second.
#[must_use]
pub fn format_clock(duration: Duration) -> String {
    let tenths = (duration.as_millis() + 50) / 100;
    let minutes = tenths / 600;
    let rem = tenths % 600;
    format!("{minutes}:{:02}.{}", rem / 10, rem % 10)
}
