//! Sensor log line parser.
//!
//! Each record is one line of the form
//!
//! ```text
//! HH:MM:SS,<int>.<frac2>,<int>.<frac2>,<int>.<frac2>
//! ```
//!
//! with temperature, pressure and humidity in that order. Values are read as
//! fixed-point integers by dropping the decimal point, so exactly two
//! fractional digits are required: `"21.34"` becomes `2134`.

use thiserror::Error;

use crate::sensors::ChannelKind;
use crate::storage::Sample;

/// Number of value fields following the timestamp
const VALUE_FIELD_COUNT: usize = 3;

/// Number of fractional digits every value must carry
const FRACTION_DIGITS: usize = 2;

/// Reasons a log line is skipped
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineError {
    /// Line is not valid UTF-8
    #[error("line is not valid UTF-8")]
    NotUtf8,

    /// Timestamp is not `HH:MM:SS`
    #[error("malformed timestamp {0:?}")]
    BadTimestamp(String),

    /// Minute field outside 0..=59
    #[error("minute {0} out of range")]
    MinuteOutOfRange(u32),

    /// A comma-separated field is missing
    #[error("expected {expected} value fields, found {found}")]
    MissingField {
        /// Number of value fields required
        expected: usize,
        /// Number of value fields present
        found: usize,
    },

    /// A character outside digits and the separator set
    #[error("invalid character {ch:?} in {channel} field")]
    InvalidCharacter {
        /// The offending character
        ch: char,
        /// Field the character was found in
        channel: ChannelKind,
    },

    /// Value does not have exactly two fractional digits
    #[error("{channel} value {text:?} must have exactly two fractional digits")]
    BadFraction {
        /// Field that failed
        channel: ChannelKind,
        /// Raw field text
        text: String,
    },

    /// Value does not fit the fixed-point integer
    #[error("{channel} value overflows")]
    Overflow {
        /// Field that overflowed
        channel: ChannelKind,
    },
}

/// Minute-of-hour taken from the leading `HH:MM:SS` timestamp
pub fn parse_minute(line: &str) -> Result<u32, LineError> {
    let timestamp = line.split(',').next().unwrap_or_default();
    let bad = || LineError::BadTimestamp(timestamp.into());

    let mut parts = timestamp.split(':');
    let (Some(hour), Some(minute), Some(second), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(bad());
    };

    for part in [hour, minute, second] {
        if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
    }

    // At most two ASCII digits, cannot fail.
    let minute = minute.parse::<u32>().map_err(|_| bad())?;
    if minute > 59 {
        return Err(LineError::MinuteOutOfRange(minute));
    }
    Ok(minute)
}

/// Parse one fixed-point field such as `"990.12"` into `99012`
pub fn parse_fixed_point(text: &str, channel: ChannelKind) -> Result<u32, LineError> {
    if let Some(ch) = text.chars().find(|c| !c.is_ascii_digit() && *c != '.') {
        return Err(LineError::InvalidCharacter { ch, channel });
    }

    let bad_fraction = || LineError::BadFraction {
        channel,
        text: text.into(),
    };
    let (int_part, frac_part) = text.split_once('.').ok_or_else(bad_fraction)?;
    if int_part.is_empty() || frac_part.len() != FRACTION_DIGITS || frac_part.contains('.') {
        return Err(bad_fraction());
    }

    int_part
        .bytes()
        .chain(frac_part.bytes())
        .try_fold(0u32, |acc, digit| {
            acc.checked_mul(10)?.checked_add(u32::from(digit - b'0'))
        })
        .ok_or(LineError::Overflow { channel })
}

/// Parse the three value fields that follow the timestamp
pub fn parse_values(line: &str) -> Result<Sample, LineError> {
    let mut fields = line.split(',');
    // Timestamp was already validated by `parse_minute`
    fields.next();

    let values: heapless::Vec<&str, VALUE_FIELD_COUNT> = fields
        .by_ref()
        .take(VALUE_FIELD_COUNT)
        .collect();
    let extra = fields.count();
    if values.len() != VALUE_FIELD_COUNT || extra != 0 {
        return Err(LineError::MissingField {
            expected: VALUE_FIELD_COUNT,
            found: values.len() + extra,
        });
    }

    let mut parsed = [0u32; VALUE_FIELD_COUNT];
    for channel in ChannelKind::ALL {
        parsed[channel.index()] = parse_fixed_point(values[channel.index()], channel)?;
    }

    Ok(Sample::new(
        parsed[ChannelKind::Temperature.index()],
        parsed[ChannelKind::Pressure.index()],
        parsed[ChannelKind::Humidity.index()],
    ))
}

/// Parse a raw log line (with or without its line terminator).
///
/// Returns `Ok(None)` when the record is decimated away because its minute is
/// not a multiple of `interval_minutes`; such lines are not validated past the
/// timestamp.
pub fn parse_line(raw: &[u8], interval_minutes: u32) -> Result<Option<Sample>, LineError> {
    let line = core::str::from_utf8(raw).map_err(|_| LineError::NotUtf8)?;
    let line = line.trim_end_matches(['\n', '\r']);

    let minute = parse_minute(line)?;
    if minute % interval_minutes != 0 {
        return Ok(None);
    }

    parse_values(line).map(Some)
}
