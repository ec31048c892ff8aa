//! Capture times in the archive's `YYYYMMDDhhmmss` form.

use std::{fmt, str::FromStr, time::SystemTime};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Format of [`Timestamp`]'s internal representation, for use with chrono's
/// `parse_from_str` and `format` functions.
pub const TIME_LAYOUT: &str = "%Y%m%d%H%M%S";

/// Number of digits in a full timestamp.
const WIDTH: usize = 14;

/// Number of leading digits (the year) that are never trimmed on display.
const YEAR_WIDTH: usize = 4;

#[derive(Clone, Copy, Debug)]
enum Layout {
    Format(&'static str),
    Rfc3339,
}

/// Date/time layouts tried, in order, when no explicit layout is given.
///
/// Zone abbreviations are skipped; the wall-clock fields are kept as written.
const LAYOUTS: &[(&str, Layout)] = &[
    ("ANSI C", Layout::Format("%a %b %e %H:%M:%S %Y")),
    ("Unix date", Layout::Format("%a %b %e %H:%M:%S %Z %Y")),
    ("Ruby date", Layout::Format("%a %b %d %H:%M:%S %z %Y")),
    ("RFC 822", Layout::Format("%d %b %y %H:%M %Z")),
    ("RFC 850", Layout::Format("%A, %d-%b-%y %H:%M:%S %Z")),
    ("RFC 1123", Layout::Format("%a, %d %b %Y %H:%M:%S %Z")),
    ("RFC 3339", Layout::Rfc3339),
];

/// A snapshot capture time in `YYYYMMDDhhmmss` form.
///
/// Values built by [`Timestamp::parse`] or from a time value always hold 14
/// digits. Values decoded from an API response are kept verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(String);

impl Timestamp {
    /// Parses `s` into a timestamp.
    ///
    /// With an explicit chrono `layout`, `s` must match it exactly. Without
    /// one (`None` or an empty string), `s` is first read as a non-negative
    /// integer and padded or truncated to 14 digits; otherwise the known
    /// date/time layouts are tried in order and the first match wins.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Layout`] if `s` does not match an explicit layout,
    /// and with [`Error::InvalidTimestamp`] if automatic detection finds no
    /// interpretation.
    pub fn parse(s: &str, layout: Option<&str>) -> Result<Self> {
        match layout.filter(|layout| !layout.is_empty()) {
            Some(layout) => parse_with_format(s, layout)
                .map(Self::from)
                .map_err(|source| Error::Layout {
                    input: s.to_owned(),
                    layout: layout.to_owned(),
                    source,
                }),
            None => Self::detect(s),
        }
    }

    fn detect(s: &str) -> Result<Self> {
        if let Some(n) = parse_digits(s) {
            return Ok(Self::from_number(n));
        }
        match detect_layout(s, LAYOUTS) {
            Some((name, time)) => {
                log::trace!("parsed {:?} as {}", s, name);
                Ok(Self::from(time))
            }
            None => Err(Error::InvalidTimestamp(s.to_owned())),
        }
    }

    fn from_number(n: u64) -> Self {
        Self(truncate_to_width(pad_to_width(n.to_string())))
    }

    /// Returns the timestamp of the wall-clock time of `t`, without converting
    /// it to another zone.
    pub fn from_time<Tz: TimeZone>(t: &DateTime<Tz>) -> Self {
        Self::from(t.naive_local())
    }

    /// Converts the timestamp to a UTC time value.
    ///
    /// A malformed timestamp, such as one decoded from a bad API response,
    /// yields the Unix epoch.
    #[must_use]
    pub fn to_time(&self) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(&self.0, TIME_LAYOUT)
            .map(|t| Utc.from_utc_datetime(&t))
            .unwrap_or_else(|_| DateTime::from(SystemTime::UNIX_EPOCH))
    }

    /// Returns the full, untrimmed representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Pads `digits` on the right with zeros: unset trailing fields (month, day,
/// ...) default to zero.
fn pad_to_width(digits: String) -> String {
    format!("{:0<width$}", digits, width = WIDTH)
}

/// Drops digits past the seconds field.
fn truncate_to_width(mut digits: String) -> String {
    digits.truncate(WIDTH);
    digits
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn detect_layout(
    s: &str,
    layouts: &[(&'static str, Layout)],
) -> Option<(&'static str, NaiveDateTime)> {
    layouts.iter().find_map(|(name, layout)| {
        let parsed = match layout {
            Layout::Format(format) => parse_with_format(s, format),
            Layout::Rfc3339 => DateTime::parse_from_rfc3339(s).map(|t| t.naive_local()),
        };
        parsed.ok().map(|time| (*name, time))
    })
}

/// Parses `s` with a chrono format, accepting date-only formats as midnight.
///
/// A leading weekday name must be well-formed but need not agree with the
/// date. Two-digit years of 69 and above are 19xx.
fn parse_with_format(s: &str, format: &str) -> chrono::ParseResult<NaiveDateTime> {
    let (s, format) = strip_weekday(s, format).unwrap_or((s, format));
    let time = NaiveDateTime::parse_from_str(s, format).or_else(|e| {
        NaiveDate::parse_from_str(s, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or(e)
    })?;
    if format.contains("%y") && time.year() == 2069 {
        return Ok(time.with_year(1969).unwrap_or(time));
    }
    Ok(time)
}

/// Drops a leading `%a`/`%A` field from `format` and the matching weekday name
/// from `s`.
fn strip_weekday<'a, 'b>(s: &'a str, format: &'b str) -> Option<(&'a str, &'b str)> {
    let is_long = if format.starts_with("%a") {
        false
    } else if format.starts_with("%A") {
        true
    } else {
        return None;
    };
    let name_len = s
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(s.len());
    let name = &s[..name_len];
    if (name_len > 3) != is_long || name.parse::<Weekday>().is_err() {
        return None;
    }
    Some((&s[name_len..], &format[2..]))
}

impl From<NaiveDateTime> for Timestamp {
    fn from(t: NaiveDateTime) -> Self {
        Self(t.format(TIME_LAYOUT).to_string())
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, None)
    }
}

/// Displays the timestamp without trailing zeros, keeping at least the year.
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year_end = self
            .0
            .char_indices()
            .nth(YEAR_WIDTH)
            .map_or(self.0.len(), |(i, _)| i);
        let end = self.0.trim_end_matches('0').len().max(year_end);
        f.write_str(&self.0[..end])
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self)
    }
}
