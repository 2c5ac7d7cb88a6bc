//! Certificate expiration date resolution.
//!
//! Expiration cells arrive as free text. Anything that cannot be read as a
//! calendar date is treated as expired.

use chrono::{NaiveDate, NaiveDateTime};

/// Format accepted after two-digit years have been expanded.
pub const EXPIRATION_FORMAT: &str = "%m/%d/%Y";

/// Two-digit years are read as 2000-2099.
const CENTURY: i32 = 2000;

/// Validity of one certificate relative to the processing time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Expires at or after `now`
    Valid(NaiveDate),
    /// Parsed, but before `now`
    Expired(NaiveDate),
    /// Could not be read as a date
    Unreadable,
}

impl Resolution {
    /// True only for [`Resolution::Valid`]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Parse raw expiration text into a date.
///
/// Eight-character `NN/NN/YY` values get their year expanded to 20YY. They
/// are read month-first; when the first field cannot be a month they are read
/// day-first instead. Everything else must be `MM/DD/YYYY`.
#[must_use]
pub fn parse_expiration(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();

    let short_year = text.chars().count() == 8
        && text.matches('/').count() == 2
        && text
            .rsplit('/')
            .next()
            .is_some_and(|year| year.len() == 2 && year.bytes().all(|b| b.is_ascii_digit()));
    if short_year {
        return parse_short_year(text);
    }

    NaiveDate::parse_from_str(text, EXPIRATION_FORMAT).ok()
}

fn parse_short_year(text: &str) -> Option<NaiveDate> {
    let mut parts = text.split('/');
    let first: u32 = parts.next()?.parse().ok()?;
    let second: u32 = parts.next()?.parse().ok()?;
    let year = CENTURY + parts.next()?.parse::<i32>().ok()?;

    let (month, day) = if first > 12 { (second, first) } else { (first, second) };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Classify a certificate's raw expiration against `now`.
///
/// The date is taken at midnight, and a certificate is valid when that
/// instant is at or after `now`.
#[must_use]
pub fn resolve(raw: Option<&str>, now: NaiveDateTime) -> Resolution {
    let Some(date) = raw.and_then(parse_expiration) else {
        return Resolution::Unreadable;
    };

    if date.and_hms_opt(0, 0, 0).is_some_and(|expires| expires >= now) {
        Resolution::Valid(date)
    } else {
        Resolution::Expired(date)
    }
}
