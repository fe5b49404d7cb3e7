//! Date/time decoding for Avro logical types.
//!
//! Three independent entry points turn text into the integer encodings
//! Avro expects:
//!
//! | Function | Result |
//! |----------|--------|
//! | [`decode_date`] | days since 1970-01-01 |
//! | [`decode_time`] | microseconds since midnight (UTC-normalized) |
//! | [`decode_timestamp`] | microseconds since the Unix epoch |
//!
//! Each one tries a cascade of chrono patterns and returns `None` when
//! every strategy is exhausted; the caller decides whether that is fatal.
//! Embedded CR/LF characters are stripped before parsing. Zoned
//! date-times may carry a numeric offset or a trailing IANA zone name
//! (`2021-06-15 10:00:00 Europe/Paris`).

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::scalar::is_integer_literal;

/// `num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;
const NANOS_PER_DAY: i64 = 24 * 60 * 60 * 1_000_000_000;

/// Year-first date patterns: `-`, `/`, `.` and space separators, 2- and
/// 4-digit years, numeric or abbreviated month names. `%Y` also accepts
/// two digits, so the `%y` forms come first.
const DATE_FORMATS: &[&str] = &[
    "%y-%m-%d",
    "%y/%m/%d",
    "%y.%m.%d",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y %m %d",
    "%Y-%b-%d",
    "%Y/%b/%d",
    "%Y %b %d",
];

/// Zoned timestamp patterns tried after RFC 3339. `%#z` accepts `Z`,
/// `+HH:MM`, `+HHMM` and `+HH`.
const ZONED_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f %#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y/%m/%d %H:%M:%S%.f%#z",
    "%Y/%m/%d %H:%M:%S%.f %#z",
];

/// Zone-less timestamp patterns, interpreted as UTC.
const LOCAL_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S%.f",
    "%Y-%b-%d %H:%M:%S%.f",
];

/// Time-of-day patterns (offset handled separately).
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Zone names treated as UTC when they trail a timestamp. Anything else
/// is looked up in the IANA database.
const UTC_ZONE_NAMES: &[&str] = &["UTC", "GMT", "Z"];

/// Parses a date into days since the Unix epoch.
///
/// A full date-time is also accepted and truncated to its date. A zoned
/// date-time keeps its local date.
#[must_use]
pub fn decode_date(text: &str) -> Option<i32> {
    let text = clean_line_breaks(text);
    let text = text.trim();

    let date = parse_date(text)
        .or_else(|| parse_datetime_utc(text).map(|dt| dt.date()))
        .or_else(|| parse_zoned(text).map(|dt| dt.date_naive()))?;
    let days = i64::from(date.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE;
    i32::try_from(days).ok()
}

/// Parses a time of day into microseconds after midnight.
///
/// A time carrying an offset is normalized to UTC by subtracting the
/// offset and wrapping into `[0, 24h)`, so `02:00:00+03:00` yields
/// `23:00:00`. Falls back to an offset-less time, then to the time part
/// of a full date-time (local time for a zoned one), then to an
/// all-digit literal taken as microseconds.
#[must_use]
pub fn decode_time(text: &str) -> Option<i64> {
    let text = clean_line_breaks(text);
    let text = text.trim();

    if let Some((time, offset_secs)) = parse_offset_time(text) {
        let nanos = nano_of_day(time) - i64::from(offset_secs) * 1_000_000_000;
        return Some(nanos.rem_euclid(NANOS_PER_DAY) / 1_000);
    }
    if let Some(time) = parse_time(text) {
        return Some(nano_of_day(time) / 1_000);
    }
    if let Some(dt) = parse_datetime_utc(text) {
        return Some(nano_of_day(dt.time()) / 1_000);
    }
    if let Some(dt) = parse_zoned(text) {
        return Some(nano_of_day(dt.time()) / 1_000);
    }
    parse_integer_literal(text)
}

/// Parses a timestamp into microseconds since the Unix epoch.
///
/// Tries zoned forms first (the offset is applied to reach an absolute
/// instant), then zone-less forms interpreted as UTC, then an all-digit
/// literal returned unchanged. Sub-microsecond precision is truncated.
#[must_use]
pub fn decode_timestamp(text: &str) -> Option<i64> {
    let text = clean_line_breaks(text);
    let text = text.trim();

    if let Some(dt) = parse_zoned(text) {
        return Some(dt.timestamp_micros());
    }
    if let Some(ndt) = parse_datetime_utc(text) {
        return Some(ndt.and_utc().timestamp_micros());
    }
    parse_integer_literal(text)
}

/// Microseconds → milliseconds, rounding toward negative infinity so
/// pre-epoch instants stay on the correct side.
#[must_use]
pub fn micros_to_millis(micros: i64) -> i64 {
    micros.div_euclid(1_000)
}

fn clean_line_breaks(text: &str) -> String {
    text.replace(['\n', '\r'], "")
}

fn nano_of_day(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) * 1_000_000_000 + i64::from(time.nanosecond())
}

fn parse_integer_literal(text: &str) -> Option<i64> {
    if is_integer_literal(text) {
        text.parse().ok()
    } else {
        None
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Zoned forms, keeping the offset that was in effect.
fn parse_zoned(text: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    if let Some(dt) = ZONED_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
    {
        return Some(dt);
    }
    // Trailing zone name, e.g. "2021-06-15 10:00:00 UTC".
    let (head, zone) = text.rsplit_once(' ')?;
    let local = parse_local_datetime(head.trim_end())?;
    if UTC_ZONE_NAMES.iter().any(|z| z.eq_ignore_ascii_case(zone)) {
        return Some(local.and_utc().fixed_offset());
    }
    // Gaps and overlaps in a DST transition resolve to the earlier instant.
    let tz: Tz = zone.parse().ok()?;
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

fn parse_local_datetime(text: &str) -> Option<NaiveDateTime> {
    LOCAL_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Zone-less date-time, or a bare date at midnight.
fn parse_datetime_utc(text: &str) -> Option<NaiveDateTime> {
    parse_local_datetime(text).or_else(|| parse_date(text).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
}

/// Splits `HH:MM[:SS[.f]]<offset>` into the local time and the offset in
/// seconds east of UTC. Returns `None` when no offset is present.
fn parse_offset_time(text: &str) -> Option<(NaiveTime, i32)> {
    if let Some(head) = text.strip_suffix(['Z', 'z']) {
        return parse_time(head.trim_end()).map(|t| (t, 0));
    }
    let idx = text.rfind(['+', '-'])?;
    if idx == 0 {
        return None;
    }
    let (head, offset) = text.split_at(idx);
    let time = parse_time(head.trim_end())?;
    Some((time, parse_offset(offset)?))
}

/// Parses `+HH`, `+HHMM` or `+HH:MM` (and the `-` forms) into seconds.
fn parse_offset(text: &str) -> Option<i32> {
    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 18 || minutes > 59 {
        return None;
    }
    Some(sign * (hours * 3_600 + minutes * 60))
}
