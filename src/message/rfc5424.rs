//! RFC 5424 structured syslog parsing (`spec.md` §4.2).
//!
//! `HEADER = PRI VERSION SP TIMESTAMP SP HOSTNAME SP APP-NAME SP PROCID SP
//! MSGID`, followed by `STRUCTURED-DATA` and an optional free-text `MSG`.

use crate::clock::SharedClock;
use crate::error::{HeaderError, ParseError, TimestampError};
use crate::message::scan::{
    is_digit, parse_hostname, parse_priority, parse_up_to_len, parse_version, NILVALUE,
};
use crate::message::structured_data::parse_structured_data;
use crate::message::{Client, LogParts, NO_VERSION};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// Parses one complete RFC 5424 record. `buf` must not include a trailing
/// octet-count or newline framing byte; the caller's transport/framing
/// layer is responsible for slicing a single record out of the stream.
pub fn parse(buf: &[u8], client: Client, clock: &SharedClock) -> (LogParts, Option<ParseError>) {
    let received = clock.now();
    let mut cursor = 0usize;
    let l = buf.len();

    let priority = match parse_priority(buf, &mut cursor) {
        Ok(p) => p,
        Err(e) => {
            let mut parts = LogParts::empty(received);
            parts.client = client;
            parts.source_type = "rfc5424_syslog".into();
            return (parts, Some(ParseError::from(e)));
        }
    };

    let version = parse_version(buf, &mut cursor);
    cursor += 1; // SP after VERSION

    let mut parts = LogParts::empty(received);
    parts.priority = priority.value as i32;
    parts.facility = priority.facility;
    parts.severity = priority.severity;
    parts.version = version;
    parts.client = client;
    parts.source_type = "rfc5424_syslog".into();

    macro_rules! bail {
        ($err:expr) => {{
            return (parts, Some(ParseError::from($err)));
        }};
    }

    let timestamp = match parse_timestamp(buf, &mut cursor, received) {
        Ok(ts) => ts,
        Err(e) => bail!(e),
    };
    parts.timestamp = timestamp;
    cursor += 1;

    let hostname = match parse_hostname(buf, &mut cursor) {
        Ok(h) => h,
        Err(e) => bail!(e),
    };
    parts.hostname = hostname;
    cursor += 1;

    let app_name = match parse_up_to_len(buf, &mut cursor, 48, HeaderError::InvalidAppName) {
        Ok(s) => s,
        Err(e) => bail!(e),
    };
    parts.app_name = app_name;
    cursor += 1;

    // proc_id/msg_id failures are tolerated by the original parser (it
    // swallows the error and keeps going with an empty field) rather than
    // aborting the whole record.
    if let Ok(proc_id) = parse_up_to_len(buf, &mut cursor, 128, HeaderError::InvalidProcId) {
        parts.proc_id = proc_id;
        cursor += 1;
    }
    if let Ok(msg_id) = parse_up_to_len(buf, &mut cursor, 32, HeaderError::InvalidMsgId) {
        parts.msg_id = msg_id;
        cursor += 1;
    }

    let sd = match parse_structured_data(buf, &mut cursor) {
        Ok(sd) => sd,
        Err(e) => bail!(e),
    };
    parts.structured_data = sd;
    cursor += 1;

    if cursor < l {
        parts.message = String::from_utf8_lossy(&buf[cursor..]).into_owned();
    }
    parts.valid = true;

    (parts, None)
}

fn parse_timestamp(
    buf: &[u8],
    cursor: &mut usize,
    received: DateTime<Utc>,
) -> Result<DateTime<FixedOffset>, TimestampError> {
    let l = buf.len();
    if *cursor >= l {
        return Err(TimestampError::InvalidTimeFormat);
    }
    if buf[*cursor] == NILVALUE {
        *cursor += 1;
        return Ok(received.into());
    }

    let (year, month, day) = parse_full_date(buf, cursor)?;

    if *cursor >= l || buf[*cursor] != b'T' {
        return Err(TimestampError::InvalidTimeFormat);
    }
    *cursor += 1;

    let (hour, minute, second, nanos, offset) = parse_full_time(buf, cursor)?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(TimestampError::UnknownFormat)?;
    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
        .ok_or(TimestampError::UnknownFormat)?;
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .ok_or(TimestampError::UnknownFormat)
}

fn parse_full_date(buf: &[u8], cursor: &mut usize) -> Result<(i32, u32, u32), TimestampError> {
    let l = buf.len();
    if *cursor + 4 > l {
        return Err(TimestampError::Eol);
    }
    let year_str = std::str::from_utf8(&buf[*cursor..*cursor + 4]).map_err(|_| TimestampError::YearInvalid)?;
    let year: i32 = year_str.parse().map_err(|_| TimestampError::YearInvalid)?;
    *cursor += 4;

    if *cursor >= l || buf[*cursor] != b'-' {
        return Err(TimestampError::UnknownFormat);
    }
    *cursor += 1;

    let month = parse_2_digit_checked(buf, cursor, 1, 12, TimestampError::MonthInvalid)?;

    if *cursor >= l || buf[*cursor] != b'-' {
        return Err(TimestampError::UnknownFormat);
    }
    *cursor += 1;

    let day = parse_2_digit_checked(buf, cursor, 1, 31, TimestampError::DayInvalid)?;

    Ok((year, month as u32, day as u32))
}

fn parse_2_digit_checked(
    buf: &[u8],
    cursor: &mut usize,
    min: i32,
    max: i32,
    err: TimestampError,
) -> Result<i32, TimestampError> {
    use crate::message::scan::parse_2_digits;
    parse_2_digits(buf, cursor, min, max).ok_or(err)
}

type FullTime = (u32, u32, u32, u32, FixedOffset);

fn parse_full_time(buf: &[u8], cursor: &mut usize) -> Result<FullTime, TimestampError> {
    let (hour, minute) = get_hour_minute(buf, cursor)?;

    let l = buf.len();
    if *cursor >= l || buf[*cursor] != b':' {
        return Err(TimestampError::InvalidTimeFormat);
    }
    *cursor += 1;

    let second = parse_2_digit_checked(buf, cursor, 0, 59, TimestampError::SecondInvalid)?;

    let mut nanos = 0u32;
    if *cursor < l && buf[*cursor] == b'.' {
        *cursor += 1;
        if let Ok(n) = parse_sec_frac(buf, cursor) {
            nanos = n;
        }
    }

    let offset = parse_time_offset(buf, cursor)?;

    Ok((hour as u32, minute as u32, second as u32, nanos, offset))
}

fn get_hour_minute(buf: &[u8], cursor: &mut usize) -> Result<(i32, i32), TimestampError> {
    let hour = parse_2_digit_checked(buf, cursor, 0, 23, TimestampError::HourInvalid)?;
    let l = buf.len();
    if *cursor >= l || buf[*cursor] != b':' {
        return Err(TimestampError::InvalidTimeFormat);
    }
    *cursor += 1;
    let minute = parse_2_digit_checked(buf, cursor, 0, 59, TimestampError::MinuteInvalid)?;
    Ok((hour, minute))
}

/// `TIME-SECFRAC = "." 1*6DIGIT`. On malformed input the caller treats this
/// as "no fraction" rather than aborting the whole timestamp, matching the
/// original parser's tolerant handling of a trailing garbage fraction.
fn parse_sec_frac(buf: &[u8], cursor: &mut usize) -> Result<u32, TimestampError> {
    let l = buf.len();
    let from = *cursor;
    let max = (from + 6).min(l);
    let mut to = from;
    while to < max && is_digit(buf[to]) {
        to += 1;
    }
    if to == from {
        return Err(TimestampError::SecFracInvalid);
    }
    let digits = std::str::from_utf8(&buf[from..to]).unwrap();
    // Pad/truncate to 9 digits (nanoseconds).
    let mut nine = String::with_capacity(9);
    nine.push_str(digits);
    while nine.len() < 9 {
        nine.push('0');
    }
    *cursor = to;
    nine[..9].parse::<u32>().map_err(|_| TimestampError::SecFracInvalid)
}

fn parse_time_offset(buf: &[u8], cursor: &mut usize) -> Result<FixedOffset, TimestampError> {
    let l = buf.len();
    if *cursor >= l || buf[*cursor] == b'Z' {
        *cursor += 1;
        return Ok(FixedOffset::east_opt(0).unwrap());
    }
    let sign = buf[*cursor];
    if sign != b'+' && sign != b'-' {
        return Err(TimestampError::TimeZoneInvalid);
    }
    *cursor += 1;
    let (hour, minute) = get_hour_minute(buf, cursor)?;
    let total_seconds = hour * 3600 + minute * 60;
    let offset = if sign == b'+' {
        FixedOffset::east_opt(total_seconds)
    } else {
        FixedOffset::west_opt(total_seconds)
    };
    offset.ok_or(TimestampError::TimeZoneInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{system_clock, FixedClock};
    use std::sync::Arc;

    fn clock() -> SharedClock {
        system_clock()
    }

    #[test]
    fn parses_rfc5424_example() {
        let line = br#"<34>1 2003-10-11T22:14:15.003Z mymachine.example.com su - ID47 - BOM'su root' failed for lonvick on /dev/pts/8"#;
        let (parts, err) = parse(line, Client::default(), &clock());
        assert!(err.is_none());
        assert_eq!(parts.priority, 34);
        assert_eq!(parts.version, 1);
        assert_eq!(parts.hostname, "mymachine.example.com");
        assert_eq!(parts.app_name, "su");
        assert_eq!(parts.proc_id, "-");
        assert_eq!(parts.msg_id, "ID47");
        assert!(parts.valid);
        assert_eq!(parts.timestamp.timestamp(), 1065906855);
    }

    #[test]
    fn parses_structured_data_and_message() {
        let line = br#"<165>1 2003-10-11T22:14:15.003Z mymachine.example.com evntslog - ID47 [exampleSDID@32473 iut="3" eventSource="App"] An application event log entry"#;
        let (parts, err) = parse(line, Client::default(), &clock());
        assert!(err.is_none());
        assert_eq!(
            parts.structured_data.get("exampleSDID@32473").unwrap().get("iut"),
            Some("3")
        );
        assert_eq!(parts.message, "An application event log entry");
    }

    #[test]
    fn nilvalue_timestamp_defaults_to_received() {
        let fixed = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        let c: SharedClock = Arc::new(FixedClock(fixed));
        let line = b"<34>1 - mymachine - - - -";
        let (parts, err) = parse(line, Client::default(), &c);
        assert!(err.is_none());
        assert_eq!(parts.timestamp.timestamp(), fixed.timestamp());
    }

    #[test]
    fn bad_priority_yields_partial_result_with_error() {
        let line = b"not a syslog line at all";
        let (parts, err) = parse(line, Client::default(), &clock());
        assert!(err.is_some());
        assert!(!parts.valid);
    }

    #[test]
    fn numeric_timezone_offset() {
        let line = br#"<34>1 2003-10-11T22:14:15-05:00 host app - - - msg"#;
        let (parts, err) = parse(line, Client::default(), &clock());
        assert!(err.is_none());
        assert_eq!(parts.timestamp.offset().local_minus_utc(), -5 * 3600);
    }
}
