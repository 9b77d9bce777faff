//! Cisco IOS/IOS-XE/IOS-XR/ASA dialect parsing layered on top of RFC 3164
//! (`spec.md` §4.3-4.4).

use crate::clock::SharedClock;
use crate::error::TimestampError;
use crate::message::scan::{find_next_space, is_all_digits, is_digit, parse_hostname};
use crate::message::CiscoMetadata;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone};

const SHORT_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn month_number(token: &str) -> Option<u32> {
    SHORT_MONTHS.iter().position(|&m| m == token).map(|i| i as u32 + 1)
}

/// `<seqnum>:` prefix, up to 10 digits. Returns `None` (and leaves the
/// cursor untouched) when the prefix isn't present, so the caller can fall
/// back to plain RFC 3164 parsing.
pub fn parse_cisco_sequence_id(buf: &[u8], cursor: &mut usize) -> Option<String> {
    let l = buf.len();
    let from = *cursor;
    let max = (from + 10).min(l);
    let mut to = from;
    if from + 10 > l {
        // Original bails out entirely if there isn't room for a full
        // 10-digit window to search in.
        return None;
    }
    while to < max {
        if !is_digit(buf[to]) {
            break;
        }
        to += 1;
    }
    if to >= l || buf[to] != b':' {
        return None;
    }
    if to == from {
        // Cisco ASA EMBLEM format: bare ':' with no digits, sequence ID 0.
        *cursor += 1;
        return Some("0".to_string());
    }
    let seq_id = String::from_utf8_lossy(&buf[from..to]).into_owned();
    if to + 1 >= l || buf[to + 1] == b' ' {
        *cursor = to + 2;
        return Some(seq_id);
    }
    None
}

/// Hostname token plus, for IOS XR, a `source:` token. Returns `None` for
/// both strings when the token looks like the start of a bare timestamp
/// instead (a short month, a 4-digit year, or a `.`/`*` not-synced marker),
/// in which case the cursor is rewound so timestamp parsing can retry it.
pub fn parse_cisco_hostname_and_source(
    buf: &[u8],
    cursor: &mut usize,
) -> Result<(String, String), TimestampError> {
    let oldcursor = *cursor;
    let hostname = parse_hostname(buf, cursor).map_err(|_| TimestampError::InvalidTimeFormat)?;

    if hostname.ends_with(':') {
        if *cursor < buf.len() && buf[*cursor] == b' ' {
            *cursor += 1;
        }
        return Ok((hostname[..hostname.len() - 1].to_string(), String::new()));
    }

    if hostname.starts_with('.') || hostname.starts_with('*') {
        *cursor = oldcursor;
        return Ok((String::new(), String::new()));
    }

    if month_number(&hostname).is_some() {
        *cursor = oldcursor;
        return Ok((String::new(), String::new()));
    }

    if hostname.len() == 4 && is_all_digits(hostname.as_bytes()) {
        *cursor = oldcursor;
        return Ok((String::new(), String::new()));
    }

    // IOS XR: hostname is followed by a `source:` or `source :` token.
    let l = buf.len();
    let from = *cursor + 1;
    let mut to = from;
    while to < l {
        if buf[to] == b' ' {
            if to == l - 1 || buf[to + 1] != b':' {
                break;
            }
            *cursor = to + 2;
            return Ok((hostname, String::from_utf8_lossy(&buf[from..to]).into_owned()));
        }
        if buf[to] == b':' {
            *cursor = to + 1;
            return Ok((hostname, String::from_utf8_lossy(&buf[from..to]).into_owned()));
        }
        to += 1;
    }

    Ok((hostname, String::new()))
}

struct FullDate {
    year: i32,
    month: u32,
    day: u32,
}

/// `Jan _2 | Jan 02 | Jan _2 2006 | Jan 02 2006 | 2006 Jan _2 | 2006 Jan 02`
fn parse_cisco_full_date(buf: &[u8], cursor: &mut usize) -> Result<FullDate, TimestampError> {
    let l = buf.len();
    let mut fd = FullDate { year: 0, month: 0, day: 0 };
    let mut found_year = false;

    let from = *cursor;
    let mut to = find_next_space(buf, from).ok_or(TimestampError::Eol)? - 1;
    let token = &buf[from..to];
    match token.len() {
        3 => {
            let s = std::str::from_utf8(token).map_err(|_| TimestampError::MonthInvalid)?;
            fd.month = month_number(s).ok_or(TimestampError::MonthInvalid)?;
        }
        4 => {
            if !is_all_digits(token) {
                return Err(TimestampError::YearInvalid);
            }
            fd.year = std::str::from_utf8(token).unwrap().parse().map_err(|_| TimestampError::YearInvalid)?;
            found_year = true;
        }
        _ => return Err(TimestampError::InvalidTimeFormat),
    }

    let mut from = to + 1;
    if !found_year && from < l.saturating_sub(1) && buf[from] == b' ' {
        from += 1;
    }

    to = find_next_space(buf, from).ok_or(TimestampError::Eol)? - 1;
    let token = &buf[from..to];
    match token.len() {
        1 | 2 => {
            if found_year {
                return Err(TimestampError::MonthInvalid);
            }
            if !is_all_digits(token) {
                return Err(TimestampError::DayInvalid);
            }
            fd.day = std::str::from_utf8(token).unwrap().parse().map_err(|_| TimestampError::DayInvalid)?;
        }
        3 => {
            if !found_year {
                return Err(TimestampError::DayInvalid);
            }
            let s = std::str::from_utf8(token).map_err(|_| TimestampError::MonthInvalid)?;
            fd.month = month_number(s).ok_or(TimestampError::MonthInvalid)?;
        }
        _ => return Err(TimestampError::InvalidTimeFormat),
    }

    from = to + 1;
    if !found_year && from + 1 >= l {
        *cursor = to;
        return Ok(fd);
    }
    if from + 3 > l {
        return Err(TimestampError::InvalidTimeFormat);
    }
    if found_year && from < l && buf[from] == b' ' {
        from += 1;
    }

    let to_opt = find_next_space(buf, from);
    let to = match to_opt {
        Some(t) => t - 1,
        None => {
            *cursor = from;
            return Ok(fd);
        }
    };
    let token = &buf[from..to];
    match token.len() {
        1 | 2 => {
            if !found_year {
                return Err(TimestampError::UnknownFormat);
            }
            if !is_all_digits(token) {
                return Err(TimestampError::UnknownFormat);
            }
            fd.day = std::str::from_utf8(token).unwrap().parse().map_err(|_| TimestampError::UnknownFormat)?;
        }
        4 => {
            if found_year {
                return Err(TimestampError::DayInvalid);
            }
            if !is_all_digits(token) {
                return Err(TimestampError::YearInvalid);
            }
            fd.year = std::str::from_utf8(token).unwrap().parse().map_err(|_| TimestampError::YearInvalid)?;
        }
        _ => {
            *cursor = from.saturating_sub(1);
            return Ok(fd);
        }
    }
    *cursor = to;
    Ok(fd)
}

struct PartialTime {
    hour: u32,
    minute: u32,
    second: u32,
    millis: u32,
}

fn parse_2_digit(buf: &[u8], cursor: &mut usize, min: i32, max: i32, err: TimestampError) -> Result<u32, TimestampError> {
    use crate::message::scan::parse_2_digits;
    parse_2_digits(buf, cursor, min, max).map(|v| v as u32).ok_or(err)
}

fn parse_cisco_partial_time(buf: &[u8], cursor: &mut usize) -> Result<PartialTime, TimestampError> {
    let l = buf.len();
    let hour = parse_2_digit(buf, cursor, 0, 23, TimestampError::HourInvalid)?;
    if *cursor >= l || buf[*cursor] != b':' {
        return Err(TimestampError::InvalidTimeFormat);
    }
    *cursor += 1;
    let minute = parse_2_digit(buf, cursor, 0, 59, TimestampError::MinuteInvalid)?;
    if *cursor >= l || buf[*cursor] != b':' {
        return Err(TimestampError::InvalidTimeFormat);
    }
    *cursor += 1;
    let second = parse_2_digit(buf, cursor, 0, 59, TimestampError::SecondInvalid)?;

    let mut millis = 0;
    if *cursor < l && buf[*cursor] == b'.' {
        *cursor += 1;
        let max = *cursor + 3;
        if max > l {
            return Err(TimestampError::SecFracInvalid);
        }
        let digits = &buf[*cursor..max];
        if !is_all_digits(digits) {
            return Err(TimestampError::SecFracInvalid);
        }
        millis = std::str::from_utf8(digits).unwrap().parse().unwrap();
        *cursor = max;
    }
    Ok(PartialTime { hour, minute, second, millis })
}

fn tz_abbrev_offset(abbrev: &str) -> FixedOffset {
    match abbrev {
        "UTC" | "GMT" | "Z" => FixedOffset::east_opt(0).unwrap(),
        "EST" => FixedOffset::west_opt(5 * 3600).unwrap(),
        "EDT" => FixedOffset::west_opt(4 * 3600).unwrap(),
        "CST" => FixedOffset::west_opt(6 * 3600).unwrap(),
        "CDT" => FixedOffset::west_opt(5 * 3600).unwrap(),
        "MST" => FixedOffset::west_opt(7 * 3600).unwrap(),
        "MDT" => FixedOffset::west_opt(6 * 3600).unwrap(),
        "PST" => FixedOffset::west_opt(8 * 3600).unwrap(),
        "PDT" => FixedOffset::west_opt(7 * 3600).unwrap(),
        _ => FixedOffset::east_opt(0).unwrap(),
    }
}

const MAX_TZ_LEN: usize = 5;

fn parse_cisco_full_time(
    buf: &[u8],
    cursor: &mut usize,
    default_offset: FixedOffset,
) -> Result<(PartialTime, FixedOffset), TimestampError> {
    let pt = parse_cisco_partial_time(buf, cursor)?;
    let l = buf.len();
    if *cursor >= l {
        return Ok((pt, default_offset));
    }
    if buf[*cursor] == b' ' {
        *cursor += 1;
        if *cursor >= l {
            return Ok((pt, default_offset));
        }
    }
    if buf[*cursor] == b':' {
        *cursor += 1;
        return Ok((pt, default_offset));
    }
    if !buf[*cursor].is_ascii_uppercase() {
        return Ok((pt, default_offset));
    }
    let from = *cursor;
    let max = (from + MAX_TZ_LEN).min(l);
    let mut to = from;
    while to < max {
        if buf[to] == b':' {
            break;
        }
        to += 1;
    }
    let abbrev = String::from_utf8_lossy(&buf[from..to]).into_owned();
    *cursor = to + 1;
    Ok((pt, tz_abbrev_offset(&abbrev)))
}

/// Parses the Cisco timestamp, which may be prefixed with `*` (clock never
/// set) or `.` (NTP not synced), and may omit the year (filled from `now`).
pub fn parse_cisco_timestamp(
    buf: &[u8],
    cursor: &mut usize,
    default_offset: FixedOffset,
    clock: &SharedClock,
    cisco: &mut CiscoMetadata,
) -> Result<DateTime<FixedOffset>, TimestampError> {
    let l = buf.len();
    if *cursor >= l {
        return Err(TimestampError::InvalidTimeFormat);
    }
    if buf[*cursor] == b'*' || buf[*cursor] == b'.' {
        cisco.not_synced = true;
        *cursor += 1;
    }

    let mut fd = parse_cisco_full_date(buf, cursor)?;

    if *cursor >= l || buf[*cursor] != b' ' {
        return Err(TimestampError::InvalidTimeFormat);
    }
    *cursor += 1;

    let (pt, offset) = parse_cisco_full_time(buf, cursor, default_offset)
        .map_err(|_| TimestampError::UnknownFormat)?;

    if fd.year == 0 {
        fd.year = clock.now().with_timezone(&offset).year();
    }

    let date = NaiveDate::from_ymd_opt(fd.year, fd.month, fd.day).ok_or(TimestampError::UnknownFormat)?;
    let time = NaiveTime::from_hms_milli_opt(pt.hour, pt.minute, pt.second, pt.millis)
        .ok_or(TimestampError::UnknownFormat)?;
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .ok_or(TimestampError::UnknownFormat)
}

fn find_next_hyphen(buf: &[u8], from: usize) -> Option<usize> {
    buf[from..].iter().position(|&c| c == b'-').map(|i| from + i + 1)
}

/// `%CATEGORY-FACILITY-SUBFACILITY-SEVERITY-MNEMONIC` system-message tag,
/// hyphen-delimited, with the category/subfacility fields optional
/// depending on the platform (IOS vs IOS-XR vs ASA).
pub fn parse_cisco_system_message(buf: &[u8], cursor: &mut usize, cisco: &mut CiscoMetadata) {
    let l = buf.len();
    if *cursor >= l || buf[*cursor] != b'%' {
        return;
    }
    let mut from = *cursor + 1;
    let mut to = match find_next_hyphen(buf, from) {
        Some(t) => t,
        None => return,
    };

    loop {
        if to == 0 {
            break;
        }
        let token = String::from_utf8_lossy(&buf[from..to - 1]).into_owned();
        from = to;
        if !cisco.source.is_empty() && cisco.category.is_empty() {
            cisco.category = token;
        } else if cisco.facility.is_empty() {
            cisco.facility = token;
        } else if cisco.severity_id.is_empty() {
            if token.len() == 1 && token.as_bytes()[0].is_ascii_digit() {
                cisco.severity_id = token;
                break;
            } else if cisco.subfacility.is_empty() {
                cisco.subfacility = token;
            } else {
                cisco.subfacility = format!("{}-{}", cisco.subfacility, token);
            }
        } else {
            break;
        }
        match find_next_hyphen(buf, from) {
            Some(t) => to = t,
            None => break,
        }
    }

    if to == 0 {
        return;
    }
    let mut end = from;
    while end < l {
        if buf[end] == b':' || buf[end] == b' ' {
            break;
        }
        end += 1;
    }
    cisco.mnemonic = String::from_utf8_lossy(&buf[from..end]).into_owned();
    *cursor = end;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::system_clock;

    #[test]
    fn sequence_id_parses_and_advances() {
        let mut c = 0;
        let buf = b"000123: host: msg";
        let id = parse_cisco_sequence_id(buf, &mut c).unwrap();
        assert_eq!(id, "000123");
    }

    #[test]
    fn sequence_id_absent_returns_none() {
        let mut c = 0;
        let buf = b"not a seq id";
        assert!(parse_cisco_sequence_id(buf, &mut c).is_none());
    }

    #[test]
    fn hostname_ios_xe_origin_id_strips_colon() {
        let mut c = 0;
        let buf = b"myrouter: *Mar  1 00:00:00.000: %SYS-5-CONFIG_I: msg";
        let (hostname, source) = parse_cisco_hostname_and_source(buf, &mut c).unwrap();
        assert_eq!(hostname, "myrouter");
        assert_eq!(source, "");
    }

    #[test]
    fn hostname_rewinds_on_bare_month_token() {
        let mut c = 0;
        let buf = b"Mar  1 00:00:00: msg";
        let (hostname, source) = parse_cisco_hostname_and_source(buf, &mut c).unwrap();
        assert_eq!(hostname, "");
        assert_eq!(source, "");
        assert_eq!(c, 0);
    }

    #[test]
    fn timestamp_fills_missing_year() {
        let mut c = 0;
        let buf = b"Mar  1 08:09:10: rest";
        let mut cisco = CiscoMetadata::default();
        let offset = FixedOffset::east_opt(0).unwrap();
        let ts = parse_cisco_timestamp(buf, &mut c, offset, &system_clock(), &mut cisco).unwrap();
        assert_eq!(ts.format("%m-%d %H:%M:%S").to_string(), "03-01 08:09:10");
    }

    #[test]
    fn system_message_splits_fields() {
        let mut c = 0;
        let buf = b"%SYS-5-CONFIG_I: Configured from console";
        let mut cisco = CiscoMetadata::default();
        parse_cisco_system_message(buf, &mut c, &mut cisco);
        assert_eq!(cisco.facility, "SYS");
        assert_eq!(cisco.severity_id, "5");
        assert_eq!(cisco.mnemonic, "CONFIG_I");
    }
}
