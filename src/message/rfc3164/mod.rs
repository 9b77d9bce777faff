//! RFC 3164 ("BSD syslog") parsing plus the Cisco and Ciena dialect layers
//! built on top of it (`spec.md` §4.3-4.4).
//!
//! Unlike RFC 5424, RFC 3164 has no formally fixed grammar in the wild:
//! timestamps may be `Stamp` (`Jan _2 15:04:05`) or `RFC3339`-ish, hostnames
//! sometimes aren't hostnames at all (GNU `syslog()`'s trailing `:`, Ciena's
//! `[local]`/`[UTC]` pseudo-hostname, Telco's `%`-terminated hostname), and
//! malformed timestamps must not sink the whole record — the parser falls
//! back to "now" and keeps going.

pub mod cisco;
pub mod ciena;

use crate::clock::SharedClock;
use crate::error::{ParseError, TimestampError};
use crate::message::scan::parse_priority;
use crate::message::{CiscoMetadata, Client, LogParts, ParamMap, Priority, NO_VERSION};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

const STAMP_LEN: usize = "Jan _2 15:04:05".len();

/// Parses one RFC 3164 record (already split out of its transport framing
/// by the caller — RFC 3164 has no length-prefixed framing of its own).
pub fn parse(buf: &[u8], client: Client, clock: &SharedClock) -> (LogParts, Option<ParseError>) {
    let received = clock.now();
    let mut cursor = 0usize;

    let priority = match parse_priority(buf, &mut cursor) {
        Ok(p) => p,
        Err(e) => {
            // RFC 3164 sec 4.3.3: no priority at all, default and treat
            // the whole line as content.
            let mut parts = LogParts::empty(received);
            parts.priority = 13;
            parts.facility = Priority::default_3164().facility;
            parts.severity = Priority::default_3164().severity;
            parts.version = NO_VERSION;
            parts.timestamp = received.into();
            parts.message = trim_content(buf);
            parts.client = client;
            parts.source_type = "syslog".into();
            parts.valid = true;
            return (parts, Some(ParseError::from(e)));
        }
    };

    let tcursor = cursor;
    let mut cisco: Option<CiscoMetadata> = None;
    let seq_id = cisco::parse_cisco_sequence_id(buf, &mut cursor);

    let mut skip_tag = false;
    let mut ciena_meta = None;
    let mut source_type_override: Option<&'static str> = None;

    let header_result = if let Some(seq_id) = seq_id {
        let mut meta = CiscoMetadata { seq_id, ..Default::default() };
        let r = parse_cisco_header(buf, &mut cursor, clock, &mut meta, &mut skip_tag);
        cisco = Some(meta);
        r
    } else {
        parse_header(buf, &mut cursor, clock, &mut skip_tag, &mut ciena_meta, &mut source_type_override)
    };

    let (timestamp, hostname) = match header_result {
        Ok(v) => v,
        Err(TimestampError::UnknownFormat) | Err(TimestampError::InvalidTimeFormat) => {
            // RFC 3164 sec 4.3.2: invalid timestamp. Default to "now", skip
            // tag processing entirely, and throw away any Cisco metadata
            // since the message clearly isn't in the shape we guessed.
            skip_tag = true;
            cursor = tcursor;
            cisco = None;
            (received.into(), String::new())
        }
        Err(e) => {
            let mut parts = LogParts::empty(received);
            parts.client = client;
            parts.source_type = "syslog".into();
            return (parts, Some(ParseError::from(e)));
        }
    };

    if cursor < buf.len() && buf[cursor] == b' ' {
        cursor += 1;
    }

    let (tag, pid) = if !skip_tag {
        parse_tag(buf, &mut cursor)
    } else {
        (String::new(), String::new())
    };

    if let Some(meta) = cisco.as_mut() {
        cisco::parse_cisco_system_message(buf, &mut cursor, meta);
    }

    let content = trim_content(&buf[cursor.min(buf.len())..]);

    let mut parts = LogParts::empty(received);
    parts.priority = priority.value as i32;
    parts.facility = priority.facility;
    parts.severity = priority.severity;
    parts.version = NO_VERSION;
    parts.timestamp = timestamp;
    parts.hostname = hostname;
    parts.app_name = tag;
    parts.proc_id = pid;
    parts.message = content;
    parts.client = client;
    parts.valid = true;

    if let Some(meta) = cisco {
        parts.source_type = if meta.facility == "ASA" { "cisco:asa".into() } else { "cisco:ios".into() };
        let mut sd = crate::message::StructuredData::new();
        let mut time_quality = ParamMap::new();
        time_quality.insert("isSynced".into(), if meta.not_synced { "0".into() } else { "1".into() });
        sd.insert("timeQuality".into(), time_quality);
        if !meta.seq_id.is_empty() {
            let mut m = ParamMap::new();
            m.insert("sequenceId".into(), meta.seq_id.clone());
            sd.insert("meta".into(), m);
        }
        let mut syslog9 = ParamMap::new();
        syslog9.insert("facility".into(), meta.facility.clone());
        syslog9.insert("severity_id".into(), meta.severity_id.clone());
        syslog9.insert("mnemonic".into(), meta.mnemonic.clone());
        if !meta.category.is_empty() {
            syslog9.insert("category".into(), meta.category.clone());
        }
        if !meta.subfacility.is_empty() {
            syslog9.insert("subfacility".into(), meta.subfacility.clone());
        }
        if !meta.source.is_empty() {
            syslog9.insert("node_id".into(), meta.source.clone());
        }
        sd.insert("syslog@9".into(), syslog9);
        parts.structured_data = sd;
    } else if let Some(meta) = ciena_meta {
        parts.source_type = "ciena:saos".into();
        let mut sd = crate::message::StructuredData::new();
        let mut origin = ParamMap::new();
        origin.insert("ip".into(), meta.mgmt_ip);
        sd.insert("origin".into(), origin);
        let mut syslog6141 = ParamMap::new();
        syslog6141.insert("base_mac".into(), meta.base_mac);
        sd.insert("syslog@6141".into(), syslog6141);
        parts.structured_data = sd;
    } else if let Some(st) = source_type_override {
        parts.source_type = st.into();
    } else {
        parts.source_type = "syslog".into();
    }

    (parts, None)
}

fn parse_header(
    buf: &[u8],
    cursor: &mut usize,
    clock: &SharedClock,
    skip_tag: &mut bool,
    ciena_meta: &mut Option<crate::message::CienaMetadata>,
    source_type_override: &mut Option<&'static str>,
) -> Result<(DateTime<FixedOffset>, String), TimestampError> {
    let mut ts = parse_timestamp(buf, cursor, clock)?;
    let (mut hostname, ()) = parse_hostname_gnu(buf, cursor)?;

    if hostname == "[local]" || hostname == "[UTC]" {
        if hostname == "[UTC]" {
            let naive = ts.naive_local();
            ts = chrono::Utc.from_utc_datetime(&naive).fixed_offset();
        }
        if *cursor < buf.len() && buf[*cursor] == b' ' {
            *cursor += 1;
        }
        let (new_host, meta) =
            ciena::parse_ciena_hostname(buf, cursor).map_err(|_| TimestampError::InvalidTimeFormat)?;
        hostname = new_host;
        *ciena_meta = Some(meta);
        *skip_tag = true;
    } else if hostname.ends_with('%') {
        *source_type_override = Some("telco:binos");
        hostname.pop();
    }

    Ok((ts, hostname))
}

fn parse_cisco_header(
    buf: &[u8],
    cursor: &mut usize,
    clock: &SharedClock,
    meta: &mut CiscoMetadata,
    skip_tag: &mut bool,
) -> Result<(DateTime<FixedOffset>, String), TimestampError> {
    let (hostname, source) = cisco::parse_cisco_hostname_and_source(buf, cursor)?;
    let default_offset = FixedOffset::east_opt(0).unwrap();
    let ts = cisco::parse_cisco_timestamp(buf, cursor, default_offset, clock, meta)?;
    meta.source = source;

    let l = buf.len();
    if *cursor < l.saturating_sub(1) && buf[*cursor] == b' ' && buf[*cursor + 1] == b'%' {
        *skip_tag = true;
    }

    Ok((ts, hostname))
}

/// Wraps `scan::parse_hostname`, special-casing GNU `syslog()`'s habit of
/// emitting a trailing `:` instead of a real hostname, in which case the
/// token actually belongs to the tag and is given back to the caller.
fn parse_hostname_gnu(buf: &[u8], cursor: &mut usize) -> Result<(String, ()), TimestampError> {
    let oldcursor = *cursor;
    let hostname = crate::message::scan::parse_hostname(buf, cursor)
        .map_err(|_| TimestampError::InvalidTimeFormat)?;
    if hostname.ends_with(':') {
        *cursor = oldcursor.saturating_sub(1);
        return Ok((String::new(), ()));
    }
    Ok((hostname, ()))
}

/// `time.Stamp` (`Jan _2 15:04:05`) or a leading-digit `RFC3339`-ish
/// timestamp, tried in whichever order is more likely given the first
/// byte.
fn parse_timestamp(
    buf: &[u8],
    cursor: &mut usize,
    clock: &SharedClock,
) -> Result<DateTime<FixedOffset>, TimestampError> {
    let l = buf.len();
    if *cursor >= l {
        return Err(TimestampError::InvalidTimeFormat);
    }
    let leads_with_digit = buf[*cursor].is_ascii_digit();

    let attempts: [fn(&[u8], &mut usize, &SharedClock) -> Option<DateTime<FixedOffset>>; 2] = if leads_with_digit {
        [try_parse_rfc3339, try_parse_stamp]
    } else {
        [try_parse_stamp, try_parse_rfc3339]
    };

    for attempt in attempts {
        let mut c = *cursor;
        if let Some(ts) = attempt(buf, &mut c, clock) {
            *cursor = c;
            if *cursor < l && buf[*cursor] == b' ' {
                *cursor += 1;
            }
            return Ok(ts);
        }
    }

    *cursor = (*cursor + STAMP_LEN).min(l);
    if *cursor < l && buf[*cursor] == b' ' {
        *cursor += 1;
    }
    Err(TimestampError::UnknownFormat)
}

/// Fixed-width `Jan _2 15:04:05` (`time.Stamp`), parsed positionally since
/// it carries no year: `MMM SP (SP|DIGIT) DIGIT SP HH:MM:SS`.
fn try_parse_stamp(buf: &[u8], cursor: &mut usize, clock: &SharedClock) -> Option<DateTime<FixedOffset>> {
    let l = buf.len();
    if *cursor + STAMP_LEN > l {
        return None;
    }
    let s = &buf[*cursor..*cursor + STAMP_LEN];
    let month_str = std::str::from_utf8(&s[0..3]).ok()?;
    let month = month_name_to_number(month_str)?;
    if s[3] != b' ' || s[6] != b' ' || s[9] != b':' || s[12] != b':' {
        return None;
    }
    let day_hi = s[4];
    let day_lo = s[5];
    if !(day_hi == b' ' || day_hi.is_ascii_digit()) || !day_lo.is_ascii_digit() {
        return None;
    }
    let day: u32 = if day_hi == b' ' {
        (day_lo - b'0') as u32
    } else {
        (day_hi - b'0') as u32 * 10 + (day_lo - b'0') as u32
    };
    let hour = two_digit(s[7], s[8])?;
    let minute = two_digit(s[10], s[11])?;
    let second = two_digit(s[13], s[14])?;

    use chrono::Datelike;
    let year = clock.now().year();
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = chrono::NaiveTime::from_hms_opt(hour, minute, second)?;
    *cursor += STAMP_LEN;
    Some(FixedOffset::east_opt(0).unwrap().from_utc_datetime(&date.and_time(time)))
}

fn two_digit(hi: u8, lo: u8) -> Option<u32> {
    if !hi.is_ascii_digit() || !lo.is_ascii_digit() {
        return None;
    }
    Some((hi - b'0') as u32 * 10 + (lo - b'0') as u32)
}

fn month_name_to_number(s: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    MONTHS.iter().position(|&m| m == s).map(|i| i as u32 + 1)
}

fn try_parse_rfc3339(buf: &[u8], cursor: &mut usize, _clock: &SharedClock) -> Option<DateTime<FixedOffset>> {
    // RFC3339 is variable-length (fractional seconds, numeric offset), so
    // unlike Stamp we can't slice a fixed window: search for the first
    // space after the candidate run of timestamp characters.
    let l = buf.len();
    let from = *cursor;
    let mut to = from;
    while to < l && (buf[to].is_ascii_digit() || matches!(buf[to], b'-' | b':' | b'T' | b'Z' | b'+' | b'.')) {
        to += 1;
    }
    let text = std::str::from_utf8(&buf[from..to]).ok()?;
    let parsed = DateTime::parse_from_rfc3339(text).ok()?;
    *cursor = to;
    Some(parsed)
}

/// `TAG = 1*32PRINTUSASCII ":" | ALNUM`, possibly followed by `[PID]`. A
/// lone `%` also terminates the tag (Telco Systems BiNOS).
fn parse_tag(buf: &[u8], cursor: &mut usize) -> (String, String) {
    let l = buf.len();
    let from = *cursor;
    let mut tag_end = from;
    let mut found_bracket = false;
    let mut pid_from = 0usize;
    let mut pid_to = 0usize;

    loop {
        if *cursor == l {
            *cursor = from;
            return (String::new(), String::new());
        }
        let b = buf[*cursor];
        if b == b'[' {
            tag_end = *cursor;
            found_bracket = true;
            pid_from = *cursor + 1;
        }
        if b == b']' && pid_from != 0 {
            pid_to = *cursor;
        }
        let end_of_tag = b == b':' || b == b' ';
        if end_of_tag || (b == b'%' && *cursor > from) {
            if !found_bracket {
                tag_end = *cursor;
            }
            *cursor += 1;
            break;
        }
        *cursor += 1;
    }

    if *cursor < l && buf[*cursor] == b' ' {
        *cursor += 1;
    }

    let tag = String::from_utf8_lossy(&buf[from..tag_end]).into_owned();
    let pid = if pid_from == 0 {
        String::new()
    } else {
        String::from_utf8_lossy(&buf[pid_from..pid_to.max(pid_from)]).into_owned()
    };
    (tag, pid)
}

fn trim_content(buf: &[u8]) -> String {
    let trimmed = trim_bytes(buf, |b| b == b' ' || b == 0);
    String::from_utf8_lossy(trimmed).into_owned()
}

fn trim_bytes(buf: &[u8], is_trim: impl Fn(u8) -> bool) -> &[u8] {
    let start = buf.iter().position(|&b| !is_trim(b)).unwrap_or(buf.len());
    let end = buf.iter().rposition(|&b| !is_trim(b)).map(|i| i + 1).unwrap_or(0);
    if start >= end {
        &[]
    } else {
        &buf[start..end]
    }
}
