//! Byte-level primitive scanners shared by the RFC 5424 and RFC 3164
//! parsers: priority, version, fixed-width digit fields, hostname, and
//! space search. Each operates over a byte slice plus a mutable cursor and
//! never allocates beyond the `String` it ultimately returns.

use crate::error::{HeaderError, PriorityError};
use crate::message::Priority;

const PRI_START: u8 = b'<';
const PRI_END: u8 = b'>';
pub const NILVALUE: u8 = b'-';
pub const NO_VERSION: i32 = -1;

#[inline]
pub fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

pub fn is_all_digits(b: &[u8]) -> bool {
    !b.is_empty() && b.iter().all(|&c| is_digit(c))
}

/// `<PRI>`: `<` then 1-3 ASCII digits then `>`. Advances the cursor past `>`.
pub fn parse_priority(buf: &[u8], cursor: &mut usize) -> Result<Priority, PriorityError> {
    let l = buf.len();
    if l == 0 {
        return Err(PriorityError::Empty);
    }
    if buf[*cursor] != PRI_START {
        return Err(PriorityError::NoStart);
    }

    let mut i = 1usize;
    let mut value: u32 = 0;
    while *cursor + i < l {
        if i >= 5 {
            return Err(PriorityError::TooLong);
        }
        let c = buf[*cursor + i];
        if c == PRI_END {
            if i == 1 {
                return Err(PriorityError::TooShort);
            }
            *cursor += i + 1;
            return Ok(Priority::from_value(value as u8));
        }
        if is_digit(c) {
            value = value * 10 + (c - b'0') as u32;
        } else {
            return Err(PriorityError::NonDigit);
        }
        i += 1;
    }
    Err(PriorityError::NoEnd)
}

/// One ASCII digit -> version. A non-digit is not an error: it returns
/// `NO_VERSION` and does not advance (RFC 3164 compatibility).
pub fn parse_version(buf: &[u8], cursor: &mut usize) -> i32 {
    if *cursor >= buf.len() {
        return NO_VERSION;
    }
    let c = buf[*cursor];
    if !is_digit(c) {
        return NO_VERSION;
    }
    *cursor += 1;
    (c - b'0') as i32
}

/// Exactly two ASCII digits, interpreted as base 10, checked against
/// `[min, max]`.
pub fn parse_2_digits(
    buf: &[u8],
    cursor: &mut usize,
    min: i32,
    max: i32,
) -> Option<i32> {
    if *cursor + 2 > buf.len() {
        return None;
    }
    let a = buf[*cursor];
    let b = buf[*cursor + 1];
    if !is_digit(a) || !is_digit(b) {
        *cursor += 2;
        return None;
    }
    let value = (a - b'0') as i32 * 10 + (b - b'0') as i32;
    *cursor += 2;
    if value >= min && value <= max {
        Some(value)
    } else {
        None
    }
}

/// Index one past the next `' '` in `buf[from..]`.
pub fn find_next_space(buf: &[u8], from: usize) -> Option<usize> {
    buf[from..].iter().position(|&c| c == b' ').map(|i| from + i + 1)
}

/// Bytes up to the next space, or up to and including a `%` terminator
/// (Telco Systems BiNOS delimits the hostname with `%`).
pub fn parse_hostname(buf: &[u8], cursor: &mut usize) -> Result<String, HeaderError> {
    let from = *cursor;
    let l = buf.len();
    if from >= l {
        return Err(HeaderError::HostnameTooShort);
    }
    let mut to = from;
    while to < l {
        if buf[to] == b' ' {
            break;
        }
        if buf[to] == b'%' {
            to += 1;
            break;
        }
        to += 1;
    }
    if to == from {
        return Err(HeaderError::HostnameTooShort);
    }
    let hostname = String::from_utf8_lossy(&buf[from..to]).into_owned();
    *cursor = to;
    Ok(hostname)
}

/// RFC 5424 `parseUpToLen`: read up to `max_len` bytes terminated by a
/// single space. Exceeding the length without finding a space is an error.
pub fn parse_up_to_len(
    buf: &[u8],
    cursor: &mut usize,
    max_len: usize,
    err: HeaderError,
) -> Result<String, HeaderError> {
    let l = buf.len();
    let max = *cursor + max_len;
    let mut to = *cursor;
    let mut found = false;
    while to <= max && to < l {
        if buf[to] == b' ' {
            found = true;
            break;
        }
        to += 1;
    }
    if found {
        let s = String::from_utf8_lossy(&buf[*cursor..to]).into_owned();
        *cursor = to;
        Ok(s)
    } else {
        *cursor = to.min(max);
        Err(err)
    }
}
