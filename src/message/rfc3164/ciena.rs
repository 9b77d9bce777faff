//! Ciena SAOS dialect: three space-delimited tokens (mgmt IP, base MAC,
//! real hostname) following a `[local]`/`[UTC]` pseudo-hostname
//! (`spec.md` §4.4).

use crate::error::HeaderError;
use crate::message::scan::find_next_space;
use crate::message::CienaMetadata;

pub fn parse_ciena_hostname(
    buf: &[u8],
    cursor: &mut usize,
) -> Result<(String, CienaMetadata), HeaderError> {
    let from = *cursor;
    let to = find_next_space(buf, from).ok_or(HeaderError::HostnameTooShort)?;
    let mgmt_ip = String::from_utf8_lossy(&buf[from..to - 1]).into_owned();

    let from = to;
    let to = find_next_space(buf, from).ok_or(HeaderError::HostnameTooShort)?;
    let base_mac = String::from_utf8_lossy(&buf[from..to - 1]).into_owned();

    let from = to;
    let to = find_next_space(buf, from).ok_or(HeaderError::HostnameTooShort)?;
    let hostname = String::from_utf8_lossy(&buf[from..to - 1]).into_owned();

    *cursor = to;
    Ok((hostname, CienaMetadata { mgmt_ip, base_mac }))
}
