//! The format registry (`spec.md` §4.5-4.6): which wire grammar and which
//! stream-framing strategy a transport uses, plus `Automatic` detection for
//! transports that don't know in advance.

pub mod framing;

use crate::clock::SharedClock;
use crate::error::ParseError;
use crate::message::{rfc3164, rfc5424, Client, LogParts};
use serde::{Deserialize, Serialize};

/// Which syslog dialect and framing strategy to apply to incoming data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// RFC 3164, no length-prefixed framing (one record per datagram or
    /// per line).
    Rfc3164,
    /// RFC 5424, no length-prefixed framing.
    Rfc5424,
    /// RFC 5424 over RFC 5425 octet-counted stream framing.
    Rfc5425,
    /// RFC 5424 over RFC 6587 framing (non-transparent or octet-counted).
    Rfc6587,
    /// Inspect each record and route to RFC 3164 or RFC 5424.
    Automatic,
}

impl Format {
    /// The `bufio.SplitFunc` equivalent: `None` means "the transport
    /// delivers one complete record per read" (packet transports, bare
    /// RFC 3164/5424 over a stream); `Some` is a framing splitter to run
    /// over the stream first.
    pub fn split_fn(self) -> Option<fn(&[u8], bool) -> Result<(usize, Option<&[u8]>), crate::error::FramingError>> {
        match self {
            Format::Rfc3164 | Format::Rfc5424 | Format::Automatic => None,
            Format::Rfc5425 => Some(framing::split_rfc5425),
            Format::Rfc6587 => Some(framing::split_rfc6587),
        }
    }

    /// Parses one already-framed record.
    pub fn parse(
        self,
        buf: &[u8],
        client: Client,
        clock: &SharedClock,
    ) -> (LogParts, Option<ParseError>) {
        match self {
            Format::Rfc3164 => rfc3164::parse(buf, client, clock),
            Format::Rfc5424 | Format::Rfc5425 | Format::Rfc6587 => rfc5424::parse(buf, client, clock),
            Format::Automatic => match detect(buf) {
                Format::Rfc3164 => rfc3164::parse(buf, client, clock),
                _ => rfc5424::parse(buf, client, clock),
            },
        }
    }
}

/// Peeks at `<PRI>` followed by a VERSION digit and a space to tell RFC
/// 5424 apart from RFC 3164 — RFC 3164 has no VERSION field, so the byte
/// after `<PRI>` is never `DIGIT SP`.
fn detect(buf: &[u8]) -> Format {
    let mut cursor = 0usize;
    if crate::message::scan::parse_priority(buf, &mut cursor).is_err() {
        return Format::Rfc3164;
    }
    if cursor < buf.len()
        && buf[cursor].is_ascii_digit()
        && cursor + 1 < buf.len()
        && buf[cursor + 1] == b' '
    {
        Format::Rfc5424
    } else {
        Format::Rfc3164
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_rfc3164_cisco() {
        let line = b"<189>571: hostname: Nov  8 13:53:12.226: %SYS-5-CONFIG_I: Configured from console by admin on vty0 (192.0.2.1)";
        assert_eq!(detect(line), Format::Rfc3164);
    }

    #[test]
    fn detects_rfc5424() {
        let line = b"<34>1 2003-10-11T22:14:15.003Z mymachine.example.com su - ID47 - msg";
        assert_eq!(detect(line), Format::Rfc5424);
    }

    #[test]
    fn automatic_routes_to_rfc3164_parser() {
        let line = b"<34>Oct 11 22:14:15 mymachine su: failed";
        let (parts, err) = Format::Automatic.parse(line, Client::default(), &crate::clock::system_clock());
        assert!(err.is_none());
        assert_eq!(parts.source_type, "syslog");
    }
}
