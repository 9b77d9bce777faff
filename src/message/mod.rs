//! The syslog data model (`spec.md` §3) and the primitive/RFC 5424/RFC 3164
//! parsers built on top of it (`spec.md` §4.1-4.4).

pub mod rfc3164;
pub mod rfc5424;
pub mod scan;
pub mod structured_data;

use chrono::{DateTime, FixedOffset, Utc};
use std::collections::BTreeMap;
use std::net::SocketAddr;

pub use structured_data::{ParamMap, StructuredData};

/// Syslog facility codes, 0..23.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Facility {
    Kern = 0,
    User = 1,
    Mail = 2,
    Daemon = 3,
    Auth = 4,
    Syslog = 5,
    Lpr = 6,
    News = 7,
    Uucp = 8,
    Cron = 9,
    Authpriv = 10,
    Ftp = 11,
    Ntp = 12,
    Security = 13,
    Console = 14,
    SolarisCron = 15,
    Local0 = 16,
    Local1 = 17,
    Local2 = 18,
    Local3 = 19,
    Local4 = 20,
    Local5 = 21,
    Local6 = 22,
    Local7 = 23,
}

impl Facility {
    pub fn from_code(code: u8) -> Self {
        // Safety net: the caller (Priority::from_value) guarantees code is
        // always 0..=23 since it comes from `p / 8` on a `u8` priority.
        match code {
            0 => Self::Kern,
            1 => Self::User,
            2 => Self::Mail,
            3 => Self::Daemon,
            4 => Self::Auth,
            5 => Self::Syslog,
            6 => Self::Lpr,
            7 => Self::News,
            8 => Self::Uucp,
            9 => Self::Cron,
            10 => Self::Authpriv,
            11 => Self::Ftp,
            12 => Self::Ntp,
            13 => Self::Security,
            14 => Self::Console,
            15 => Self::SolarisCron,
            16 => Self::Local0,
            17 => Self::Local1,
            18 => Self::Local2,
            19 => Self::Local3,
            20 => Self::Local4,
            21 => Self::Local5,
            22 => Self::Local6,
            _ => Self::Local7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kern => "kern",
            Self::User => "user",
            Self::Mail => "mail",
            Self::Daemon => "daemon",
            Self::Auth => "auth",
            Self::Syslog => "syslog",
            Self::Lpr => "lpr",
            Self::News => "news",
            Self::Uucp => "uucp",
            Self::Cron => "cron",
            Self::Authpriv => "authpriv",
            Self::Ftp => "ftp",
            Self::Ntp => "ntp",
            Self::Security => "security",
            Self::Console => "console",
            Self::SolarisCron => "solaris-cron",
            Self::Local0 => "local0",
            Self::Local1 => "local1",
            Self::Local2 => "local2",
            Self::Local3 => "local3",
            Self::Local4 => "local4",
            Self::Local5 => "local5",
            Self::Local6 => "local6",
            Self::Local7 => "local7",
        }
    }
}

/// Syslog severity levels, 0..7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Informational = 6,
    Debug = 7,
}

impl Severity {
    pub fn from_code(code: u8) -> Self {
        match code & 0x07 {
            0 => Self::Emergency,
            1 => Self::Alert,
            2 => Self::Critical,
            3 => Self::Error,
            4 => Self::Warning,
            5 => Self::Notice,
            6 => Self::Informational,
            _ => Self::Debug,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emerg",
            Self::Alert => "alert",
            Self::Critical => "crit",
            Self::Error => "err",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Informational => "info",
            Self::Debug => "debug",
        }
    }
}

/// `(p, facility, severity)` with the invariant `facility = p/8, severity =
/// p%8` enforced at construction — there is no way to build an inconsistent
/// `Priority`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Priority {
    pub value: u8,
    pub facility: Facility,
    pub severity: Severity,
}

impl Priority {
    pub fn from_value(value: u8) -> Self {
        Priority {
            value,
            facility: Facility::from_code(value / 8),
            severity: Severity::from_code(value % 8),
        }
    }

    /// RFC 3164 §4.3.3 default: facility=user(1), severity=notice(5) -> 13.
    pub fn default_3164() -> Self {
        Self::from_value(13)
    }
}

/// Sentinel meaning "absent" for the RFC 5424 VERSION field.
pub const NO_VERSION: i32 = -1;

/// The peer that sent a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Client {
    pub host: String,
    pub port: String,
}

impl Client {
    pub fn from_socket_addr(addr: SocketAddr) -> Self {
        Client {
            host: addr.ip().to_string(),
            port: addr.port().to_string(),
        }
    }

    pub fn as_host_port(&self) -> String {
        if self.port.is_empty() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Cisco IOS/IOS-XE/IOS-XR/ASA dialect metadata, attached when the RFC 3164
/// dispatcher recognizes a Cisco sequence-ID prefix (`spec.md` §4.3-4.4).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiscoMetadata {
    pub seq_id: String,
    pub source: String,
    pub not_synced: bool,
    pub category: String,
    pub facility: String,
    pub subfacility: String,
    pub severity_id: String,
    pub mnemonic: String,
}

/// Ciena SAOS dialect metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CienaMetadata {
    pub mgmt_ip: String,
    pub base_mac: String,
}

/// The parser's output record (`spec.md` §3).
#[derive(Debug, Clone)]
pub struct LogParts {
    pub priority: i32,
    pub facility: Facility,
    pub severity: Severity,
    /// -1 if absent (RFC 3164 or a parse that never reached VERSION).
    pub version: i32,
    pub timestamp: DateTime<FixedOffset>,
    pub hostname: String,
    pub app_name: String,
    pub proc_id: String,
    pub msg_id: String,
    pub structured_data: StructuredData,
    pub message: String,
    pub client: Client,
    pub received: DateTime<Utc>,
    pub source_type: String,
    pub tls_peer: String,
    pub valid: bool,
}

impl LogParts {
    /// A record that failed early enough to carry no real data, stamped
    /// with `received` and marked invalid. Callers fill in whatever fields
    /// they did manage to parse before returning one of these via `Err`-style
    /// partial results (see `spec.md` §7: "partial results are returned, not
    /// discarded").
    pub fn empty(received: DateTime<Utc>) -> Self {
        LogParts {
            priority: 0,
            facility: Facility::Kern,
            severity: Severity::Emergency,
            version: NO_VERSION,
            timestamp: received.into(),
            hostname: String::new(),
            app_name: String::new(),
            proc_id: String::new(),
            msg_id: String::new(),
            structured_data: BTreeMap::new(),
            message: String::new(),
            client: Client::default(),
            received,
            source_type: String::new(),
            tls_peer: String::new(),
            valid: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_invariant_holds_across_range() {
        for p in 0u8..=191 {
            let pri = Priority::from_value(p);
            assert_eq!(pri.facility as u8, p / 8);
            assert_eq!(pri.severity as u8, p % 8);
        }
    }

    #[test]
    fn default_3164_is_13() {
        let pri = Priority::default_3164();
        assert_eq!(pri.value, 13);
        assert_eq!(pri.facility, Facility::User);
        assert_eq!(pri.severity, Severity::Notice);
    }

    #[test]
    fn client_host_port_formatting() {
        let c = Client { host: "10.0.0.1".into(), port: "514".into() };
        assert_eq!(c.as_host_port(), "10.0.0.1:514");
        let c2 = Client { host: "unix".into(), port: String::new() };
        assert_eq!(c2.as_host_port(), "unix");
    }
}
