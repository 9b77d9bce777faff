//! Property tests for the ingestion pipeline's core invariants: priority
//! decomposition, structured-data round-tripping, truncation robustness,
//! header stability under trailing-byte extension, default priority, and
//! exact octet-counted framing.

use proptest::prelude::*;
use syslog_ingest::clock::system_clock;
use syslog_ingest::format::framing::split_rfc5425;
use syslog_ingest::message::{rfc3164, rfc5424};
use syslog_ingest::Client;

fn client() -> Client {
    Client { host: "198.51.100.1".into(), port: "514".into() }
}

proptest! {
    /// 1. Priority always satisfies `0 <= priority <= 191` and
    /// `priority = 8*facility + severity` for any accepted record.
    #[test]
    fn priority_invariant_on_random_rfc5424_records(
        pri in 0u8..=191,
        host in "[a-zA-Z0-9]{1,20}",
        app in "[a-zA-Z0-9]{1,20}",
    ) {
        let line = format!("<{pri}>1 2024-01-01T00:00:00Z {host} {app} - - - msg");
        let (parts, err) = rfc5424::parse(line.as_bytes(), client(), &system_clock());
        prop_assert!(err.is_none());
        prop_assert!(parts.priority >= 0 && parts.priority <= 191);
        prop_assert_eq!(parts.priority as u32, 8 * (parts.facility as u32) + parts.severity as u32);
    }

    /// 2. Structured-data round-trip for values without `"`, `\`, `]`.
    #[test]
    fn structured_data_round_trips_unescaped_values(
        value in "[a-zA-Z0-9 ]{0,20}",
    ) {
        let line = format!("<34>1 2024-01-01T00:00:00Z host app - - [id@1 k=\"{value}\"] msg");
        let (parts, err) = rfc5424::parse(line.as_bytes(), client(), &system_clock());
        prop_assert!(err.is_none());
        let sd = parts.structured_data.get("id@1").unwrap();
        prop_assert_eq!(sd.get("k"), Some(value.as_str()));
    }

    /// 4. Truncated-prefix robustness: no input (including any byte-prefix
    /// of a valid RFC 5424 record) may panic; the parser always returns a
    /// record, possibly marked invalid / carrying an error.
    #[test]
    fn truncated_rfc5424_prefixes_never_panic(n in 0usize..120) {
        let full = b"<165>1 2003-10-11T22:14:15.003Z mymachine.example.com evntslog - ID47 [exampleSDID@32473 iut=\"3\"] An application event log entry";
        let n = n.min(full.len());
        let prefix = &full[..n];
        let (_parts, _err) = rfc5424::parse(prefix, client(), &system_clock());
    }

    /// 4b. Same truncation robustness for RFC 3164 + Cisco dialect input.
    #[test]
    fn truncated_rfc3164_prefixes_never_panic(n in 0usize..100) {
        let full = b"<190>123: Jan 02 2006 22:04:05: %SYS-5-CONFIG_I: Configured from console by admin on vty0 (192.0.2.1)";
        let n = n.min(full.len());
        let prefix = &full[..n];
        let (_parts, _err) = rfc3164::parse(prefix, client(), &system_clock());
    }

    /// 3. Appending any suffix to a valid RFC 5424 record leaves the parsed
    /// header fields unchanged (the remainder becomes part of `message`).
    #[test]
    fn appending_suffix_preserves_header(suffix in "[a-zA-Z0-9 ]{0,30}") {
        let base = b"<34>1 2003-10-11T22:14:15.003Z mymachine.example.com su - ID47 - body";
        let mut extended = base.to_vec();
        extended.extend_from_slice(suffix.as_bytes());

        let (base_parts, _) = rfc5424::parse(base, client(), &system_clock());
        let (ext_parts, _) = rfc5424::parse(&extended, client(), &system_clock());

        prop_assert_eq!(base_parts.priority, ext_parts.priority);
        prop_assert_eq!(base_parts.version, ext_parts.version);
        prop_assert_eq!(base_parts.hostname, ext_parts.hostname);
        prop_assert_eq!(base_parts.app_name, ext_parts.app_name);
        prop_assert_eq!(base_parts.msg_id, ext_parts.msg_id);
        prop_assert_eq!(base_parts.timestamp, ext_parts.timestamp);
    }

    /// 5. Priority defaulting: any input not starting with `<` is accepted
    /// with priority 13 and a timestamp within a second of wall clock.
    #[test]
    fn missing_priority_defaults_to_13(body in "[a-zA-Z0-9 ]{1,60}") {
        prop_assume!(!body.starts_with('<'));
        let before = system_clock().now();
        let (parts, err) = rfc3164::parse(body.as_bytes(), client(), &system_clock());
        prop_assert!(err.is_some());
        prop_assert_eq!(parts.priority, 13);
        prop_assert!((parts.received - before).num_seconds().abs() <= 1);
    }

    /// 6. Octet-counted splitter: `"{n} " + payload + junk` always yields
    /// exactly `payload` with `advance = len(prefix) + n`.
    #[test]
    fn octet_counted_split_is_exact(
        payload in proptest::collection::vec(any::<u8>(), 1..500),
        junk in proptest::collection::vec(any::<u8>(), 0..50),
    ) {
        let prefix = format!("{} ", payload.len());
        let mut data = prefix.clone().into_bytes();
        data.extend_from_slice(&payload);
        data.extend_from_slice(&junk);

        let (advance, token) = split_rfc5425(&data, false).unwrap();
        let token = token.expect("complete frame available");
        prop_assert_eq!(token, payload.as_slice());
        prop_assert_eq!(advance, prefix.len() + payload.len());
    }
}
