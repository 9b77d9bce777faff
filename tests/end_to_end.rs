//! End-to-end parsing scenarios: one test per row of the scenario table,
//! plus additional Cisco IOS-XR/origin-id permutations covering the vendor
//! dialect's edge cases.

use syslog_ingest::clock::system_clock;
use syslog_ingest::message::{rfc3164, rfc5424};
use syslog_ingest::{Client, Facility, Severity};

fn client() -> Client {
    Client { host: "192.0.2.10".into(), port: "514".into() }
}

#[test]
fn scenario_1_rfc5424_basic() {
    let line = b"<34>1 2003-10-11T22:14:15.003Z mymachine.example.com su - ID47 - 'su root' failed for lonvick on /dev/pts/8";
    let (parts, err) = rfc5424::parse(line, client(), &system_clock());
    assert!(err.is_none());
    assert_eq!(parts.priority, 34);
    assert_eq!(parts.facility, Facility::Auth);
    assert_eq!(parts.severity, Severity::Critical);
    assert_eq!(parts.version, 1);
    assert_eq!(parts.hostname, "mymachine.example.com");
    assert_eq!(parts.app_name, "su");
    assert_eq!(parts.msg_id, "ID47");
    assert!(parts.structured_data.is_empty());
    assert_eq!(parts.message, "'su root' failed for lonvick on /dev/pts/8");
    assert_eq!(parts.source_type, "rfc5424_syslog");
}

#[test]
fn scenario_2_rfc5424_structured_data() {
    let line = b"<165>1 2003-10-11T22:14:15.003Z mymachine.example.com evntslog - ID47 [exampleSDID@32473 iut=\"3\" eventSource=\"Application\" eventID=\"1011\"] An application event log entry...";
    let (parts, err) = rfc5424::parse(line, client(), &system_clock());
    assert!(err.is_none());
    let sd = parts.structured_data.get("exampleSDID@32473").expect("sd element present");
    assert_eq!(sd.get("iut"), Some("3"));
    assert_eq!(sd.get("eventSource"), Some("Application"));
    assert_eq!(sd.get("eventID"), Some("1011"));
    assert_eq!(parts.message, "An application event log entry...");
}

#[test]
fn scenario_3_rfc3164_basic() {
    let line = b"<31>Dec 26 05:08:46 hostname tag[296]: content";
    let (parts, err) = rfc3164::parse(line, client(), &system_clock());
    assert!(err.is_none());
    assert_eq!(parts.priority, 31);
    assert_eq!(parts.hostname, "hostname");
    assert_eq!(parts.app_name, "tag");
    assert_eq!(parts.proc_id, "296");
    assert_eq!(parts.message, "content");
    assert_eq!(parts.source_type, "syslog");
}

#[test]
fn scenario_4_cisco_ios_without_hostname() {
    let line = b"<190>123: Jan 02 2006 22:04:05: %SYS-5-CONFIG_I: Configured from console by admin on vty0 (192.0.2.1)";
    let (parts, err) = rfc3164::parse(line, client(), &system_clock());
    assert!(err.is_none());
    assert_eq!(parts.source_type, "cisco:ios");
    assert_eq!(parts.timestamp.naive_utc().to_string(), "2006-01-02 22:04:05");
    let meta = parts.structured_data.get("meta").unwrap();
    assert_eq!(meta.get("sequenceId"), Some("123"));
    let syslog9 = parts.structured_data.get("syslog@9").unwrap();
    assert_eq!(syslog9.get("facility"), Some("SYS"));
    assert_eq!(syslog9.get("severity_id"), Some("5"));
    assert_eq!(syslog9.get("mnemonic"), Some("CONFIG_I"));
    assert_eq!(parts.message, "%SYS-5-CONFIG_I: Configured from console by admin on vty0 (192.0.2.1)");
}

#[test]
fn scenario_4b_cisco_ios_with_hostname() {
    let line = b"<190>123: hostname: Jan 02 2006 22:04:05: %SYS-5-CONFIG_I: Configured from console by admin on vty0 (192.0.2.1)";
    let (parts, err) = rfc3164::parse(line, client(), &system_clock());
    assert!(err.is_none());
    assert_eq!(parts.hostname, "hostname");
    assert_eq!(parts.source_type, "cisco:ios");
}

#[test]
fn scenario_5_rfc5425_splitter_then_rfc5424() {
    use syslog_ingest::format::framing::split_rfc5425;

    let payload = b"<165>1 2003-08-24T05:14:15.000003-07:00 192.0.2.1 myproc 8710 - - %% It's time to make the do-nuts.";
    let framed = format!("{} ", payload.len());
    let mut data = framed.into_bytes();
    data.extend_from_slice(payload);
    data.extend_from_slice(b"trailing junk that belongs to the next frame");

    let (advance, token) = split_rfc5425(&data, false).unwrap();
    let token = token.expect("a complete frame");
    assert_eq!(token, payload);
    assert_eq!(advance, format!("{} ", payload.len()).len() + payload.len());

    let (parts, err) = rfc5424::parse(token, client(), &system_clock());
    assert!(err.is_none());
    assert_eq!(parts.hostname, "192.0.2.1");
    assert_eq!(parts.app_name, "myproc");
    assert_eq!(parts.proc_id, "8710");
}

#[test]
fn scenario_6_rfc3164_no_priority_defaults_to_13() {
    let line = b"Dec 26 05:08:46 hostname test with no priority";
    let (parts, err) = rfc3164::parse(line, client(), &system_clock());
    assert!(err.is_some());
    assert_eq!(parts.priority, 13);
    assert!(parts.valid);
    assert_eq!(parts.message, std::str::from_utf8(line).unwrap());
}

#[test]
fn cisco_ios_xr_with_source() {
    let line = b"<190>123: hostnameprefix RP/0/RSP0/CPU0:2006 Jan 02 15:04:05: config[12345]: %MGBL-SYS-5-CONFIG_I: Configured from console by admin on vty0 (192.0.2.1)";
    let (parts, err) = rfc3164::parse(line, client(), &system_clock());
    assert!(err.is_none());
    assert_eq!(parts.hostname, "hostnameprefix");
    assert_eq!(parts.source_type, "cisco:ios");
}

#[test]
fn cisco_single_digit_day_is_space_padded() {
    let line = b"<190>123: Jan  2 2006 15:04:05.999 MST: %SYS-5-CONFIG_I: Configured from console by admin on vty0 (192.0.2.1)";
    let (parts, err) = rfc3164::parse(line, client(), &system_clock());
    assert!(err.is_none());
    assert_eq!(parts.timestamp.naive_utc().format("%Y-%m-%d").to_string(), "2006-01-02");
}
