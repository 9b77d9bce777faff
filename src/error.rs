//! Error types for every layer of the ingestion pipeline.
//!
//! One variant per failure class with a human-readable `#[error(...)]`
//! message, and `#[from]` conversions where the underlying error type is
//! foreign.

use thiserror::Error;

/// Errors raised while scanning the primitive grammar elements shared by
/// RFC 5424 and RFC 3164 (`<PRI>`, version digit, hostname, 2-digit fields).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriorityError {
    #[error("no start char found for priority")]
    NoStart,
    #[error("priority field empty")]
    Empty,
    #[error("no end char found for priority")]
    NoEnd,
    #[error("priority field too short")]
    TooShort,
    #[error("priority field too long")]
    TooLong,
    #[error("non digit found in priority")]
    NonDigit,
}

/// Errors raised while parsing an RFC 5424/3164/Cisco timestamp.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("invalid year in timestamp")]
    YearInvalid,
    #[error("invalid month in timestamp")]
    MonthInvalid,
    #[error("invalid day in timestamp")]
    DayInvalid,
    #[error("invalid hour in timestamp")]
    HourInvalid,
    #[error("invalid minute in timestamp")]
    MinuteInvalid,
    #[error("invalid second in timestamp")]
    SecondInvalid,
    #[error("invalid fraction of second in timestamp")]
    SecFracInvalid,
    #[error("invalid time zone in timestamp")]
    TimeZoneInvalid,
    #[error("invalid time format")]
    InvalidTimeFormat,
    #[error("timestamp format unknown")]
    UnknownFormat,
    #[error("end of log line")]
    Eol,
}

/// Errors raised while parsing the RFC 5424 `STRUCTURED-DATA` grammar.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructuredDataError {
    #[error("no structured data")]
    NoStructuredData,
    #[error("missing SD-ID")]
    MissingSdId,
    #[error("SD-ID cannot contain '{0}'")]
    SdIdInvalidChar(char),
    #[error("SD-ID length must be <= 32")]
    SdIdTooLong,
    #[error("PARAM-NAME cannot contain '{0}'")]
    ParamNameInvalidChar(char),
    #[error("PARAM-NAME length must be <= 32")]
    ParamNameTooLong,
    #[error("missing SD-PARAM")]
    MissingSdParam,
    #[error("missing PARAM-VALUE")]
    MissingParamValue,
    #[error("must escape ']' inside of PARAM-VALUE")]
    UnescapedBracketInValue,
    #[error("empty SD-ELEMENT")]
    EmptySdElement,
    #[error("cannot have '{0}' outside of SD-ELEMENT")]
    CharOutsideElement(char),
    #[error("invalid '['")]
    NestedBracket,
    #[error("unterminated SD-ELEMENT")]
    Unterminated,
}

/// Header-field errors shared by RFC 5424 (APP-NAME/PROCID/MSGID length
/// caps) and RFC 3164 (short hostname).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("hostname field too short")]
    HostnameTooShort,
    #[error("invalid app name")]
    InvalidAppName,
    #[error("invalid proc ID")]
    InvalidProcId,
    #[error("invalid msg ID")]
    InvalidMsgId,
    #[error("no space found")]
    NoSpace,
}

/// Top-level per-record parse error, surfaced to the `Handler` alongside a
/// best-effort partial `LogParts` (parsing never discards what it already
/// extracted).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("priority: {0}")]
    Priority(#[from] PriorityError),
    #[error("timestamp: {0}")]
    Timestamp(#[from] TimestampError),
    #[error("structured data: {0}")]
    StructuredData(#[from] StructuredDataError),
    #[error("header: {0}")]
    Header(#[from] HeaderError),
}

/// Stream-transport framing errors (RFC 5425 / RFC 6587 octet counting).
/// Fatal to the connection they occur on; siblings are unaffected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FramingError {
    #[error("MSG-LEN must start with NONZERO-DIGIT")]
    MsgLenStartNonzero,
    #[error("MSG-LEN must contain only DIGIT")]
    MsgLenOnlyDigit,
    #[error("MSG-LEN is too large")]
    MsgLenTooLarge,
    #[error("not enough data")]
    NotEnoughData,
}

/// Transport-level (I/O, TLS, config) errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("tls error: {0}")]
    Tls(#[from] rustls::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("no transports configured")]
    NoTransports,
}

pub type Result<T> = std::result::Result<T, TransportError>;
