//! Syslog ingestion: RFC 5424/3164 parsing (with Cisco/Ciena/Telco vendor
//! dialects), RFC 5425/6587 stream framing, and UDP/TCP/TCP+TLS/Unix
//! datagram transports.
//!
//! - [`message`] — wire-format parsers and the `LogParts` data model
//! - [`format`] — format registry, auto-detection, stream framing
//! - [`transport`] — UDP/Unixgram/TCP/TCP+TLS listeners
//! - [`handler`] — the per-record delivery contract
//! - [`server`] — ties a set of transports to one handler and shutdown signal
//! - [`config`] — JSON5-loadable listener/logging configuration
//! - [`logging`] — tracing subscriber setup
//! - [`clock`] — injectable wall-clock access
//! - [`error`] — error types for every layer

pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod handler;
pub mod logging;
pub mod message;
pub mod server;
pub mod transport;

pub use clock::{Clock, FixedClock, SharedClock, SystemClock};
pub use config::{ListenerConfig, ListenerProtocol, LogFormat, LoggingConfig, ServerConfig, TlsConfig};
pub use error::{FramingError, HeaderError, ParseError, PriorityError, Result, StructuredDataError, TimestampError, TransportError};
pub use format::Format;
pub use handler::{ChannelHandler, Delivered, Handler};
pub use message::{Client, Facility, LogParts, ParamMap, Priority, Severity, StructuredData};
pub use server::Server;
