//! The `Handler` contract: every parsed (or partially parsed) record ends
//! up at exactly one `Handler::handle` call (`spec.md` §6).

use crate::error::ParseError;
use crate::message::LogParts;
use tokio::sync::mpsc;

/// Receives every syslog record a transport produces, successfully parsed
/// or not — a parse error never means the record is discarded, only that
/// `err` is `Some` and some fields of `log_parts` may be defaulted.
pub trait Handler: Send + Sync {
    fn handle(&self, log_parts: LogParts, msg_len: usize, err: Option<ParseError>);
}

impl<F> Handler for F
where
    F: Fn(LogParts, usize, Option<ParseError>) + Send + Sync,
{
    fn handle(&self, log_parts: LogParts, msg_len: usize, err: Option<ParseError>) {
        self(log_parts, msg_len, err)
    }
}

/// One record plus its framed length and parse outcome, as delivered by a
/// `ChannelHandler`.
#[derive(Debug)]
pub struct Delivered {
    pub log_parts: LogParts,
    pub msg_len: usize,
    pub err: Option<ParseError>,
}

/// A `Handler` that forwards everything onto an `mpsc` channel instead of
/// acting on it directly — the convenience wrapper most callers reach for.
pub struct ChannelHandler {
    sender: mpsc::Sender<Delivered>,
}

impl ChannelHandler {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Delivered>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (ChannelHandler { sender }, receiver)
    }
}

impl Handler for ChannelHandler {
    fn handle(&self, log_parts: LogParts, msg_len: usize, err: Option<ParseError>) {
        if self.sender.try_send(Delivered { log_parts, msg_len, err }).is_err() {
            tracing::warn!("channel handler backpressure: dropping record");
        }
    }
}
