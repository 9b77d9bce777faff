//! Transport implementations: one reader + one parser task per packet
//! transport (UDP, Unix datagram), one accept loop + one scan task per
//! connection for stream transports (TCP, TCP+TLS) (`spec.md` §5).

pub mod packet;
pub mod pool;
pub mod stream;

use crate::clock::SharedClock;
use crate::error::Result;
use crate::format::Format;
use crate::handler::Handler;
use crate::message::Client;
use std::sync::Arc;
use tokio::sync::watch;

/// The size of the bounded queue between a packet transport's reader task
/// and its parser task.
pub const PACKET_CHANNEL_SIZE: usize = 10;

/// Broadcasts shutdown to every task a transport has spawned. Cloning a
/// `watch::Receiver` per task is the tokio-idiomatic analogue of a shared
/// `<-chan struct{}` done channel.
pub type ShutdownSignal = watch::Receiver<bool>;

/// A running listener. Implementors spawn their own tasks in `listen` and
/// must observe `shutdown` to stop them.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable transport name, for logs (`udp`, `tcp`, `tcp+tls`,
    /// `unixgram`).
    fn name(&self) -> &'static str;

    async fn listen(
        self: Arc<Self>,
        handler: Arc<dyn Handler>,
        clock: SharedClock,
        shutdown: ShutdownSignal,
    ) -> Result<()>;
}

/// Dispatches one fully-framed record to the handler: parses it with
/// `format`, fills in `Client`, and falls back to the peer's host (no port)
/// as hostname when the dialect left it blank (RFC 3164 and Automatic have
/// no reliable hostname field when the sender omits one).
pub fn dispatch(
    format: Format,
    handler: &dyn Handler,
    line: &[u8],
    client: Client,
    tls_peer: String,
    clock: &SharedClock,
) {
    let client_host_fallback = client.host.clone();
    let (mut parts, err) = format.parse(line, client, clock);
    if parts.hostname.is_empty()
        && matches!(format, Format::Rfc3164 | Format::Automatic)
    {
        parts.hostname = client_host_fallback;
    }
    parts.tls_peer = tls_peer;
    handler.handle(parts, line.len(), err);
}
