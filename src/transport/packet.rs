//! UDP and Unix datagram transports: one reader task filling a bounded
//! queue, one parser task draining it (`spec.md` §5, §4.6).

use super::pool::BufferPool;
use super::{dispatch, ShutdownSignal, Transport, PACKET_CHANNEL_SIZE};
use crate::clock::SharedClock;
use crate::error::{Result, TransportError};
use crate::format::Format;
use crate::handler::Handler;
use crate::message::Client;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::{UdpSocket, UnixDatagram};
use tokio::sync::mpsc;

struct PacketMessage {
    data: Vec<u8>,
    len: usize,
    client: Client,
}

/// Trims trailing control bytes (`< 0x20`) and NULs the way the original
/// packet reader does, so a stray terminator doesn't become part of the
/// message.
fn trim_trailing_control(buf: &[u8], mut n: usize) -> usize {
    while n > 0 && buf[n - 1] < 32 {
        n -= 1;
    }
    n
}

async fn run_parser_loop(
    mut rx: mpsc::Receiver<PacketMessage>,
    format: Format,
    handler: Arc<dyn Handler>,
    clock: SharedClock,
    pool: Arc<BufferPool>,
) {
    while let Some(msg) = rx.recv().await {
        let PacketMessage { data, len, client } = msg;
        let n = trim_trailing_control(&data, len);
        if n > 0 {
            match format.split_fn() {
                Some(split) => {
                    if let Ok((_, Some(token))) = split(&data[..n], true) {
                        dispatch(format, handler.as_ref(), token, client, String::new(), &clock);
                    }
                }
                None => dispatch(format, handler.as_ref(), &data[..n], client, String::new(), &clock),
            }
        }
        pool.release(data);
    }
}

/// A UDP syslog listener.
pub struct UdpTransport {
    addr: SocketAddr,
    format: Format,
}

impl UdpTransport {
    pub fn new(addr: SocketAddr, format: Format) -> Self {
        UdpTransport { addr, format }
    }
}

#[async_trait::async_trait]
impl Transport for UdpTransport {
    fn name(&self) -> &'static str {
        "udp"
    }

    async fn listen(
        self: Arc<Self>,
        handler: Arc<dyn Handler>,
        clock: SharedClock,
        mut shutdown: ShutdownSignal,
    ) -> Result<()> {
        let socket = UdpSocket::bind(self.addr).await?;
        tracing::info!(addr = %self.addr, "udp listener started");

        let pool = BufferPool::new(64);
        let (tx, rx) = mpsc::channel(PACKET_CHANNEL_SIZE);
        tokio::spawn(run_parser_loop(rx, self.format, handler, clock, pool.clone()));

        loop {
            let mut buf = pool.acquire();
            tokio::select! {
                _ = shutdown.changed() => return Ok(()),
                result = socket.recv_from(&mut buf) => {
                    match result {
                        Ok((n, addr)) if n > 0 => {
                            let client = Client::from_socket_addr(addr);
                            if tx.send(PacketMessage { data: buf, len: n, client }).await.is_err() {
                                return Ok(());
                            }
                        }
                        Ok(_) => pool.release(buf),
                        Err(e) => {
                            tracing::warn!(error = %e, "udp recv error");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }
            }
        }
    }
}

/// A Unix datagram syslog listener (the local-socket equivalent of UDP).
pub struct UnixgramTransport {
    path: PathBuf,
    format: Format,
}

impl UnixgramTransport {
    pub fn new(path: PathBuf, format: Format) -> Self {
        UnixgramTransport { path, format }
    }
}

#[async_trait::async_trait]
impl Transport for UnixgramTransport {
    fn name(&self) -> &'static str {
        "unixgram"
    }

    async fn listen(
        self: Arc<Self>,
        handler: Arc<dyn Handler>,
        clock: SharedClock,
        mut shutdown: ShutdownSignal,
    ) -> Result<()> {
        let _ = std::fs::remove_file(&self.path);
        let socket = UnixDatagram::bind(&self.path)
            .map_err(|e| TransportError::Config(format!("bind {}: {e}", self.path.display())))?;
        tracing::info!(path = %self.path.display(), "unixgram listener started");

        let pool = BufferPool::new(64);
        let (tx, rx) = mpsc::channel(PACKET_CHANNEL_SIZE);
        tokio::spawn(run_parser_loop(rx, self.format, handler, clock, pool.clone()));

        loop {
            let mut buf = pool.acquire();
            tokio::select! {
                _ = shutdown.changed() => return Ok(()),
                result = socket.recv(&mut buf) => {
                    match result {
                        Ok(n) if n > 0 => {
                            let client = Client { host: "unix".into(), port: String::new() };
                            if tx.send(PacketMessage { data: buf, len: n, client }).await.is_err() {
                                return Ok(());
                            }
                        }
                        Ok(_) => pool.release(buf),
                        Err(e) => {
                            tracing::warn!(error = %e, "unixgram recv error");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_control_bytes() {
        let buf = b"hello\n\0".to_vec();
        assert_eq!(trim_trailing_control(&buf, buf.len()), 5);
    }

    #[test]
    fn keeps_printable_trailing_byte() {
        let buf = b"hello!".to_vec();
        assert_eq!(trim_trailing_control(&buf, buf.len()), 6);
    }
}
