//! TCP and TCP+TLS transports: one accept loop plus one scan task per
//! connection (`spec.md` §5, §4.6, §6 TLS peer extraction).

use super::{dispatch, ShutdownSignal, Transport};
use crate::clock::SharedClock;
use crate::error::{Result, TransportError};
use crate::format::Format;
use crate::handler::Handler;
use crate::message::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpListener;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

/// How long a connection may sit idle before its scan task gives up and
/// closes it. `None` means no read deadline (the original's default).
#[derive(Debug, Clone, Copy)]
pub struct ReadTimeout(pub Option<Duration>);

impl Default for ReadTimeout {
    fn default() -> Self {
        ReadTimeout(None)
    }
}

/// A plain TCP syslog listener, framed according to `format`.
pub struct TcpTransport {
    addr: SocketAddr,
    format: Format,
    timeout: ReadTimeout,
}

impl TcpTransport {
    pub fn new(addr: SocketAddr, format: Format, timeout: ReadTimeout) -> Self {
        TcpTransport { addr, format, timeout }
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    fn name(&self) -> &'static str {
        "tcp"
    }

    async fn listen(
        self: Arc<Self>,
        handler: Arc<dyn Handler>,
        clock: SharedClock,
        mut shutdown: ShutdownSignal,
    ) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!(addr = %self.addr, "tcp listener started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => return Ok(()),
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(v) => v,
                        Err(e) => {
                            tracing::warn!(error = %e, "tcp accept error");
                            continue;
                        }
                    };
                    let handler = handler.clone();
                    let clock = clock.clone();
                    let format = self.format;
                    let timeout = self.timeout;
                    let shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        scan_connection(stream, peer, format, handler, clock, String::new(), timeout, shutdown).await;
                    });
                }
            }
        }
    }
}

/// A TLS-wrapped TCP syslog listener. Defaults to RFC 5425 octet-counted
/// framing (matching the original, which always pairs TCP+TLS with
/// length-prefixed framing rather than newline scanning).
pub struct TcpTlsTransport {
    addr: SocketAddr,
    format: Format,
    timeout: ReadTimeout,
    acceptor: TlsAcceptor,
}

impl TcpTlsTransport {
    pub fn new(addr: SocketAddr, format: Format, timeout: ReadTimeout, tls_config: ServerConfig) -> Self {
        TcpTlsTransport {
            addr,
            format,
            timeout,
            acceptor: TlsAcceptor::from(Arc::new(tls_config)),
        }
    }
}

#[async_trait::async_trait]
impl Transport for TcpTlsTransport {
    fn name(&self) -> &'static str {
        "tcp+tls"
    }

    async fn listen(
        self: Arc<Self>,
        handler: Arc<dyn Handler>,
        clock: SharedClock,
        mut shutdown: ShutdownSignal,
    ) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!(addr = %self.addr, "tcp+tls listener started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => return Ok(()),
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(v) => v,
                        Err(e) => {
                            tracing::warn!(error = %e, "tcp+tls accept error");
                            continue;
                        }
                    };
                    let handler = handler.clone();
                    let clock = clock.clone();
                    let format = self.format;
                    let timeout = self.timeout;
                    let acceptor = self.acceptor.clone();
                    let shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        let tls_stream = match acceptor.accept(stream).await {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!(error = %e, "tls handshake failed");
                                return;
                            }
                        };
                        let tls_peer = extract_peer_cn(&tls_stream);
                        scan_connection(tls_stream, peer, format, handler, clock, tls_peer, timeout, shutdown).await;
                    });
                }
            }
        }
    }
}

/// Pulls the subject CN out of the client certificate the peer presented,
/// if any. Connections without a client certificate (or with one we can't
/// parse) simply carry an empty `tls_peer`, matching the original's
/// "return ok=false to terminate" being treated leniently here rather than
/// dropping the connection.
fn extract_peer_cn<IO>(stream: &tokio_rustls::server::TlsStream<IO>) -> String {
    let (_, session) = stream.get_ref();
    let certs = match session.peer_certificates() {
        Some(c) if !c.is_empty() => c,
        _ => return String::new(),
    };
    match x509_parser::parse_x509_certificate(certs[0].as_ref()) {
        Ok((_, cert)) => cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .unwrap_or("")
            .to_string(),
        Err(_) => String::new(),
    }
}

/// `bufio.ScanLines`-equivalent default token boundary for stream formats
/// that declare no explicit framing (`Format::Rfc3164`/`Rfc5424`/`Automatic`):
/// split on `\n`, stripping an optional trailing `\r`. Mirrors Go's
/// `bufio.NewScanner` falling back to `ScanLines` when `GetSplitFunc`
/// returns nil.
fn split_lines(data: &[u8], at_eof: bool) -> (usize, Option<&[u8]>) {
    if let Some(pos) = data.iter().position(|&b| b == b'\n') {
        let mut end = pos;
        if end > 0 && data[end - 1] == b'\r' {
            end -= 1;
        }
        (pos + 1, Some(&data[..end]))
    } else if at_eof && !data.is_empty() {
        (data.len(), Some(data))
    } else {
        (0, None)
    }
}

async fn scan_connection<S>(
    mut stream: S,
    peer: SocketAddr,
    format: Format,
    handler: Arc<dyn Handler>,
    clock: SharedClock,
    tls_peer: String,
    timeout: ReadTimeout,
    mut shutdown: ShutdownSignal,
) where
    S: AsyncRead + Unpin,
{
    let client = Client::from_socket_addr(peer);
    let mut buf = Vec::with_capacity(8192);
    let mut scratch = [0u8; 8192];

    loop {
        if *shutdown.borrow() {
            return;
        }
        let read = if let Some(d) = timeout.0 {
            tokio::select! {
                _ = shutdown.changed() => return,
                r = tokio::time::timeout(d, stream.read(&mut scratch)) => match r {
                    Ok(inner) => inner,
                    Err(_) => return,
                },
            }
        } else {
            tokio::select! {
                _ = shutdown.changed() => return,
                r = stream.read(&mut scratch) => r,
            }
        };

        let n = match read {
            Ok(0) => {
                if !buf.is_empty() {
                    if let (advance, Some(token)) = split_next(format, &buf, true) {
                        let token = token.to_vec();
                        dispatch(format, handler.as_ref(), &token, client.clone(), tls_peer.clone(), &clock);
                        buf.drain(..advance);
                    }
                }
                return;
            }
            Ok(n) => n,
            Err(_) => return,
        };
        buf.extend_from_slice(&scratch[..n]);

        loop {
            match split_next(format, &buf, false) {
                (advance, Some(token)) if advance > 0 => {
                    let token = token.to_vec();
                    dispatch(format, handler.as_ref(), &token, client.clone(), tls_peer.clone(), &clock);
                    buf.drain(..advance);
                }
                _ => break,
            }
        }
    }
}

/// Applies `format`'s explicit framing splitter if it has one, otherwise
/// falls back to `split_lines` (the stream default for formats that parse
/// one record per already-delimited line: RFC 3164, RFC 5424, Automatic).
fn split_next(format: Format, buf: &[u8], at_eof: bool) -> (usize, Option<&[u8]>) {
    match format.split_fn() {
        Some(split) => split(buf, at_eof).unwrap_or((0, None)),
        None => split_lines(buf, at_eof),
    }
}

/// Builds a TLS `ServerConfig` from a PEM certificate chain and key pair
/// (`spec.md` §6).
pub fn load_tls_config(cert_pem: &[u8], key_pem: &[u8]) -> Result<ServerConfig> {
    let certs: Vec<_> = rustls_pemfile::certs(&mut &cert_pem[..])
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| TransportError::Config(format!("invalid certificate PEM: {e}")))?;
    let key = rustls_pemfile::private_key(&mut &key_pem[..])
        .map_err(|e| TransportError::Config(format!("invalid key PEM: {e}")))?
        .ok_or_else(|| TransportError::Config("no private key found".into()))?;

    ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(TransportError::Tls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_timeout_default_is_none() {
        assert!(ReadTimeout::default().0.is_none());
    }

    #[test]
    fn split_lines_strips_trailing_cr() {
        let (advance, token) = split_lines(b"hello\r\nworld", false);
        assert_eq!(advance, 7);
        assert_eq!(token, Some(&b"hello"[..]));
    }

    #[test]
    fn split_lines_without_newline_waits_for_more_data() {
        let (advance, token) = split_lines(b"partial", false);
        assert_eq!(advance, 0);
        assert!(token.is_none());
    }

    #[test]
    fn split_lines_flushes_remainder_at_eof() {
        let (advance, token) = split_lines(b"no newline", true);
        assert_eq!(advance, 10);
        assert_eq!(token, Some(&b"no newline"[..]));
    }
}
