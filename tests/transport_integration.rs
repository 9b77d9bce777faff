//! Integration tests exercising real `tokio::net` sockets end-to-end,
//! grounded on `server/transport/transport_test.go` and `server_test.go`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use syslog_ingest::clock::system_clock;
use syslog_ingest::config::ListenerProtocol;
use syslog_ingest::format::Format;
use syslog_ingest::handler::ChannelHandler;
use syslog_ingest::server::Server;
use syslog_ingest::transport::packet::UdpTransport;
use syslog_ingest::transport::stream::{ReadTimeout, TcpTransport};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};

async fn recv_with_timeout<T>(rx: &mut tokio::sync::mpsc::Receiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("record should arrive before the test timeout")
        .expect("channel should not close early")
}

#[tokio::test]
async fn udp_transport_delivers_a_parsed_record() {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let bound = UdpSocket::bind(addr).await.unwrap();
    let local_addr = bound.local_addr().unwrap();
    drop(bound);

    let (handler, mut rx) = ChannelHandler::new(8);
    let mut server = Server::new(Arc::new(handler));
    server.add_transport(Arc::new(UdpTransport::new(local_addr, Format::Automatic)));
    server.start().unwrap();

    // Give the listener a moment to actually bind before sending.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender
        .send_to(b"<34>Oct 11 22:14:15 mymachine su: it broke", local_addr)
        .await
        .unwrap();

    let delivered = recv_with_timeout(&mut rx).await;
    assert!(delivered.err.is_none());
    assert_eq!(delivered.log_parts.hostname, "mymachine");
    assert_eq!(delivered.log_parts.message, "it broke");

    server.stop();
}

#[tokio::test]
async fn tcp_transport_delivers_multiple_records_over_one_connection() {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let bound = tokio::net::TcpListener::bind(addr).await.unwrap();
    let local_addr = bound.local_addr().unwrap();
    drop(bound);

    let (handler, mut rx) = ChannelHandler::new(8);
    let mut server = Server::new(Arc::new(handler));
    server.add_transport(Arc::new(TcpTransport::new(local_addr, Format::Rfc3164, ReadTimeout::default())));
    server.start().unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut stream = TcpStream::connect(local_addr).await.unwrap();
    stream
        .write_all(b"<13>Oct 11 22:14:15 host1 app: first\n<13>Oct 11 22:14:16 host1 app: second\n")
        .await
        .unwrap();

    let first = recv_with_timeout(&mut rx).await;
    assert_eq!(first.log_parts.message, "first");
    let second = recv_with_timeout(&mut rx).await;
    assert_eq!(second.log_parts.message, "second");

    server.stop();
}

#[test]
fn listener_protocol_display_matches_config_names() {
    assert_eq!(ListenerProtocol::Udp.to_string(), "udp");
    assert_eq!(ListenerProtocol::Tcp.to_string(), "tcp");
    assert_eq!(ListenerProtocol::TcpTls.to_string(), "tcp+tls");
    assert_eq!(ListenerProtocol::Unixgram.to_string(), "unixgram");
}

#[test]
fn clock_is_send_and_sync_for_sharing_across_tasks() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<syslog_ingest::clock::SharedClock>();
    let _ = system_clock();
}
