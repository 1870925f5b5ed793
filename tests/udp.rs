use std::net::UdpSocket;
use std::str;
use std::time::Duration;
use tactus::{Client, ProtocolVariant, Sink, UdpSink};

mod utils;
use utils::run_arc_threaded_test;

// Returns a client sending to a local receiver socket, plus the receiver
fn new_udp_client(prefix: &str, variant: ProtocolVariant) -> (Client, UdpSocket) {
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    server.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

    let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    let sink = UdpSink::from(server.local_addr().unwrap(), socket).unwrap();
    let client = Client::builder(prefix, sink).with_protocol(variant).build();

    (client, server)
}

#[test]
fn test_client_udp_sink_datagram_received() {
    let (client, server) = new_udp_client("udp.test", ProtocolVariant::Standard);

    client.increment("messages.sent", 1).unwrap();

    let mut buf = [0u8; 1024];
    let (len, _addr) = server.recv_from(&mut buf).unwrap();
    assert_eq!("udp.test.messages.sent:1|c", str::from_utf8(&buf[..len]).unwrap());
}

#[test]
fn test_client_udp_sink_tagged_datagram_received() {
    let (client, server) = new_udp_client("udp.test", ProtocolVariant::Tagged);

    client
        .measure_with_tags("query.time", 42)
        .with_tag("table", "users")
        .try_send()
        .unwrap();

    let mut buf = [0u8; 1024];
    let (len, _addr) = server.recv_from(&mut buf).unwrap();
    assert_eq!(
        "udp.test.query.time:42|ms|#table:users",
        str::from_utf8(&buf[..len]).unwrap()
    );
}

#[test]
fn test_client_udp_sink_stats() {
    let (client, _server) = new_udp_client("udp.test", ProtocolVariant::Standard);

    client.increment("messages.sent", 1).unwrap();

    let stats = client.sink().stats();
    assert_eq!(1, stats.packets_sent);
    assert_eq!("udp.test.messages.sent:1|c".len() as u64, stats.bytes_sent);
    assert_eq!(0, stats.packets_dropped);
}

#[test]
fn test_client_udp_sink_dropped_stats() {
    let (client, _server) = new_udp_client("udp.test", ProtocolVariant::Standard);

    // Encodes past the 65507 byte UDP payload limit, so the send fails
    // locally. The call must still succeed with the failure counted as a
    // drop in the sink stats.
    let name = "a".repeat(70_000);
    client.incr(&name).unwrap();

    let stats = client.sink().stats();
    assert_eq!(0, stats.packets_sent);
    assert_eq!(0, stats.bytes_sent);
    assert_eq!(1, stats.packets_dropped);
    assert_eq!(("udp.test.".len() + name.len() + ":1|c".len()) as u64, stats.bytes_dropped);
}

#[test]
fn test_client_udp_sink_single_threaded() {
    let (client, _server) = new_udp_client("tactus", ProtocolVariant::Tagged);
    run_arc_threaded_test(client, 1, 1);
}

#[test]
fn test_client_udp_sink_many_threaded() {
    let (client, _server) = new_udp_client("tactus", ProtocolVariant::Tagged);
    run_arc_threaded_test(client, 4, 4);
}
