// Tactus - A Statsd and Dogstatsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::sinks::core::{Sink, SinkStats, SocketStats};
use crate::types::{Datagram, ErrorKind, MetricError, MetricResult};
use log::debug;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Attempt to convert anything implementing the `ToSocketAddrs` trait
/// into a concrete `SocketAddr` instance, returning an `InvalidInput`
/// error if the address could not be parsed.
// Public portion of the API (the sink constructor) is pass by value so
// there's no point in changing this to be pass by reference yet.
#[allow(clippy::needless_pass_by_value)]
fn get_addr<A: ToSocketAddrs>(addr: A) -> MetricResult<SocketAddr> {
    match addr.to_socket_addrs()?.next() {
        Some(addr) => Ok(addr),
        None => Err(MetricError::from((
            ErrorKind::InvalidInput,
            "No socket addresses yielded",
        ))),
    }
}

/// Implementation of a `Sink` that emits datagrams over UDP.
///
/// It accepts a UDP socket instance over which to write datagrams and the
/// address of the Statsd server to send packets to. Each datagram is sent
/// when `accept` is called, in the thread of the caller, one packet per
/// datagram.
///
/// Send failures are swallowed: they are counted as dropped packets in the
/// sink's `stats()` and reported through the `log` crate at debug level,
/// never surfaced into the metric call.
#[derive(Debug)]
pub struct UdpSink {
    addr: SocketAddr,
    socket: UdpSocket,
    stats: SocketStats,
}

impl UdpSink {
    /// Construct a new `UdpSink` instance.
    ///
    /// The address should be the address of the remote metric server to
    /// emit datagrams to over UDP. The socket should already be bound to a
    /// local address with any desired configuration applied (blocking vs
    /// non-blocking, timeouts, etc.).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::net::UdpSocket;
    /// use tactus::{UdpSink, DEFAULT_PORT};
    ///
    /// let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    /// let host = ("metrics.example.com", DEFAULT_PORT);
    /// let sink = UdpSink::from(host, socket);
    /// ```
    ///
    /// To send datagrams over a non-blocking socket, simply put the socket
    /// in non-blocking mode before creating the UDP sink.
    ///
    /// # Failures
    ///
    /// This method may fail if:
    ///
    /// * It is unable to resolve the hostname of the metric server.
    /// * The host address is otherwise unable to be parsed
    pub fn from<A>(to_addr: A, socket: UdpSocket) -> MetricResult<UdpSink>
    where
        A: ToSocketAddrs,
    {
        let addr = get_addr(to_addr)?;
        let stats = SocketStats::default();
        Ok(UdpSink { addr, socket, stats })
    }
}

impl Sink for UdpSink {
    fn accept(&self, datagram: &Datagram) {
        let bytes = datagram.source().as_bytes();
        match self.socket.send_to(bytes, self.addr) {
            Ok(written) => {
                self.stats.incr_bytes_sent(written as u64);
                self.stats.incr_packets_sent();
            }
            Err(e) => {
                self.stats.incr_bytes_dropped(bytes.len() as u64);
                self.stats.incr_packets_dropped();
                debug!("dropped metric {} due to send error: {}", datagram.name(), e);
            }
        }
    }

    fn stats(&self) -> SinkStats {
        (&self.stats).into()
    }
}

#[cfg(test)]
mod tests {
    use super::{get_addr, Sink, UdpSink};
    use crate::builder::{DatagramBuilder, ProtocolVariant};
    use crate::types::{MetricType, MetricValue};
    use std::net::UdpSocket;

    #[test]
    fn test_get_addr_bad_address() {
        let res = get_addr("asdf");
        assert!(res.is_err());
    }

    #[test]
    fn test_get_addr_valid_address() {
        let res = get_addr("127.0.0.1:8125");
        assert!(res.is_ok());
    }

    #[test]
    fn test_udp_sink_sends_and_counts() {
        let datagram = DatagramBuilder::new(ProtocolVariant::Standard, "")
            .datagram(MetricType::Counter, "buz", MetricValue::Signed(1), 1.0, &[])
            .unwrap();

        let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
        let sink = UdpSink::from("127.0.0.1:8125", socket).unwrap();
        sink.accept(&datagram);

        let stats = sink.stats();
        assert_eq!(1, stats.packets_sent);
        assert_eq!(datagram.source().len() as u64, stats.bytes_sent);
    }

    #[test]
    fn test_udp_sink_counts_dropped_packets() {
        // Bigger than the 65507 byte UDP payload limit, so the send fails
        // at the socket no matter what is listening.
        let name = "a".repeat(70_000);
        let datagram = DatagramBuilder::new(ProtocolVariant::Standard, "")
            .datagram(MetricType::Counter, &name, MetricValue::Signed(1), 1.0, &[])
            .unwrap();

        let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
        let sink = UdpSink::from("127.0.0.1:8125", socket).unwrap();
        sink.accept(&datagram);

        let stats = sink.stats();
        assert_eq!(0, stats.packets_sent);
        assert_eq!(0, stats.bytes_sent);
        assert_eq!(1, stats.packets_dropped);
        assert_eq!(datagram.source().len() as u64, stats.bytes_dropped);
    }

    #[test]
    fn test_non_blocking_udp_sink() {
        let datagram = DatagramBuilder::new(ProtocolVariant::Standard, "")
            .datagram(MetricType::Counter, "baz", MetricValue::Signed(1), 1.0, &[])
            .unwrap();

        let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
        socket.set_nonblocking(true).unwrap();
        let sink = UdpSink::from("127.0.0.1:8125", socket).unwrap();
        sink.accept(&datagram);

        assert_eq!(1, sink.stats().packets_sent);
    }
}
