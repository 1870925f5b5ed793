// Tactus - A Statsd and Dogstatsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::types::Datagram;
use std::panic::RefUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Delivery counters reported by a sink.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub bytes_sent: u64,
    pub packets_sent: u64,
    pub bytes_dropped: u64,
    pub packets_dropped: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SocketStats {
    bytes_sent: Arc<AtomicU64>,
    packets_sent: Arc<AtomicU64>,
    bytes_dropped: Arc<AtomicU64>,
    packets_dropped: Arc<AtomicU64>,
}

impl SocketStats {
    pub(crate) fn incr_bytes_sent(&self, n: u64) {
        self.bytes_sent.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn incr_packets_sent(&self) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_bytes_dropped(&self, n: u64) {
        self.bytes_dropped.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn incr_packets_dropped(&self) {
        self.packets_dropped.fetch_add(1, Ordering::Relaxed);
    }
}

impl From<&SocketStats> for SinkStats {
    fn from(stats: &SocketStats) -> Self {
        SinkStats {
            bytes_sent: stats.bytes_sent.load(Ordering::Relaxed),
            packets_sent: stats.packets_sent.load(Ordering::Relaxed),
            bytes_dropped: stats.bytes_dropped.load(Ordering::Relaxed),
            packets_dropped: stats.packets_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Trait for the backends that encoded datagrams are dispatched to.
///
/// Sinks are fire-and-forget: `accept` has no way to fail, and transport
/// problems must be swallowed by the sink rather than surfaced into the
/// metric call that produced the datagram. The datagram source is in the
/// canonical format for a Statsd server and does not include a trailing
/// newline. Examples of each supported metric type are given below.
///
/// ## Counter
///
/// ``` text
/// some.counter:123|c
/// ```
///
/// ## Timing
///
/// ``` text
/// some.timer:456|ms
/// ```
///
/// ## Gauge
///
/// ``` text
/// some.gauge:5|g
/// ```
///
/// ## Set
///
/// ``` text
/// some.set:2|s
/// ```
///
/// ## Distribution
///
/// ``` text
/// some.distribution:2|d
/// ```
///
/// ## Histogram
///
/// ``` text
/// some.histogram:4|h
/// ```
///
/// See the [Statsd spec](https://github.com/b/statsd_spec) for more
/// information.
pub trait Sink {
    /// Handle a single encoded datagram.
    ///
    /// Implementations must not panic on delivery failure; a datagram that
    /// cannot be delivered is dropped.
    fn accept(&self, datagram: &Datagram);

    /// Return I/O telemetry like bytes / packets sent or dropped.
    ///
    /// Note that not all sinks implement this method and the default
    /// implementation returns zeros.
    fn stats(&self) -> SinkStats {
        SinkStats::default()
    }
}

/// Sink shared between clients, with the bounds the sink slot requires.
pub type SharedSink = Arc<dyn Sink + Send + Sync + RefUnwindSafe>;

/// Implementation of a `Sink` that discards all datagrams.
///
/// Useful for disabling metric collection or unit tests. This is the sink
/// used by `Client::default()`, where no transport is configured.
#[derive(Debug, Clone, Default)]
pub struct NopSink;

impl Sink for NopSink {
    fn accept(&self, _datagram: &Datagram) {}
}

/// Forwarding impl so a shared handle to a sink can be used as a sink
/// itself, for example to keep a `CaptureSink` handle while a client owns
/// the same sink.
impl<T> Sink for Arc<T>
where
    T: Sink + ?Sized,
{
    fn accept(&self, datagram: &Datagram) {
        (**self).accept(datagram)
    }

    fn stats(&self) -> SinkStats {
        (**self).stats()
    }
}

#[cfg(test)]
mod tests {
    use super::{NopSink, SharedSink, Sink, SinkStats};
    use crate::builder::{DatagramBuilder, ProtocolVariant};
    use crate::types::{MetricType, MetricValue};
    use std::sync::Arc;

    #[test]
    fn test_nop_sink() {
        let datagram = DatagramBuilder::new(ProtocolVariant::Standard, "")
            .datagram(MetricType::Counter, "baz", MetricValue::Signed(4), 1.0, &[])
            .unwrap();

        let sink = NopSink;
        sink.accept(&datagram);

        assert_eq!(SinkStats::default(), sink.stats());
    }

    #[test]
    fn test_shared_handle_used_as_sink() {
        let datagram = DatagramBuilder::new(ProtocolVariant::Standard, "")
            .datagram(MetricType::Counter, "baz", MetricValue::Signed(4), 1.0, &[])
            .unwrap();

        let shared: SharedSink = Arc::new(NopSink);
        shared.accept(&datagram);

        assert_eq!(SinkStats::default(), Sink::stats(&shared));
    }
}
