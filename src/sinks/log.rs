// Tactus - A Statsd and Dogstatsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::sinks::core::Sink;
use crate::types::Datagram;
use log::{log, Level};

/// Implementation of a `Sink` that emits datagrams to the `log` crate.
///
/// Datagrams are written in their wire format, one per log record, using
/// the target `statsd` and a level picked at construction. This is useful
/// for debugging instrumentation locally or for running in environments
/// where no Statsd server is available.
///
/// # Example
///
/// ```
/// use log::Level;
/// use tactus::{Client, LogSink};
///
/// let sink = LogSink::new(Level::Info);
/// let client = Client::from_sink("my.prefix", sink);
/// ```
#[derive(Debug, Clone)]
pub struct LogSink {
    level: Level,
}

impl LogSink {
    /// Construct a new `LogSink` that emits records at the given level.
    pub fn new(level: Level) -> LogSink {
        LogSink { level }
    }
}

impl Default for LogSink {
    /// Construct a `LogSink` that emits records at debug level.
    fn default() -> Self {
        LogSink::new(Level::Debug)
    }
}

impl Sink for LogSink {
    fn accept(&self, datagram: &Datagram) {
        log!(target: "statsd", self.level, "{}", datagram.source());
    }
}
