// Tactus - A Statsd and Dogstatsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

mod capture;
mod core;
mod log;
mod udp;

pub use crate::sinks::capture::CaptureSink;
pub use crate::sinks::core::{NopSink, SharedSink, Sink, SinkStats};
pub use crate::sinks::log::LogSink;
pub use crate::sinks::udp::UdpSink;
