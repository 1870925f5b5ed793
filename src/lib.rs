// Tactus - A Statsd and Dogstatsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A Statsd and Dogstatsd client for Rust!
//!
//! Tactus is a fast and flexible way to emit Statsd metrics from your application.
//!
//! ## Features
//!
//! * Support for emitting counters, timings, gauges, sets, distributions, and
//!   histograms to Statsd over UDP.
//! * Support for the [Datadog](https://docs.datadoghq.com/developers/dogstatsd/)
//!   dialect of the protocol (metric tags, distributions, histograms) via an
//!   opt-in protocol variant.
//! * Client side sampling, with the rate recorded on the wire so servers can
//!   scale counts back up.
//! * Support for alternate backends via the `Sink` trait, including a capture
//!   sink for asserting on emitted metrics in tests and a sink that routes
//!   datagrams through the `log` crate.
//! * A simple yet flexible API for sending metrics.
//!
//! ## Install
//!
//! To make use of `tactus` in your project, add it as a dependency in your
//! `Cargo.toml` file.
//!
//! ```toml
//! [dependencies]
//! tactus = "x.y.z"
//! ```
//!
//! That's all you need!
//!
//! ## Usage
//!
//! Some examples of how to use Tactus are shown below. The examples start
//! simple and work up to how you should be using Tactus in a production
//! application.
//!
//! ### Simple Use
//!
//! Simple usage of Tactus is shown below. In this example, we just import
//! the client, create an instance that will write to some imaginary metrics
//! server, and send a few metrics.
//!
//! ```rust,no_run
//! use std::net::UdpSocket;
//! use tactus::{Client, UdpSink, DEFAULT_PORT};
//!
//! // Create client that will write to the given host over UDP.
//! //
//! // Note that you'll probably want to actually handle any errors creating
//! // the client when you use it for real in your application. We're just
//! // using .unwrap() here since this is an example!
//! let host = ("metrics.example.com", DEFAULT_PORT);
//! let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
//! let sink = UdpSink::from(host, socket).unwrap();
//! let client = Client::from_sink("my.metrics", sink);
//!
//! // Emit metrics!
//! client.incr("some.counter");
//! client.measure("some.methodCall", 42);
//! client.gauge("some.thing", 7);
//! client.set("users.uniques", 42);
//! ```
//!
//! ### Tagged Metrics
//!
//! Tags are an extension to the Statsd protocol and so not all servers
//! support them, which is why a client encodes them only when built with
//! `ProtocolVariant::Tagged`. A `Standard` client silently drops tags and
//! rejects the two metric types that only exist in the tagged dialect,
//! distributions and histograms.
//!
//! See the [Datadog docs](https://docs.datadoghq.com/developers/dogstatsd/)
//! for more information.
//!
//! ```rust
//! use tactus::{Client, NopSink, ProtocolVariant};
//!
//! let client = Client::builder("my.prefix", NopSink)
//!     .with_protocol(ProtocolVariant::Tagged)
//!     .with_tag("environment", "production")
//!     .build();
//!
//! let datagrams = client.capture(|| {
//!     client.increment_with_tags("my.counter", 29)
//!         .with_tag("host", "web03.example.com")
//!         .with_tag_value("beta-test")
//!         .try_send()
//!         .unwrap();
//! });
//!
//! assert_eq!(
//!     concat!(
//!         "my.prefix.my.counter:29|c|#",
//!         "environment:production,",
//!         "host:web03.example.com,",
//!         "beta-test"
//!     ),
//!     datagrams[0].source()
//! );
//! ```
//!
//! ### Sampling
//!
//! High volume call sites can ask for only a fraction of calls to be sent,
//! either per client or per call. The sampling decision is made before the
//! datagram is rendered, and sent datagrams carry the rate so the server
//! can scale counts back up.
//!
//! ```rust
//! use tactus::{Client, NopSink};
//!
//! let client = Client::builder("my.prefix", NopSink)
//!     .with_default_sample_rate(0.1)
//!     .build();
//!
//! // Roughly one in ten of these calls is sent, each with a `|@0.1` suffix
//! for _ in 0..100 {
//!     client.incr("requests.handled");
//! }
//!
//! // A per-call rate wins over the client default
//! client.measure_with_tags("database.query", 42)
//!     .with_sample_rate(0.5)
//!     .send();
//! ```
//!
//! ### Capturing Metrics In Tests
//!
//! Asserting on the metrics your code emits doesn't require any test
//! doubles: `Client::capture` records every datagram emitted while a
//! closure runs, then puts the client back the way it was. The datagrams
//! still reach the client's usual sink.
//!
//! ```rust
//! use tactus::Client;
//!
//! let client = Client::default();
//!
//! let datagrams = client.capture(|| {
//!     client.incr("jobs.started").unwrap();
//!     client.measure("jobs.duration", 157).unwrap();
//! });
//!
//! assert_eq!(2, datagrams.len());
//! assert_eq!("jobs.started:1|c", datagrams[0].source());
//! assert_eq!("jobs.duration:157|ms", datagrams[1].source());
//! ```
//!
//! ### Scoped Overrides
//!
//! Different parts of an application often want slightly different
//! settings, like an extra tag or a more aggressive sample rate, without
//! the cost of building a whole new client stack. Derived clients share
//! the sink and error handler of the client they came from; everything
//! else can be overridden. The original client is never changed.
//!
//! ```rust
//! use tactus::{Client, NopSink, ProtocolVariant};
//!
//! let client = Client::from_sink("app", NopSink);
//!
//! // Derive a client for one subsystem without touching the original
//! let billing = client.clone_with_options(|options| {
//!     options.with_protocol(ProtocolVariant::Tagged).with_tag("subsystem", "billing")
//! });
//!
//! let datagrams = billing.capture(|| {
//!     billing.incr("invoices.created").unwrap();
//! });
//! assert_eq!("app.invoices.created:1|c|#subsystem:billing", datagrams[0].source());
//!
//! // Or scope the overrides to a closure
//! client.with_options(
//!     |options| options.with_default_sample_rate(0.5),
//!     |sampled| {
//!         sampled.incr("only.sometimes");
//!     },
//! );
//! ```
//!
//! ### Quiet Metric Sending and Error Handling
//!
//! When sending metrics sometimes you don't really care about the `Result`
//! of trying to send it or maybe you just don't want to deal with it inline
//! with the rest of your code. In order to handle this, Tactus allows you
//! to set a default error handler. This handler is invoked when there are
//! errors sending metrics so that the calling code doesn't have to deal
//! with them.
//!
//! An example of configuring an error handler and an example of when it
//! might be invoked is given below.
//!
//! ```rust,no_run
//! use tactus::{Client, MetricError, NopSink};
//!
//! fn my_error_handler(err: MetricError) {
//!     println!("Metric error! {}", err);
//! }
//!
//! let client = Client::builder("prefix", NopSink)
//!     .with_error_handler(my_error_handler)
//!     .build();
//!
//! // When sending metrics via the `MetricBuilder` used for assembling tags,
//! // callers may opt into sending metrics quietly via the `.send()` method
//! // as opposed to the `.try_send()` method
//! client.increment_with_tags("some.counter", 42)
//!     .with_tag("region", "us-east-2")
//!     .send();
//! ```
//!
//! ### Custom Sinks
//!
//! The Tactus `Client` uses implementations of the `Sink` trait to emit
//! finished datagrams. Most users will want `UdpSink`, but maybe you want
//! to do something not covered by an existing sink. An example of creating
//! a custom sink is below.
//!
//! ```rust,no_run
//! use tactus::{Client, Datagram, Sink};
//!
//! pub struct PrintingSink;
//!
//! impl Sink for PrintingSink {
//!     fn accept(&self, datagram: &Datagram) {
//!         println!("{}", datagram.source());
//!     }
//! }
//!
//! let client = Client::from_sink("my.prefix", PrintingSink);
//!
//! client.increment("my.counter.thing", 42);
//! client.measure("my.method.time", 25);
//! ```
//!
//! ### Custom UDP Socket
//!
//! Most users of the Tactus `Client` will be using it to send metrics over
//! a UDP socket. If you need to customize the socket, for example you want
//! to use the socket in blocking mode but set a write timeout, you can do
//! that as demonstrated below.
//!
//! ```rust,no_run
//! use std::net::UdpSocket;
//! use std::time::Duration;
//! use tactus::{Client, UdpSink, DEFAULT_PORT};
//!
//! let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
//! socket.set_write_timeout(Some(Duration::from_millis(1))).unwrap();
//!
//! let host = ("metrics.example.com", DEFAULT_PORT);
//! let sink = UdpSink::from(host, socket).unwrap();
//! let client = Client::from_sink("my.prefix", sink);
//!
//! client.increment("my.counter.thing", 29);
//! client.measure("my.service.call", 214);
//! client.incr("some.event");
//! client.set("users.uniques", 42);
//! ```

#![forbid(unsafe_code)]

pub const DEFAULT_PORT: u16 = 8125;

pub use self::builder::{DatagramBuilder, MetricBuilder, ProtocolVariant};

pub use self::client::{Client, ClientBuilder};

pub use self::sinks::{CaptureSink, LogSink, NopSink, SharedSink, Sink, SinkStats, UdpSink};

pub use self::types::{Datagram, ErrorKind, MetricError, MetricResult, MetricType, MetricValue};

mod builder;
mod client;
pub mod ext;
mod sinks;
mod types;
