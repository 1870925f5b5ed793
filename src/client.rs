// Tactus - A Statsd and Dogstatsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::builder::{sampler, DatagramBuilder, MetricBuilder, PendingMetric, ProtocolVariant};
use crate::sinks::{CaptureSink, NopSink, SharedSink, Sink};
use crate::types::{Datagram, ErrorKind, MetricError, MetricResult, MetricType, MetricValue};
use std::fmt;
use std::panic::RefUnwindSafe;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Conversion trait for valid values for counters
///
/// This trait must be implemented for any types that are used as counter
/// values (currently only `i64`). This trait is internal to how values are
/// formatted as part of metrics but is exposed publicly for documentation
/// purposes.
///
/// Typical use of Tactus shouldn't require interacting with this trait.
pub trait ToCounterValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToCounterValue for i64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Signed(self))
    }
}

/// Conversion trait for valid values for timings
///
/// This trait must be implemented for any types that are used as timing
/// values (currently `u64`, `f64`, and `Duration`). This trait is internal
/// to how values are formatted as part of metrics but is exposed publicly
/// for documentation purposes.
///
/// Typical use of Tactus shouldn't require interacting with this trait.
pub trait ToTimingValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToTimingValue for u64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Unsigned(self))
    }
}

impl ToTimingValue for f64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Float(self))
    }
}

impl ToTimingValue for Duration {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        let as_millis = self.as_millis();
        if as_millis > u64::MAX as u128 {
            Err(MetricError::from((ErrorKind::InvalidInput, "u64 overflow")))
        } else {
            Ok(MetricValue::Unsigned(as_millis as u64))
        }
    }
}

/// Conversion trait for valid values for gauges
///
/// This trait must be implemented for any types that are used as gauge
/// values (currently `u64` and `f64`). This trait is internal to how values
/// are formatted as part of metrics but is exposed publicly for
/// documentation purposes.
///
/// Typical use of Tactus shouldn't require interacting with this trait.
pub trait ToGaugeValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToGaugeValue for u64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Unsigned(self))
    }
}

impl ToGaugeValue for f64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Float(self))
    }
}

/// Conversion trait for valid values for sets
///
/// This trait must be implemented for any types that are used as set values
/// (currently `i64`, `&str`, and `String`). This trait is internal to how
/// values are formatted as part of metrics but is exposed publicly for
/// documentation purposes.
///
/// Typical use of Tactus shouldn't require interacting with this trait.
pub trait ToSetValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToSetValue for i64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Signed(self))
    }
}

impl ToSetValue for &str {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Text(self.to_string()))
    }
}

impl ToSetValue for String {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Text(self))
    }
}

/// Conversion trait for valid values for distributions
///
/// This trait must be implemented for any types that are used as
/// distribution values (currently `u64` and `f64`). This trait is internal
/// to how values are formatted as part of metrics but is exposed publicly
/// for documentation purposes.
///
/// Typical use of Tactus shouldn't require interacting with this trait.
pub trait ToDistributionValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToDistributionValue for u64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Unsigned(self))
    }
}

impl ToDistributionValue for f64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Float(self))
    }
}

/// Conversion trait for valid values for histograms
///
/// This trait must be implemented for any types that are used as histogram
/// values (currently `u64`, `f64`, and `Duration`). This trait is internal
/// to how values are formatted as part of metrics but is exposed publicly
/// for documentation purposes.
///
/// Typical use of Tactus shouldn't require interacting with this trait.
pub trait ToHistogramValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToHistogramValue for u64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Unsigned(self))
    }
}

impl ToHistogramValue for f64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Float(self))
    }
}

impl ToHistogramValue for Duration {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        let as_nanos = self.as_nanos();
        if as_nanos > u64::MAX as u128 {
            Err(MetricError::from((ErrorKind::InvalidInput, "u64 overflow")))
        } else {
            Ok(MetricValue::Unsigned(as_nanos as u64))
        }
    }
}

type ErrorHandler = dyn Fn(MetricError) + Sync + Send + RefUnwindSafe + 'static;

/// Builder for creating and customizing `Client` instances.
///
/// Instances of the builder should be created by calling the `::builder()`
/// method on the `Client` struct.
///
/// # Example
///
/// ```
/// use tactus::{Client, MetricError, NopSink, ProtocolVariant};
///
/// fn my_error_handler(err: MetricError) {
///     println!("Metric error! {}", err);
/// }
///
/// let client = Client::builder("prefix", NopSink)
///     .with_protocol(ProtocolVariant::Tagged)
///     .with_error_handler(my_error_handler)
///     .with_tag("environment", "production")
///     .with_tag_value("rust")
///     .build();
///
/// let _ = client.increment("something", 123);
/// client.increment_with_tags("some.counter", 42)
///     .with_tag("region", "us-east-2")
///     .send();
/// ```
pub struct ClientBuilder {
    prefix: String,
    sink: SharedSink,
    variant: ProtocolVariant,
    default_sample_rate: f64,
    tags: Vec<(Option<String>, String)>,
    errors: Arc<ErrorHandler>,
}

impl ClientBuilder {
    // Set the required fields and defaults for optional fields
    fn new<T>(prefix: &str, sink: T) -> Self
    where
        T: Sink + Sync + Send + RefUnwindSafe + 'static,
    {
        ClientBuilder {
            // required
            prefix: prefix.to_string(),
            sink: Arc::new(sink),

            // optional with defaults
            variant: ProtocolVariant::Standard,
            default_sample_rate: 1.0,
            tags: Vec::new(),
            errors: Arc::new(nop_error_handler),
        }
    }

    /// Set the protocol variant datagrams are encoded with.
    ///
    /// The default is `ProtocolVariant::Standard`, the plain Statsd
    /// protocol that drops tags and rejects distribution and histogram
    /// metrics. Use `ProtocolVariant::Tagged` for servers that understand
    /// the Dogstatsd dialect.
    pub fn with_protocol(mut self, variant: ProtocolVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Set the sample rate used by metric calls that don't pick their own.
    ///
    /// The default is `1.0`, meaning every call is sent. Rates must lie in
    /// the range `(0.0, 1.0]`; anything else is rejected with
    /// `ErrorKind::InvalidInput` when a metric is sent.
    pub fn with_default_sample_rate(mut self, rate: f64) -> Self {
        self.default_sample_rate = rate;
        self
    }

    /// Add a default tag with key and value to every metric published by
    /// the built [Client].
    pub fn with_tag<K, V>(mut self, key: K, value: V) -> Self
    where
        K: ToString,
        V: ToString,
    {
        self.tags.push((Some(key.to_string()), value.to_string()));
        self
    }

    /// Add a default tag with only a value to every metric published by the
    /// built [Client].
    pub fn with_tag_value<K>(mut self, value: K) -> Self
    where
        K: ToString,
    {
        self.tags.push((None, value.to_string()));
        self
    }

    /// Remove all default tags added so far.
    ///
    /// Useful with `Client::clone_with_options` to derive a client that
    /// does not inherit the default tags of the original.
    pub fn clear_tags(mut self) -> Self {
        self.tags.clear();
        self
    }

    /// Replace the sink metrics are emitted to.
    pub fn with_sink<T>(mut self, sink: T) -> Self
    where
        T: Sink + Sync + Send + RefUnwindSafe + 'static,
    {
        self.sink = Arc::new(sink);
        self
    }

    /// Replace the sink metrics are emitted to with an already shared sink.
    ///
    /// Unlike `with_sink` this reuses the given allocation, so a handle
    /// kept by the caller and the sink used by the client stay the same
    /// object.
    pub fn with_shared_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    /// Set an error handler to use for metrics sent via `MetricBuilder::send()`
    ///
    /// The error handler is only invoked when metrics are not able to be
    /// sent correctly, for example due to invalid input such as an
    /// out-of-range sample rate.
    ///
    /// The error handler should consume the error without panicking. The
    /// error may be logged, printed to stderr, discarded, etc. - this is up
    /// to the implementation.
    pub fn with_error_handler<F>(mut self, errors: F) -> Self
    where
        F: Fn(MetricError) + Sync + Send + RefUnwindSafe + 'static,
    {
        self.errors = Arc::new(errors);
        self
    }

    /// Construct a new `Client` instance based on current settings.
    pub fn build(self) -> Client {
        Client::from_builder(self)
    }
}

/// Client for Statsd and Dogstatsd servers.
///
/// # Metrics
///
/// The client is the main entry point for users of this library. Each
/// metric type has a method that sends immediately using the client's
/// defaults and a `*_with_tags` companion returning a `MetricBuilder` for
/// attaching tags or a per-call sample rate.
///
/// * `increment` (plus `incr` / `decr` sugar) for counters.
/// * `measure` for timings in milliseconds.
/// * `gauge` for instantaneous values.
/// * `set` for counting unique members of a group.
/// * `distribution` for globally aggregated value distributions.
/// * `histogram` for server-aggregated value distributions.
///
/// For more information about the uses for each type of metric, see the
/// documentation for each method.
///
/// # Protocol variants
///
/// The client encodes datagrams for one of two wire dialects, fixed when
/// the client is built: `ProtocolVariant::Standard` (plain Statsd; tags are
/// dropped, distribution and histogram metrics are rejected) or
/// `ProtocolVariant::Tagged` (the Dogstatsd dialect; all six metric types,
/// tags rendered on the wire).
///
/// # Sinks
///
/// The client uses some implementation of a `Sink` to emit the metrics,
/// typically `UdpSink` in production. `NopSink` disables emission, `LogSink`
/// routes datagrams through the `log` crate, and `CaptureSink` records them
/// for inspection in tests, most easily via `Client::capture`.
///
/// # Threading
///
/// The client is designed to work in a multithreaded application. All parts
/// of it can be shared between threads (i.e. it is `Send` and `Sync`). An
/// example of how to use the client in a multithreaded environment is given
/// below.
///
/// In the following example, we create a struct `MyRequestHandler` that has
/// a single method that spawns a thread to do some work and emit a metric.
///
/// ## Wrapping With An `Arc`
///
/// In order to share a client between multiple threads, you'll need to wrap
/// it with an atomic reference counting pointer (`std::sync::Arc`).
///
/// ``` no_run
/// use std::net::UdpSocket;
/// use std::sync::Arc;
/// use std::thread;
/// use tactus::{Client, UdpSink, DEFAULT_PORT};
///
/// struct MyRequestHandler {
///     metrics: Arc<Client>,
/// }
///
/// impl MyRequestHandler {
///     fn new() -> MyRequestHandler {
///         let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
///         let host = ("localhost", DEFAULT_PORT);
///         let sink = UdpSink::from(host, socket).unwrap();
///         MyRequestHandler {
///             metrics: Arc::new(Client::from_sink("some.prefix", sink)),
///         }
///     }
///
///     fn handle_some_request(&self) -> Result<(), String> {
///         let metric_ref = self.metrics.clone();
///         let _t = thread::spawn(move || {
///             println!("Hello from the thread!");
///             let _ = metric_ref.incr("request.handler");
///         });
///
///         Ok(())
///     }
/// }
/// ```
pub struct Client {
    builder: DatagramBuilder,
    default_sample_rate: f64,
    sink: RwLock<SharedSink>,
    errors: Arc<ErrorHandler>,
}

impl Client {
    /// Create a new client instance that will use the given prefix for all
    /// metrics emitted to the given `Sink` implementation, using the
    /// `Standard` protocol variant and a default sample rate of `1.0`.
    ///
    /// Note that this client will discard errors encountered when sending
    /// metrics via the `MetricBuilder::send()` method.
    ///
    /// # No-op Example
    ///
    /// ```
    /// use tactus::{Client, NopSink};
    ///
    /// let prefix = "my.stats";
    /// let client = Client::from_sink(prefix, NopSink);
    /// ```
    ///
    /// # UDP Socket Example
    ///
    /// ```
    /// use std::net::UdpSocket;
    /// use tactus::{Client, UdpSink, DEFAULT_PORT};
    ///
    /// let prefix = "my.stats";
    /// let host = ("127.0.0.1", DEFAULT_PORT);
    ///
    /// let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    /// socket.set_nonblocking(true).unwrap();
    ///
    /// let sink = UdpSink::from(host, socket).unwrap();
    /// let client = Client::from_sink(prefix, sink);
    /// ```
    pub fn from_sink<T>(prefix: &str, sink: T) -> Self
    where
        T: Sink + Sync + Send + RefUnwindSafe + 'static,
    {
        Self::builder(prefix, sink).build()
    }

    /// Create a new builder with the provided prefix and sink.
    ///
    /// A prefix and a sink are required to create a new client instance.
    /// All other optional customizations can be set by calling methods on
    /// the returned builder. Any customizations that aren't set by the
    /// caller will use defaults.
    ///
    /// Note, though a metric prefix is required, you may pass an empty
    /// string as a prefix. In this case, the metrics emitted will use only
    /// the bare keys supplied when you call the various methods to emit
    /// metrics.
    ///
    /// General defaults:
    ///
    /// * The `Standard` protocol variant, so tags are dropped and
    ///   distribution or histogram metrics are rejected.
    /// * A default sample rate of `1.0`, sending every metric call.
    /// * No default tags.
    /// * A no-op error handler. Note that this only affects errors
    ///   encountered when using the `MetricBuilder::send()` method (as
    ///   opposed to `.try_send()` or any other method for sending metrics).
    ///
    /// # Example
    ///
    /// ```
    /// use tactus::{Client, MetricError, NopSink};
    ///
    /// fn my_handler(err: MetricError) {
    ///     println!("Metric error: {}", err);
    /// }
    ///
    /// let client = Client::builder("some.prefix", NopSink)
    ///     .with_error_handler(my_handler)
    ///     .build();
    ///
    /// client.gauge_with_tags("some.key", 7)
    ///    .with_tag("region", "us-west-1")
    ///    .send();
    /// ```
    pub fn builder<T>(prefix: &str, sink: T) -> ClientBuilder
    where
        T: Sink + Sync + Send + RefUnwindSafe + 'static,
    {
        ClientBuilder::new(prefix, sink)
    }

    // Create a new Client by consuming the builder
    fn from_builder(builder: ClientBuilder) -> Self {
        Client {
            builder: DatagramBuilder::with_default_tags(builder.variant, &builder.prefix, builder.tags),
            default_sample_rate: builder.default_sample_rate,
            sink: RwLock::new(builder.sink),
            errors: builder.errors,
        }
    }

    /// Return the protocol variant datagrams are encoded with.
    pub fn protocol(&self) -> ProtocolVariant {
        self.builder.variant()
    }

    /// Return the prefix prepended to every metric name, including its
    /// trailing `.` separator, or an empty string if no prefix was set.
    pub fn prefix(&self) -> &str {
        self.builder.prefix()
    }

    /// Return the sample rate used by metric calls that don't pick their
    /// own.
    pub fn default_sample_rate(&self) -> f64 {
        self.default_sample_rate
    }

    /// Return the tags applied to every metric, as `(key, value)` pairs
    /// where a `None` key marks a bare value tag. Only clients using the
    /// tagged protocol variant render them.
    pub fn default_tags(&self) -> &[(Option<String>, String)] {
        self.builder.default_tags()
    }

    /// Return a handle to the sink metrics are currently emitted to.
    ///
    /// Inside a `capture` scope this is the capture sink, not the sink the
    /// client was built with.
    pub fn sink(&self) -> SharedSink {
        self.sink.read().unwrap().clone()
    }

    /// Increment the counter for the given metric name by `value`.
    ///
    /// Counters are simple values incremented or decremented by a client.
    /// The rates at which these events occur or average values will be
    /// determined by the server receiving them. Examples of counter uses
    /// include number of logins to a system or requests received.
    ///
    /// The following types are valid counter values:
    /// * `i64`
    ///
    /// See the [Statsd spec](https://github.com/b/statsd_spec) for more
    /// information.
    pub fn increment<T>(&self, name: &str, value: T) -> MetricResult<()>
    where
        T: ToCounterValue,
    {
        self.increment_with_tags(name, value).try_send()
    }

    /// Increment the counter for the given metric name and return a
    /// `MetricBuilder` that can be used to add tags or a sample rate to the
    /// metric.
    pub fn increment_with_tags<'a, T>(&'a self, name: &'a str, value: T) -> MetricBuilder<'a, 'a>
    where
        T: ToCounterValue,
    {
        self.metric_builder(MetricType::Counter, name, value.try_to_value())
    }

    /// Increment the counter for the given metric name by one.
    pub fn incr(&self, name: &str) -> MetricResult<()> {
        self.increment(name, 1)
    }

    /// Increment the counter for the given metric name by one and return a
    /// `MetricBuilder` that can be used to add tags to the metric.
    pub fn incr_with_tags<'a>(&'a self, name: &'a str) -> MetricBuilder<'a, 'a> {
        self.increment_with_tags(name, 1)
    }

    /// Decrement the counter for the given metric name by one.
    pub fn decr(&self, name: &str) -> MetricResult<()> {
        self.increment(name, -1)
    }

    /// Decrement the counter for the given metric name by one and return a
    /// `MetricBuilder` that can be used to add tags to the metric.
    pub fn decr_with_tags<'a>(&'a self, name: &'a str) -> MetricBuilder<'a, 'a> {
        self.increment_with_tags(name, -1)
    }

    /// Record a timing in milliseconds with the given metric name.
    ///
    /// Timings are a positive number of milliseconds between a start and
    /// end time. Examples include time taken to render a web page or time
    /// taken for a database call to return. `Duration` values are converted
    /// to milliseconds before being recorded; sub-millisecond precision is
    /// truncated.
    ///
    /// The following types are valid timing values:
    /// * `u64`
    /// * `f64`
    /// * `Duration`
    ///
    /// See the [Statsd spec](https://github.com/b/statsd_spec) for more
    /// information.
    pub fn measure<T>(&self, name: &str, value: T) -> MetricResult<()>
    where
        T: ToTimingValue,
    {
        self.measure_with_tags(name, value).try_send()
    }

    /// Record a timing in milliseconds with the given metric name and
    /// return a `MetricBuilder` that can be used to add tags or a sample
    /// rate to the metric.
    pub fn measure_with_tags<'a, T>(&'a self, name: &'a str, value: T) -> MetricBuilder<'a, 'a>
    where
        T: ToTimingValue,
    {
        self.metric_builder(MetricType::Timing, name, value.try_to_value())
    }

    /// Record a gauge value with the given metric name.
    ///
    /// Gauge values are an instantaneous measurement of a value determined
    /// by the client. They do not change unless changed by the client.
    /// Examples include things like load average or how many connections
    /// are active.
    ///
    /// The following types are valid gauge values:
    /// * `u64`
    /// * `f64`
    ///
    /// See the [Statsd spec](https://github.com/b/statsd_spec) for more
    /// information.
    pub fn gauge<T>(&self, name: &str, value: T) -> MetricResult<()>
    where
        T: ToGaugeValue,
    {
        self.gauge_with_tags(name, value).try_send()
    }

    /// Record a gauge value with the given metric name and return a
    /// `MetricBuilder` that can be used to add tags or a sample rate to the
    /// metric.
    pub fn gauge_with_tags<'a, T>(&'a self, name: &'a str, value: T) -> MetricBuilder<'a, 'a>
    where
        T: ToGaugeValue,
    {
        self.metric_builder(MetricType::Gauge, name, value.try_to_value())
    }

    /// Record a single set value with the given metric name.
    ///
    /// Sets count the number of unique elements in a group. You can use
    /// them to, for example, count the unique visitors to your site.
    ///
    /// The following types are valid set values:
    /// * `i64`
    /// * `&str`
    /// * `String`
    ///
    /// See the [Statsd spec](https://github.com/b/statsd_spec) for more
    /// information.
    pub fn set<T>(&self, name: &str, value: T) -> MetricResult<()>
    where
        T: ToSetValue,
    {
        self.set_with_tags(name, value).try_send()
    }

    /// Record a single set value with the given metric name and return a
    /// `MetricBuilder` that can be used to add tags or a sample rate to the
    /// metric.
    pub fn set_with_tags<'a, T>(&'a self, name: &'a str, value: T) -> MetricBuilder<'a, 'a>
    where
        T: ToSetValue,
    {
        self.metric_builder(MetricType::Set, name, value.try_to_value())
    }

    /// Record a single distribution value with the given metric name.
    ///
    /// Similar to histograms, but applies globally. A distribution can be
    /// used to instrument logical objects, like services, independently
    /// from the underlying hosts.
    ///
    /// The following types are valid distribution values:
    /// * `u64`
    /// * `f64`
    ///
    /// Distributions are a [Datadog](https://docs.datadoghq.com/developers/dogstatsd/)
    /// extension: they require `ProtocolVariant::Tagged` and a `Standard`
    /// client rejects them with `ErrorKind::UnsupportedType`.
    pub fn distribution<T>(&self, name: &str, value: T) -> MetricResult<()>
    where
        T: ToDistributionValue,
    {
        self.distribution_with_tags(name, value).try_send()
    }

    /// Record a single distribution value with the given metric name and
    /// return a `MetricBuilder` that can be used to add tags or a sample
    /// rate to the metric.
    pub fn distribution_with_tags<'a, T>(&'a self, name: &'a str, value: T) -> MetricBuilder<'a, 'a>
    where
        T: ToDistributionValue,
    {
        self.metric_builder(MetricType::Distribution, name, value.try_to_value())
    }

    /// Record a single histogram value with the given metric name.
    ///
    /// Histogram values are positive values that can represent anything,
    /// whose statistical distribution is calculated by the server. The
    /// values can be timings, amount of some resource consumed, size of
    /// HTTP responses in some application, etc. Histograms can be thought
    /// of as a more general form of timings. `Duration` values are
    /// converted to nanoseconds before being emitted.
    ///
    /// The following types are valid histogram values:
    /// * `u64`
    /// * `f64`
    /// * `Duration`
    ///
    /// Histograms are a [Datadog](https://docs.datadoghq.com/developers/dogstatsd/)
    /// extension: they require `ProtocolVariant::Tagged` and a `Standard`
    /// client rejects them with `ErrorKind::UnsupportedType`.
    pub fn histogram<T>(&self, name: &str, value: T) -> MetricResult<()>
    where
        T: ToHistogramValue,
    {
        self.histogram_with_tags(name, value).try_send()
    }

    /// Record a single histogram value with the given metric name and
    /// return a `MetricBuilder` that can be used to add tags or a sample
    /// rate to the metric.
    pub fn histogram_with_tags<'a, T>(&'a self, name: &'a str, value: T) -> MetricBuilder<'a, 'a>
    where
        T: ToHistogramValue,
    {
        self.metric_builder(MetricType::Histogram, name, value.try_to_value())
    }

    /// Record every datagram emitted through this client while `scope`
    /// runs and return them.
    ///
    /// The current sink is wrapped in a `CaptureSink` that records each
    /// datagram and then forwards it, so metrics still reach their usual
    /// destination. When `scope` finishes the previous sink is restored,
    /// even if `scope` panics (the panic is propagated after the restore).
    ///
    /// Nesting captures works: an inner scope records into both its own
    /// capture and the enclosing one, since the inner sink forwards to the
    /// outer one.
    ///
    /// Captures running concurrently on the same client are not supported:
    /// each scope assumes it is the only one swapping the sink, so
    /// overlapping scopes can restore out of order. Give each thread its
    /// own derived client via `clone_with_options`, or wrap a shared
    /// `CaptureSink` by hand, if you need that.
    ///
    /// # Example
    ///
    /// ```
    /// use tactus::Client;
    ///
    /// let client = Client::default();
    /// let datagrams = client.capture(|| {
    ///     client.incr("jobs.started").unwrap();
    /// });
    ///
    /// assert_eq!(1, datagrams.len());
    /// assert_eq!("jobs.started:1|c", datagrams[0].source());
    /// ```
    pub fn capture<F>(&self, scope: F) -> Vec<Datagram>
    where
        F: FnOnce(),
    {
        let parent = self.sink();
        let capture = Arc::new(CaptureSink::wrap(parent.clone()));

        {
            let _restore = SinkRestore::install(self, capture.clone(), parent);
            scope();
        }

        capture.datagrams()
    }

    /// Build a derived client with the given overrides applied, run `scope`
    /// with it, and return whatever `scope` returns.
    ///
    /// The receiver is never mutated: overrides apply only to the derived
    /// client passed to `scope`. Settings that aren't overridden are
    /// inherited, including the sink and the error handler, both of which
    /// are shared with the receiver.
    ///
    /// # Example
    ///
    /// ```
    /// use tactus::{Client, ProtocolVariant};
    ///
    /// let client = Client::default();
    ///
    /// let datagrams = client.with_options(
    ///     |options| options.with_protocol(ProtocolVariant::Tagged).with_tag("env", "qa"),
    ///     |derived| {
    ///         derived.capture(|| {
    ///             derived.incr("jobs.started").unwrap();
    ///         })
    ///     },
    /// );
    ///
    /// assert_eq!("jobs.started:1|c|#env:qa", datagrams[0].source());
    /// ```
    pub fn with_options<F, S, R>(&self, options: F, scope: S) -> R
    where
        F: FnOnce(ClientBuilder) -> ClientBuilder,
        S: FnOnce(&Client) -> R,
    {
        let derived = self.clone_with_options(options);
        scope(&derived)
    }

    /// Build a derived client with the given overrides applied.
    ///
    /// Settings that aren't overridden are inherited from the receiver,
    /// including the sink and the error handler. The derived client is
    /// independent afterwards: captures or further derivations on one never
    /// affect the other.
    ///
    /// # Example
    ///
    /// ```
    /// use tactus::{Client, NopSink};
    ///
    /// let client = Client::from_sink("app", NopSink);
    /// let per_job = client.clone_with_options(|options| options.with_tag("job", "backfill"));
    ///
    /// assert_eq!("app.", per_job.prefix());
    /// ```
    pub fn clone_with_options<F>(&self, options: F) -> Client
    where
        F: FnOnce(ClientBuilder) -> ClientBuilder,
    {
        options(self.to_builder()).build()
    }

    // Snapshot current settings as a builder for deriving clients
    fn to_builder(&self) -> ClientBuilder {
        ClientBuilder {
            prefix: self.builder.prefix().to_string(),
            sink: self.sink(),
            variant: self.builder.variant(),
            default_sample_rate: self.default_sample_rate,
            tags: self.builder.default_tags().to_vec(),
            errors: Arc::clone(&self.errors),
        }
    }

    fn metric_builder<'a>(
        &'a self,
        metric_type: MetricType,
        name: &'a str,
        value: MetricResult<MetricValue>,
    ) -> MetricBuilder<'a, 'a> {
        match value {
            Ok(value) => MetricBuilder::new(metric_type, name, value, self),
            Err(e) => MetricBuilder::from_error(e, self),
        }
    }

    /// Run one metric call through the sample-encode-dispatch pipeline.
    pub(crate) fn emit(&self, metric: PendingMetric<'_>) -> MetricResult<()> {
        let sample_rate = metric.sample_rate.unwrap_or(self.default_sample_rate);
        if !(sample_rate > 0.0 && sample_rate <= 1.0) {
            return Err(MetricError::from((
                ErrorKind::InvalidInput,
                "sample rate must be in the range (0.0, 1.0]",
            )));
        }

        if !sampler::should_sample(sample_rate) {
            return Ok(());
        }

        let datagram = self.builder.datagram(
            metric.metric_type,
            metric.name,
            metric.value,
            sample_rate,
            &metric.tags,
        )?;
        self.sink.read().unwrap().accept(&datagram);
        Ok(())
    }

    pub(crate) fn consume_error(&self, err: MetricError) {
        (self.errors)(err);
    }
}

impl Default for Client {
    /// Construct a client that records nothing anywhere: empty prefix, the
    /// `Standard` protocol variant, a sample rate of `1.0`, and a `NopSink`.
    fn default() -> Self {
        Client::from_sink("", NopSink)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Client {{ variant: {:?}, prefix: {:?}, default_sample_rate: {:?}, default_tags: {:?}, sink: ..., errors: ... }}",
            self.builder.variant(),
            self.builder.prefix(),
            self.default_sample_rate,
            self.builder.default_tags(),
        )
    }
}

/// Guard that puts the previous sink back into a client's sink slot when
/// dropped, including during unwinding from a panicking capture scope.
struct SinkRestore<'a> {
    client: &'a Client,
    parent: Option<SharedSink>,
}

impl<'a> SinkRestore<'a> {
    fn install(client: &'a Client, sink: SharedSink, parent: SharedSink) -> Self {
        *client.sink.write().unwrap() = sink;
        SinkRestore {
            client,
            parent: Some(parent),
        }
    }
}

impl Drop for SinkRestore<'_> {
    fn drop(&mut self) {
        if let Some(parent) = self.parent.take() {
            *self.client.sink.write().unwrap() = parent;
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
fn nop_error_handler(_err: MetricError) {
    // nothing
}
