// Tactus - A Statsd and Dogstatsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::client::Client;
use crate::types::{Datagram, ErrorKind, MetricError, MetricResult, MetricType, MetricValue};

pub(crate) mod sampler;

/// Wire protocol variant a client encodes datagrams for.
///
/// The variant is fixed when a client is built. `Standard` is the plain
/// Statsd protocol: tags are silently dropped and distribution or histogram
/// metrics are rejected. `Tagged` is the Dogstatsd dialect that renders a
/// `|#tag1,tag2` section and accepts all six metric types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVariant {
    Standard,
    Tagged,
}

impl ProtocolVariant {
    fn supports(&self, metric_type: MetricType) -> bool {
        match (self, metric_type) {
            (ProtocolVariant::Standard, MetricType::Distribution) => false,
            (ProtocolVariant::Standard, MetricType::Histogram) => false,
            _ => true,
        }
    }
}

/// Encoder that turns metric calls into `Datagram`s for one protocol
/// variant, metric prefix, and set of default tags.
///
/// Clients hold one of these internally; it is public so datagrams can be
/// produced without a client, for example when testing a custom sink.
///
/// The name given to [`datagram`](DatagramBuilder::datagram) is sanitized by
/// replacing each of `|`, `@` and `:` with `_`; the configured prefix is
/// trusted as-is. Tag keys and values have `|` and `,` stripped. The sample
/// rate is rendered as given whenever it is not `1.0`, so callers are
/// expected to validate rates first.
#[derive(Debug, Clone)]
pub struct DatagramBuilder {
    variant: ProtocolVariant,
    prefix: String,
    default_tags: Vec<(Option<String>, String)>,
}

impl DatagramBuilder {
    const TAG_PREFIX: &'static str = "|#";

    pub fn new(variant: ProtocolVariant, prefix: &str) -> Self {
        Self::with_default_tags(variant, prefix, Vec::new())
    }

    /// Create a builder whose datagrams carry `default_tags` in addition to
    /// any call-site tags. A default key-value tag is dropped when a
    /// call-site tag uses the same key; surviving defaults render first.
    pub fn with_default_tags(
        variant: ProtocolVariant,
        prefix: &str,
        default_tags: Vec<(Option<String>, String)>,
    ) -> Self {
        DatagramBuilder {
            variant,
            prefix: formatted_prefix(prefix),
            default_tags,
        }
    }

    pub fn variant(&self) -> ProtocolVariant {
        self.variant
    }

    pub(crate) fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn default_tags(&self) -> &[(Option<String>, String)] {
        &self.default_tags
    }

    /// Encode a single metric call into a `Datagram`.
    ///
    /// Fails with `ErrorKind::UnsupportedType` when the metric type is not
    /// expressible in this builder's protocol variant.
    pub fn datagram(
        &self,
        metric_type: MetricType,
        name: &str,
        value: MetricValue,
        sample_rate: f64,
        tags: &[(Option<&str>, &str)],
    ) -> MetricResult<Datagram> {
        if !self.variant.supports(metric_type) {
            return Err(MetricError::from((
                ErrorKind::UnsupportedType,
                "distribution and histogram metrics require the tagged protocol variant",
            )));
        }

        let name = self.metric_name(name);
        let tags = self.merge_tags(tags);

        let mut source = String::with_capacity(source_size_hint(&name, &value, sample_rate, &tags));
        source.push_str(&name);
        source.push(':');
        value.push_to(&mut source);
        source.push('|');
        source.push_str(metric_type.code());

        if sample_rate != 1.0 {
            source.push_str("|@");
            source.push_str(ryu::Buffer::new().format(sample_rate));
        }

        if let Some((first, rest)) = tags.split_first() {
            source.push_str(Self::TAG_PREFIX);
            source.push_str(first);
            for tag in rest {
                source.push(',');
                source.push_str(tag);
            }
        }

        Ok(Datagram::new(
            source,
            name,
            metric_type,
            value,
            sample_rate,
            tags,
        ))
    }

    fn metric_name(&self, name: &str) -> String {
        let mut out = String::with_capacity(self.prefix.len() + name.len());
        out.push_str(&self.prefix);
        if name.contains(is_reserved_name_char) {
            out.extend(
                name.chars()
                    .map(|c| if is_reserved_name_char(c) { '_' } else { c }),
            );
        } else {
            out.push_str(name);
        }
        out
    }

    fn merge_tags(&self, tags: &[(Option<&str>, &str)]) -> Vec<String> {
        if self.variant != ProtocolVariant::Tagged {
            return Vec::new();
        }

        let mut rendered = Vec::with_capacity(self.default_tags.len() + tags.len());
        for (key, value) in &self.default_tags {
            if let Some(key) = key {
                if tags.iter().any(|(k, _)| *k == Some(key.as_str())) {
                    continue;
                }
            }
            rendered.push(render_tag(key.as_deref(), value));
        }
        for &(key, value) in tags {
            rendered.push(render_tag(key, value));
        }
        rendered
    }
}

fn is_reserved_name_char(c: char) -> bool {
    matches!(c, '|' | '@' | ':')
}

fn render_tag(key: Option<&str>, value: &str) -> String {
    let mut out = String::with_capacity(value.len() + key.map_or(0, |k| k.len() + 1));
    if let Some(key) = key {
        push_sanitized_tag(&mut out, key);
        out.push(':');
    }
    push_sanitized_tag(&mut out, value);
    out
}

fn push_sanitized_tag(out: &mut String, part: &str) {
    out.extend(part.chars().filter(|&c| !matches!(c, '|' | ',')));
}

// expected number of bytes for the finished datagram so the wire string is
// allocated once: name, ':', value, '|', type code, then the optional rate
// and tag sections
fn source_size_hint(name: &str, value: &MetricValue, sample_rate: f64, tags: &[String]) -> usize {
    let mut size = name.len() + 1 + value.size_hint() + 1 + 2;
    if sample_rate != 1.0 {
        size += 2 + 10;
    }
    if !tags.is_empty() {
        size += DatagramBuilder::TAG_PREFIX.len();
        size += tags.iter().map(|t| t.len() + 1).sum::<usize>() - 1;
    }
    size
}

fn formatted_prefix(prefix: &str) -> String {
    if prefix.is_empty() {
        String::new()
    } else {
        format!("{}.", prefix.trim_end_matches('.'))
    }
}

/// Metric call waiting to be sampled, encoded, and dispatched.
#[derive(Debug)]
pub(crate) struct PendingMetric<'m> {
    pub(crate) metric_type: MetricType,
    pub(crate) name: &'m str,
    pub(crate) value: MetricValue,
    pub(crate) sample_rate: Option<f64>,
    pub(crate) tags: Vec<(Option<&'m str>, &'m str)>,
}

/// Internal state of a `MetricBuilder`
///
/// The builder can either be in the process of assembling a metric call to
/// send via a client or it can be simply holding on to an error that will be
/// dealt with when `.try_send()` or `.send()` is finally invoked.
#[derive(Debug)]
enum BuilderRepr<'m, 'c> {
    Success(PendingMetric<'m>, &'c Client),
    Error(MetricError, &'c Client),
}

/// Builder for adding tags or a sample rate to in-progress metrics.
///
/// This builder customizes a metric call that was previously started by one
/// of the `*_with_tags` methods on `Client`. The metric runs through the
/// sample-encode-dispatch pipeline when `MetricBuilder::send()` or
/// `MetricBuilder::try_send()` is invoked; any errors encountered
/// constructing, validating, or encoding the metric are propagated at that
/// point.
///
/// Tags are only rendered by clients using `ProtocolVariant::Tagged`; the
/// Standard variant drops them silently. For details on the tag format see
/// the [Datadog docs](https://docs.datadoghq.com/developers/dogstatsd/#datagram-format).
///
/// NOTE: The only way to instantiate an instance of this builder is via
/// methods on the `Client`.
///
/// # Examples
///
/// ## `.try_send()`
///
/// ```
/// use tactus::{Client, NopSink, ProtocolVariant};
///
/// let client = Client::builder("some.prefix", NopSink)
///     .with_protocol(ProtocolVariant::Tagged)
///     .build();
///
/// let datagrams = client.capture(|| {
///     client.increment_with_tags("some.key", 1)
///         .with_tag("host", "app11.example.com")
///         .with_tag("segment", "23")
///         .with_tag_value("beta")
///         .try_send()
///         .unwrap();
/// });
///
/// assert_eq!(
///     concat!(
///         "some.prefix.some.key:1|c|#",
///         "host:app11.example.com,",
///         "segment:23,",
///         "beta"
///     ),
///     datagrams[0].source()
/// );
/// ```
///
/// ## `.send()`
///
/// ```
/// use tactus::{Client, NopSink};
///
/// let client = Client::builder("some.prefix", NopSink)
///     .with_error_handler(|e| eprintln!("metric error: {}", e))
///     .build();
///
/// client.increment_with_tags("some.key", 1)
///     .with_sample_rate(0.5)
///     .send();
/// ```
///
/// Note that nothing is returned from the `.send()` method. Any errors
/// encountered in this case are passed to the error handler registered with
/// the client.
#[must_use = "Did you forget to call .send() after adding tags?"]
#[derive(Debug)]
pub struct MetricBuilder<'m, 'c> {
    repr: BuilderRepr<'m, 'c>,
}

impl<'m, 'c> MetricBuilder<'m, 'c> {
    pub(crate) fn new(
        metric_type: MetricType,
        name: &'m str,
        value: MetricValue,
        client: &'c Client,
    ) -> Self {
        MetricBuilder {
            repr: BuilderRepr::Success(
                PendingMetric {
                    metric_type,
                    name,
                    value,
                    sample_rate: None,
                    tags: Vec::new(),
                },
                client,
            ),
        }
    }

    pub(crate) fn from_error(err: MetricError, client: &'c Client) -> Self {
        MetricBuilder {
            repr: BuilderRepr::Error(err, client),
        }
    }

    /// Add a key-value tag to this metric.
    pub fn with_tag(mut self, key: &'m str, value: &'m str) -> Self {
        if let BuilderRepr::Success(ref mut metric, _) = self.repr {
            metric.tags.push((Some(key), value));
        }
        self
    }

    /// Add a value tag to this metric.
    pub fn with_tag_value(mut self, value: &'m str) -> Self {
        if let BuilderRepr::Success(ref mut metric, _) = self.repr {
            metric.tags.push((None, value));
        }
        self
    }

    /// Sample this call at `rate` instead of the client's default rate.
    ///
    /// Rates must lie in the range `(0.0, 1.0]`; anything else is rejected
    /// with `ErrorKind::InvalidInput` when the metric is sent.
    pub fn with_sample_rate(mut self, rate: f64) -> Self {
        if let BuilderRepr::Success(ref mut metric, _) = self.repr {
            metric.sample_rate = Some(rate);
        }
        self
    }

    /// Run this metric through the client's pipeline, propagating errors.
    ///
    /// `Ok(())` means the call was either dispatched to the sink or sampled
    /// out. Note that the builder is consumed by this method and thus
    /// `.try_send()` can only be called a single time per builder.
    pub fn try_send(self) -> MetricResult<()> {
        match self.repr {
            BuilderRepr::Error(err, _) => Err(err),
            BuilderRepr::Success(metric, client) => client.emit(metric),
        }
    }

    /// Run this metric through the client's pipeline, discarding successful
    /// results and invoking the client's error handler for error results.
    ///
    /// By default, if no handler is given, a "no-op" handler is used that
    /// simply discards all errors. If this isn't desired, a custom handler
    /// should be supplied when building the `Client` instance.
    ///
    /// Note that the builder is consumed by this method and thus `.send()`
    /// can only be called a single time per builder.
    pub fn send(self) {
        match self.repr {
            BuilderRepr::Error(err, client) => client.consume_error(err),
            BuilderRepr::Success(metric, client) => {
                if let Err(e) = client.emit(metric) {
                    client.consume_error(e);
                }
            }
        }
    }
}
