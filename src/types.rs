// Tactus - A Statsd and Dogstatsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::error;
use std::fmt;
use std::io;

/// Type of a metric, determining the `|<code>` section of its datagram.
///
/// `Distribution` and `Histogram` are only available with the Tagged
/// (Dogstatsd) protocol variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    Counter,
    Timing,
    Gauge,
    Set,
    Distribution,
    Histogram,
}

impl MetricType {
    /// Wire code for this type of metric.
    pub fn code(&self) -> &'static str {
        match self {
            MetricType::Counter => "c",
            MetricType::Timing => "ms",
            MetricType::Gauge => "g",
            MetricType::Set => "s",
            MetricType::Distribution => "d",
            MetricType::Histogram => "h",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Payload of a metric emission.
///
/// Integers are rendered without a fractional part, floats in their shortest
/// round-trip form (`4.0` stays `4.0`). Text values are used by `Set` metrics
/// to count distinct occurrences of string members.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

impl MetricValue {
    pub(crate) fn push_to(&self, out: &mut String) {
        match self {
            MetricValue::Signed(v) => out.push_str(itoa::Buffer::new().format(*v)),
            MetricValue::Unsigned(v) => out.push_str(itoa::Buffer::new().format(*v)),
            MetricValue::Float(v) => out.push_str(ryu::Buffer::new().format(*v)),
            MetricValue::Text(v) => out.push_str(v),
        }
    }

    pub(crate) fn size_hint(&self) -> usize {
        match self {
            MetricValue::Text(v) => v.len(),
            _ => 10,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Signed(v) => f.write_str(itoa::Buffer::new().format(*v)),
            MetricValue::Unsigned(v) => f.write_str(itoa::Buffer::new().format(*v)),
            MetricValue::Float(v) => f.write_str(ryu::Buffer::new().format(*v)),
            MetricValue::Text(v) => f.write_str(v),
        }
    }
}

/// A single encoded metric emission.
///
/// The `source` is the exact text handed to the sink and is a pure function
/// of the remaining fields plus the protocol variant that encoded them. The
/// parsed-out fields are retained so captured datagrams can be inspected
/// without re-parsing the wire text.
#[derive(Debug, Clone, PartialEq)]
pub struct Datagram {
    source: String,
    name: String,
    metric_type: MetricType,
    value: MetricValue,
    sample_rate: f64,
    tags: Vec<String>,
}

impl Datagram {
    pub(crate) fn new(
        source: String,
        name: String,
        metric_type: MetricType,
        value: MetricValue,
        sample_rate: f64,
        tags: Vec<String>,
    ) -> Self {
        Datagram {
            source,
            name,
            metric_type,
            value,
            sample_rate,
            tags,
        }
    }

    /// Full wire text of this datagram.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Metric name after prefixing and sanitization.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    pub fn value(&self) -> &MetricValue {
        &self.value
    }

    /// Rate this emission was sampled at. A rate of `1.0` means the call was
    /// not sampled and no `|@` section appears in the source.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Rendered tags in emission order. Empty when no tags apply, always
    /// empty for the Standard protocol variant.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl fmt::Display for Datagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Potential categories an error from this library falls into.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ErrorKind {
    InvalidInput,
    UnsupportedType,
    IoError,
}

#[derive(Debug)]
enum ErrorRepr {
    WithDescription(ErrorKind, &'static str),
    IoError(io::Error),
}

/// Error generated by this library potentially due to invalid input, a
/// metric type the configured protocol variant cannot express, or IO errors
/// while setting up a transport.
#[derive(Debug)]
pub struct MetricError {
    repr: ErrorRepr,
}

impl MetricError {
    /// Return the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::WithDescription(kind, _) => kind,
            ErrorRepr::IoError(_) => ErrorKind::IoError,
        }
    }
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr {
            ErrorRepr::WithDescription(_, desc) => desc.fmt(f),
            ErrorRepr::IoError(ref err) => err.fmt(f),
        }
    }
}

impl error::Error for MetricError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.repr {
            ErrorRepr::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for MetricError {
    fn from(err: io::Error) -> Self {
        MetricError {
            repr: ErrorRepr::IoError(err),
        }
    }
}

impl From<(ErrorKind, &'static str)> for MetricError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> Self {
        MetricError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

pub type MetricResult<T> = Result<T, MetricError>;

#[cfg(test)]
mod tests {
    use super::{Datagram, ErrorKind, MetricError, MetricType, MetricValue};
    use std::error::Error;
    use std::io;

    #[test]
    fn test_metric_type_codes() {
        assert_eq!("c", MetricType::Counter.code());
        assert_eq!("ms", MetricType::Timing.code());
        assert_eq!("g", MetricType::Gauge.code());
        assert_eq!("s", MetricType::Set.code());
        assert_eq!("d", MetricType::Distribution.code());
        assert_eq!("h", MetricType::Histogram.code());
    }

    #[test]
    fn test_metric_value_signed() {
        assert_eq!("-5", MetricValue::Signed(-5).to_string());
    }

    #[test]
    fn test_metric_value_unsigned() {
        assert_eq!("42", MetricValue::Unsigned(42).to_string());
    }

    #[test]
    fn test_metric_value_float_keeps_fraction_marker() {
        assert_eq!("4.0", MetricValue::Float(4.0).to_string());
        assert_eq!("0.5", MetricValue::Float(0.5).to_string());
        assert_eq!("21.5", MetricValue::Float(21.5).to_string());
    }

    #[test]
    fn test_metric_value_text() {
        assert_eq!(
            "some-user",
            MetricValue::Text("some-user".to_string()).to_string()
        );
    }

    #[test]
    fn test_datagram_accessors() {
        let datagram = Datagram::new(
            "prefix.thing:1|c|@0.5|#a:b".to_string(),
            "prefix.thing".to_string(),
            MetricType::Counter,
            MetricValue::Signed(1),
            0.5,
            vec!["a:b".to_string()],
        );

        assert_eq!("prefix.thing:1|c|@0.5|#a:b", datagram.source());
        assert_eq!("prefix.thing", datagram.name());
        assert_eq!(MetricType::Counter, datagram.metric_type());
        assert_eq!(&MetricValue::Signed(1), datagram.value());
        assert_eq!(0.5, datagram.sample_rate());
        assert_eq!(&["a:b".to_string()], datagram.tags());
        assert_eq!("prefix.thing:1|c|@0.5|#a:b", datagram.to_string());
    }

    #[test]
    fn test_error_kind_from_description() {
        let err = MetricError::from((ErrorKind::InvalidInput, "bad input"));
        assert_eq!(ErrorKind::InvalidInput, err.kind());
        assert_eq!("bad input", err.to_string());
        assert!(err.source().is_none());
    }

    #[test]
    fn test_error_kind_from_io_error() {
        let err = MetricError::from(io::Error::new(io::ErrorKind::TimedOut, "timed out"));
        assert_eq!(ErrorKind::IoError, err.kind());
        assert!(err.source().is_some());
    }
}
