// Tactus - A Statsd and Dogstatsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::sinks::core::{SharedSink, Sink};
use crate::types::Datagram;
use std::fmt;
use std::sync::Mutex;

/// Implementation of a `Sink` that records every datagram it accepts.
///
/// Datagrams are cloned into an internal buffer in the order they are
/// accepted and can be inspected afterwards with the `datagrams` method.
/// When constructed with a parent sink, each datagram is recorded first
/// and then forwarded to the parent, so recording observes traffic
/// without suppressing it.
///
/// This sink is primarily useful for unit and integration testing. See
/// `Client::capture` for temporarily swapping one into a client.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tactus::{CaptureSink, Client};
///
/// let sink = Arc::new(CaptureSink::new());
/// let client = Client::builder("my.prefix", sink.clone()).build();
///
/// client.incr("requests").unwrap();
/// assert_eq!(1, sink.len());
/// ```
#[derive(Default)]
pub struct CaptureSink {
    parent: Option<SharedSink>,
    datagrams: Mutex<Vec<Datagram>>,
}

impl CaptureSink {
    /// Construct a new `CaptureSink` that records datagrams and discards
    /// them afterwards.
    pub fn new() -> CaptureSink {
        CaptureSink {
            parent: None,
            datagrams: Mutex::new(Vec::new()),
        }
    }

    /// Construct a new `CaptureSink` that records datagrams and then
    /// forwards them to the given parent sink.
    pub fn wrap(parent: SharedSink) -> CaptureSink {
        CaptureSink {
            parent: Some(parent),
            datagrams: Mutex::new(Vec::new()),
        }
    }

    /// Return the parent sink that accepted datagrams are forwarded to,
    /// if there is one.
    pub fn parent(&self) -> Option<&SharedSink> {
        self.parent.as_ref()
    }

    /// Return a copy of every datagram recorded so far, oldest first.
    ///
    /// The returned `Vec` is a snapshot: datagrams accepted after this
    /// call do not show up in it.
    pub fn datagrams(&self) -> Vec<Datagram> {
        self.datagrams.lock().unwrap().clone()
    }

    /// Return the number of datagrams recorded so far.
    pub fn len(&self) -> usize {
        self.datagrams.lock().unwrap().len()
    }

    /// Return true if no datagrams have been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.datagrams.lock().unwrap().is_empty()
    }

    /// Discard every datagram recorded so far.
    pub fn clear(&self) {
        self.datagrams.lock().unwrap().clear();
    }
}

impl Sink for CaptureSink {
    fn accept(&self, datagram: &Datagram) {
        // Buffer lock is released before forwarding so a parent can't
        // deadlock or poison this sink.
        self.datagrams.lock().unwrap().push(datagram.clone());
        if let Some(parent) = &self.parent {
            parent.accept(datagram);
        }
    }
}

impl fmt::Debug for CaptureSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSink")
            .field("parent", &self.parent.is_some())
            .field("datagrams", &self.datagrams)
            .finish()
    }
}
