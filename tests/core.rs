use std::time::Duration;
use tactus::{Client, NopSink, ProtocolVariant};
use utils::run_arc_threaded_test;

mod utils;

fn new_nop_client(prefix: &str) -> Client {
    Client::builder(prefix, NopSink)
        .with_protocol(ProtocolVariant::Tagged)
        .build()
}

#[test]
fn test_client_increment() {
    let client = new_nop_client("client.test");
    let datagrams = client.capture(|| {
        client.increment("counter.key", 42).unwrap();
    });

    assert_eq!("client.test.counter.key:42|c", datagrams[0].source());
}

#[test]
fn test_client_measure_duration() {
    let client = new_nop_client("client.test");
    let datagrams = client.capture(|| {
        client.measure("timer.key", Duration::from_millis(35)).unwrap();
    });

    assert_eq!("client.test.timer.key:35|ms", datagrams[0].source());
}

#[test]
fn test_client_gauge_f64() {
    let client = new_nop_client("client.test");
    let datagrams = client.capture(|| {
        client.gauge("gauge.key", 5.5).unwrap();
    });

    assert_eq!("client.test.gauge.key:5.5|g", datagrams[0].source());
}

#[test]
fn test_client_set_text() {
    let client = new_nop_client("client.test");
    let datagrams = client.capture(|| {
        client.set("set.key", "bob").unwrap();
    });

    assert_eq!("client.test.set.key:bob|s", datagrams[0].source());
}

#[test]
fn test_client_distribution() {
    let client = new_nop_client("client.test");
    let datagrams = client.capture(|| {
        client.distribution("distribution.key", 22).unwrap();
    });

    assert_eq!("client.test.distribution.key:22|d", datagrams[0].source());
}

#[test]
fn test_client_histogram() {
    let client = new_nop_client("client.test");
    let datagrams = client.capture(|| {
        client.histogram("histogram.key", 20).unwrap();
    });

    assert_eq!("client.test.histogram.key:20|h", datagrams[0].source());
}

#[test]
fn test_client_tagged_metric() {
    let client = new_nop_client("client.test");
    let datagrams = client.capture(|| {
        client
            .increment_with_tags("counter.key", 3)
            .with_tag("host", "web03.example.com")
            .with_tag_value("beta-test")
            .try_send()
            .unwrap();
    });

    assert_eq!(
        "client.test.counter.key:3|c|#host:web03.example.com,beta-test",
        datagrams[0].source()
    );
}

#[test]
fn test_client_with_options_derived_client() {
    let client = Client::from_sink("client.test", NopSink);

    let datagrams = client.with_options(
        |options| options.with_protocol(ProtocolVariant::Tagged).with_tag("env", "qa"),
        |derived| {
            derived.capture(|| {
                derived.incr("derived.key").unwrap();
            })
        },
    );

    assert_eq!("client.test.derived.key:1|c|#env:qa", datagrams[0].source());
    assert_eq!(ProtocolVariant::Standard, client.protocol());
}

#[test]
fn test_client_nop_sink_single_threaded() {
    let client = new_nop_client("tactus");
    run_arc_threaded_test(client, 1, 1);
}

#[test]
fn test_client_nop_sink_many_threaded() {
    let client = new_nop_client("tactus");
    run_arc_threaded_test(client, 4, 4);
}
