//! Contract Test: Retrieval Failures
//!
//! Constraints verified:
//! - A failed zone listing aborts the pass before any mutation
//! - A failed record listing in any zone fails `records()` as a whole

mod common;

use common::*;
use zonesync_core::{Changes, DnsBackend, Endpoint, Error, RecordType, RemoteRecord};

#[tokio::test]
async fn zone_listing_failure_aborts_apply() {
    let transport = MockTransport::with_zones(&["example.com"]);
    transport.fail_zone_listing();
    let backend = backend(&transport);

    let changes = Changes {
        create: vec![Endpoint::new("a.example.com", RecordType::A, ["192.0.2.1"])],
        ..Changes::default()
    };
    let err = backend.apply_changes(changes).await.unwrap_err();

    assert!(matches!(err, Error::Retrieval(_)), "unexpected error: {err:?}");
    assert!(err.is_retryable());
    assert_eq!(transport.apply_call_count(), 0);
}

#[tokio::test]
async fn zone_listing_failure_aborts_records() {
    let transport = MockTransport::with_zones(&["example.com"]);
    transport.fail_zone_listing();
    let backend = backend(&transport);

    assert!(matches!(backend.records().await, Err(Error::Retrieval(_))));
}

#[tokio::test]
async fn one_failed_zone_fails_whole_observation() {
    let transport = MockTransport::with_zones(&["a.test", "b.test"]);
    transport.seed("a.test", RemoteRecord::new("www.a.test", "A", "192.0.2.1", Some(300)));
    transport.fail_listing("b.test");
    let backend = backend(&transport);

    match backend.records().await {
        Err(Error::Retrieval(msg)) => assert!(msg.contains("b.test")),
        other => panic!("expected Retrieval error, got {other:?}"),
    }
}

#[tokio::test]
async fn observation_order_follows_zone_order() {
    let transport = MockTransport::with_zones(&["b.test", "a.test"]);
    transport.seed("b.test", RemoteRecord::new("www.b.test", "A", "192.0.2.2", Some(300)));
    transport.seed("a.test", RemoteRecord::new("www.a.test", "A", "192.0.2.1", Some(300)));
    transport.seed("a.test", RemoteRecord::new("api.a.test", "A", "192.0.2.3", Some(300)));
    let backend = backend(&transport);

    let names: Vec<String> = backend
        .records()
        .await
        .expect("records succeed")
        .into_iter()
        .map(|ep| ep.name)
        .collect();

    assert_eq!(names, vec!["www.a.test", "api.a.test", "www.b.test"]);
}
