//! Contract Test: Validation Before Mutation
//!
//! Constraints verified:
//! - Records route to the longest matching zone
//! - A record with no owning zone fails the pass before anything is submitted
//! - An endpoint without a value is rejected on its own; the rest still applies
//! - Default TTL is applied to unconfigured create/update endpoints only

mod common;

use common::*;
use zonesync_core::{
    ChangeAction, Changes, DnsBackend, Endpoint, Error, ReconcileConfig, RecordType,
};

fn a(name: &str, ip: &str) -> Endpoint {
    Endpoint::new(name, RecordType::A, [ip])
}

#[tokio::test]
async fn record_goes_to_most_specific_zone() {
    let transport = MockTransport::with_zones(&["example.com", "sub.example.com"]);
    let backend = backend(&transport);

    let changes = Changes {
        create: vec![a("a.sub.example.com", "192.0.2.1")],
        ..Changes::default()
    };
    backend.apply_changes(changes).await.expect("apply succeeds");

    let calls = transport.apply_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].zone, "sub.example.com");
    assert!(transport.records_in("example.com").is_empty());
}

#[tokio::test]
async fn unroutable_record_blocks_every_zone() {
    let transport = MockTransport::with_zones(&["example.com"]);
    let backend = backend(&transport);

    let changes = Changes {
        create: vec![
            a("ok.example.com", "192.0.2.1"),
            a("lost.example.org", "192.0.2.2"),
        ],
        ..Changes::default()
    };
    let err = backend.apply_changes(changes).await.unwrap_err();

    assert!(
        matches!(err, Error::Unroutable { ref name } if name == "lost.example.org"),
        "unexpected error: {err:?}"
    );
    assert!(err.is_validation());
    assert_eq!(transport.apply_call_count(), 0, "nothing may be submitted");
}

#[tokio::test]
async fn invalid_endpoint_does_not_block_unrelated_changes() {
    let transport = MockTransport::with_zones(&["example.com"]);
    let backend = backend(&transport);

    let changes = Changes {
        create: vec![
            Endpoint::new("empty.example.com", RecordType::A, Vec::<String>::new()),
            a("good.example.com", "192.0.2.1"),
        ],
        ..Changes::default()
    };
    let err = backend.apply_changes(changes).await.unwrap_err();

    assert!(
        matches!(err, Error::InvalidEndpoint { ref name, .. } if name == "empty.example.com"),
        "unexpected error: {err:?}"
    );

    let records = transport.records_in("example.com");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "good.example.com");
}

#[tokio::test]
async fn invalid_and_failed_zone_are_both_reported() {
    let transport = MockTransport::with_zones(&["example.com"]);
    transport.fail_zone("example.com");
    let backend = backend(&transport);

    let changes = Changes {
        create: vec![
            Endpoint::new("empty.example.com", RecordType::A, Vec::<String>::new()),
            a("good.example.com", "192.0.2.1"),
        ],
        ..Changes::default()
    };
    let err = backend.apply_changes(changes).await.unwrap_err();

    match err {
        Error::Multiple(errors) => {
            assert_eq!(errors.len(), 2);
            assert!(matches!(errors[0], Error::InvalidEndpoint { .. }));
            assert!(matches!(errors[1], Error::Submission(_)));
        }
        other => panic!("expected Multiple, got {other:?}"),
    }
}

#[tokio::test]
async fn default_ttl_fills_unconfigured_ttl_only() {
    let transport = MockTransport::with_zones(&["example.com"]);
    let backend = backend_with(&transport, ReconcileConfig::default().with_default_ttl(3600));

    let changes = Changes {
        create: vec![
            a("a.example.com", "1.2.3.4"),
            a("b.example.com", "1.2.3.5").with_ttl(3600),
            a("c.example.com", "1.2.3.6").with_ttl(120),
        ],
        delete: vec![a("d.example.com", "1.2.3.7")],
        ..Changes::default()
    };
    backend.apply_changes(changes).await.expect("apply succeeds");

    let calls = transport.apply_calls();
    let ttls: Vec<(ChangeAction, &str, Option<i64>)> = calls[0]
        .changes
        .iter()
        .map(|c| (c.action, c.record.name.as_str(), c.record.ttl))
        .collect();
    assert_eq!(
        ttls,
        vec![
            (ChangeAction::Create, "a.example.com", Some(3600)),
            (ChangeAction::Create, "b.example.com", Some(3600)),
            (ChangeAction::Create, "c.example.com", Some(120)),
            (ChangeAction::Delete, "d.example.com", None),
        ]
    );
}
