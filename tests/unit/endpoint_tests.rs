//! Unit tests for `host:port` endpoint parsing.

use splitlink::{AppError, Client, Endpoint};

#[test]
fn host_and_port_are_split_on_the_colon() {
    let endpoint = Endpoint::parse("127.0.0.1:16834").expect("valid endpoint");
    assert_eq!(endpoint.host(), "127.0.0.1");
    assert_eq!(endpoint.port(), 16834);
}

#[test]
fn hostname_endpoints_are_accepted() {
    let endpoint: Endpoint = "livesplit.local:9000".parse().expect("valid endpoint");
    assert_eq!(endpoint.host(), "livesplit.local");
    assert_eq!(endpoint.port(), 9000);
    assert_eq!(endpoint.to_string(), "livesplit.local:9000");
}

#[test]
fn missing_colon_is_rejected() {
    let err = Endpoint::parse("badstring").expect_err("no port");
    assert!(matches!(err, AppError::Endpoint(_)));
}

#[test]
fn extra_segments_are_rejected() {
    let err = Endpoint::parse("a:b:c").expect_err("three segments");
    assert!(matches!(err, AppError::Endpoint(_)));
}

#[test]
fn non_numeric_or_out_of_range_port_is_rejected() {
    for raw in ["localhost:http", "localhost:", "localhost:70000", "localhost:-1"] {
        assert!(
            matches!(Endpoint::parse(raw), Err(AppError::Endpoint(_))),
            "{raw} must be rejected"
        );
    }
}

#[test]
fn empty_host_is_rejected() {
    assert!(matches!(
        Endpoint::parse(":16834"),
        Err(AppError::Endpoint(_))
    ));
}

/// Construction fails synchronously for a malformed endpoint.
#[test]
fn client_construction_validates_endpoint() {
    assert!(matches!(Client::new("badstring"), Err(AppError::Endpoint(_))));
    assert!(matches!(Client::new("a:b:c"), Err(AppError::Endpoint(_))));

    let client = Client::new("127.0.0.1:16834").expect("valid endpoint");
    assert_eq!(client.endpoint().port(), 16834);
    assert!(!client.is_connected());
}
