//! HTTP status and protocol fault handling against the mock server.

#[path = "../common/mod.rs"]
#[allow(dead_code)]
mod common;

use common::mock_server::{saf_wrap, MockDnsdb, NDJSON};
use dnsdb2_client::{DnsdbError, QueryOptions};
use futures::StreamExt;
use serde_json::json;

#[tokio::test]
async fn forbidden_raises_before_any_record() {
    let server = MockDnsdb::start().await;
    server.enqueue(403, "text/plain", "Error: unauthorized");

    let result = server
        .client()
        .lookup_rrset("www.dnsdb.info", None, None, QueryOptions::new())
        .await;
    match result {
        Err(DnsdbError::AccessDenied(body)) => assert_eq!(body, "Error: unauthorized"),
        other => panic!("expected AccessDenied, got {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_maps_to_access_denied() {
    let server = MockDnsdb::start().await;
    server.enqueue(401, "text/plain", "bad key");

    let result = server.client().rate_limit().await;
    assert!(matches!(result, Err(DnsdbError::AccessDenied(_))));
}

#[tokio::test]
async fn not_found_is_an_empty_stream() {
    let server = MockDnsdb::start().await;
    server.enqueue(404, "text/plain", "no results");

    let mut stream = server
        .client()
        .lookup_rdata_name("nonexistent.example", None, QueryOptions::new())
        .await
        .expect("404 must not be an error for streaming queries");
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn not_found_is_an_error_for_metadata_queries() {
    let server = MockDnsdb::start().await;
    server.enqueue(404, "text/plain", "not found");

    assert!(matches!(
        server.client().rate_limit().await,
        Err(DnsdbError::Query(_))
    ));
}

#[tokio::test]
async fn bad_request_maps_to_query_error() {
    let server = MockDnsdb::start().await;
    server.enqueue(400, "text/plain", "Error: Bad Request: unsupported rrtype");

    let result = server
        .client()
        .lookup_rrset("www.dnsdb.info", Some("BOGUS"), None, QueryOptions::new())
        .await;
    assert!(matches!(result, Err(DnsdbError::Query(_))));
}

#[tokio::test]
async fn range_not_satisfiable_maps_to_offset_error() {
    let server = MockDnsdb::start().await;
    server.enqueue(416, "text/plain", "Error: offset greater than maximum");

    let opts = QueryOptions::new().with_offset(4_000_000);
    let result = server
        .client()
        .lookup_rdata_name("example.com", None, opts)
        .await;
    assert!(matches!(result, Err(DnsdbError::Offset(_))));
}

#[tokio::test]
async fn too_many_requests_maps_to_quota() {
    let server = MockDnsdb::start().await;
    server.enqueue(429, "text/plain", "Error: daily quota exceeded");

    let result = server
        .client()
        .lookup_rdata_name("example.com", None, QueryOptions::new())
        .await;
    assert!(matches!(result, Err(DnsdbError::QuotaExceeded(_))));
}

#[tokio::test]
async fn too_many_requests_concurrency_variant() {
    let server = MockDnsdb::start().await;
    server.enqueue(429, "text/plain", "Error: too many concurrent connections");

    let result = server
        .client()
        .lookup_rdata_name("example.com", None, QueryOptions::new())
        .await;
    assert!(matches!(result, Err(DnsdbError::ConcurrencyExceeded(_))));
}

#[tokio::test]
async fn server_fault_maps_to_query_error() {
    let server = MockDnsdb::start().await;
    server.enqueue(502, "text/plain", "bad gateway");

    let result = server
        .client()
        .lookup_rdata_name("example.com", None, QueryOptions::new())
        .await;
    assert!(matches!(result, Err(DnsdbError::Query(_))));
}

#[tokio::test]
async fn wrong_content_type_is_a_protocol_error() {
    let server = MockDnsdb::start().await;
    server.enqueue(200, "text/html", "<html>not a stream</html>");

    let result = server
        .client()
        .lookup_rdata_name("example.com", None, QueryOptions::new())
        .await;
    assert!(matches!(result, Err(DnsdbError::Protocol(_))));
}

#[tokio::test]
async fn garbage_mid_stream_yields_prior_records_then_fails() {
    let server = MockDnsdb::start().await;
    let lines = [
        r#"{"cond": "begin"}"#,
        r#"{"obj": {"n": 1}}"#,
        r#"{"obj": {"n": 2}}"#,
        "this is not json",
        r#"{"obj": {"n": 3}}"#,
    ];
    server.enqueue_saf(&lines);

    let mut stream = server
        .client()
        .lookup_rdata_name("example.com", None, QueryOptions::new())
        .await
        .expect("query accepted");

    assert_eq!(stream.next().await.unwrap().unwrap(), json!({"n": 1}));
    assert_eq!(stream.next().await.unwrap().unwrap(), json!({"n": 2}));
    match stream.next().await {
        Some(Err(DnsdbError::Protocol(_))) => {}
        other => panic!("expected Protocol error, got {other:?}"),
    }
    // The remainder of the stream is abandoned.
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn failed_sentinel_surfaces_as_query_failed() {
    let server = MockDnsdb::start().await;
    server.enqueue_saf(&[
        r#"{"cond": "begin"}"#,
        r#"{"obj": {"n": 1}}"#,
        r#"{"cond": "failed", "msg": "Processing timeout; results may be incomplete"}"#,
    ]);

    let mut stream = server
        .client()
        .lookup_rdata_name("example.com", None, QueryOptions::new())
        .await
        .expect("query accepted");
    assert_eq!(stream.next().await.unwrap().unwrap(), json!({"n": 1}));
    assert!(matches!(
        stream.next().await,
        Some(Err(DnsdbError::QueryFailed(_)))
    ));
}

#[tokio::test]
async fn eof_without_sentinel_is_truncated() {
    let server = MockDnsdb::start().await;
    server.enqueue_saf(&saf_wrap(&[json!({"n": 1})], None));

    let mut stream = server
        .client()
        .lookup_rdata_name("example.com", None, QueryOptions::new())
        .await
        .expect("query accepted");
    assert_eq!(stream.next().await.unwrap().unwrap(), json!({"n": 1}));
    assert!(matches!(
        stream.next().await,
        Some(Err(DnsdbError::QueryTruncated))
    ));
}

#[tokio::test]
async fn ping_failure_maps_through_the_taxonomy() {
    let server = MockDnsdb::start().await;
    server.enqueue(403, "text/plain", "nope");

    assert!(matches!(
        server.client().ping().await,
        Err(DnsdbError::AccessDenied(_))
    ));
}

#[tokio::test]
async fn empty_ndjson_body_is_truncated_not_empty() {
    let server = MockDnsdb::start().await;
    // A 200 stream that closes without any sentinel at all.
    server.enqueue(200, NDJSON, "");

    let mut stream = server
        .client()
        .lookup_rdata_name("example.com", None, QueryOptions::new())
        .await
        .expect("query accepted");
    assert!(matches!(
        stream.next().await,
        Some(Err(DnsdbError::QueryTruncated))
    ));
}
