#![allow(clippy::unwrap_used)]
// Integration tests for `NetBoxClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nbsetup_api::{Collection, Error, Filter, NetBoxClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, NetBoxClient) {
    let server = MockServer::start().await;
    let token = secrecy::SecretString::from("0123456789abcdef".to_owned());
    let client =
        NetBoxClient::from_token(&server.uri(), &token, &TransportConfig::default()).unwrap();
    (server, client)
}

fn page(results: &[Value]) -> Value {
    json!({
        "count": results.len(),
        "next": null,
        "previous": null,
        "results": results,
    })
}

// ── Lookup ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_lookup_sends_token_and_filter() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/tenancy/tenants/"))
        .and(header("Authorization", "Token 0123456789abcdef"))
        .and(query_param("name", "Acme"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(&[json!({"id": 3, "name": "Acme"})])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let found = client
        .lookup(&Collection::TENANTS, &Filter::by("name", "Acme"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, 3);
    assert_eq!(found.str_field("name"), Some("Acme"));
}

#[tokio::test]
async fn test_lookup_no_match_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/sites/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[])))
        .mount(&server)
        .await;

    let found = client
        .lookup(&Collection::SITES, &Filter::by("name", "nowhere"))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_lookup_many_is_ambiguous() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/ipam/vrfs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 3,
            "next": null,
            "previous": null,
            "results": [{"id": 1, "name": "blue"}, {"id": 2, "name": "blue"}],
        })))
        .mount(&server)
        .await;

    let err = client
        .lookup(&Collection::VRFS, &Filter::by("name", "blue"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Ambiguous { count: 3, .. }), "{err:?}");
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_lookup_renders_null_filter() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/ipam/prefixes/"))
        .and(query_param("prefix", "10.1.0.0/24"))
        .and(query_param("vrf_id", "null"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[])))
        .expect(1)
        .mount(&server)
        .await;

    let filter = Filter::by("prefix", "10.1.0.0/24").and("vrf_id", Value::Null);
    let found = client.lookup(&Collection::PREFIXES, &filter).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_unauthorized_is_invalid_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/sites/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Invalid token"})))
        .mount(&server)
        .await;

    let err = client
        .lookup(&Collection::SITES, &Filter::by("name", "x"))
        .await
        .unwrap_err();
    match err {
        Error::InvalidToken { message } => assert_eq!(message, "Invalid token"),
        other => panic!("expected InvalidToken, got {other:?}"),
    }
}

// ── Bulk create ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_bulk_create_posts_list() {
    let (server, client) = setup().await;
    let bodies = vec![
        json!({"name": "Acme", "slug": "acme"}),
        json!({"name": "Globex", "slug": "globex"}),
    ];

    Mock::given(method("POST"))
        .and(path("/api/tenancy/tenants/"))
        .and(body_json(&bodies))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": 10, "name": "Acme", "slug": "acme"},
            {"id": 11, "name": "Globex", "slug": "globex"},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .bulk_create(&Collection::TENANTS, &bodies)
        .await
        .unwrap();
    let ids: Vec<u64> = created.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![10, 11]);
}

#[tokio::test]
async fn test_bulk_create_parses_field_errors() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/dcim/sites/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!([
            {},
            {"slug": ["site with this slug already exists."]},
            {},
        ])))
        .mount(&server)
        .await;

    let err = client
        .bulk_create(
            &Collection::SITES,
            &[json!({"name": "a"}), json!({"name": "b"}), json!({"name": "c"})],
        )
        .await
        .unwrap_err();

    assert!(err.is_recoverable());
    let errors = err.validation_errors().unwrap();
    assert_eq!(errors.entries().len(), 3);
    let failed: Vec<_> = errors.failed().collect();
    assert_eq!(failed.len(), 1);
    let fields: Vec<_> = failed[0].iter().map(|(f, _)| f.to_owned()).collect();
    assert_eq!(fields, vec!["slug".to_owned()]);
}

#[tokio::test]
async fn test_server_error_is_fatal() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/dcim/sites/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client
        .bulk_create(&Collection::SITES, &[json!({"name": "a"})])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Api { status: 500, .. }));
    assert!(!err.is_recoverable());
}

// ── Delete / status ─────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_by_id() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/dcim/device-types/42/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .delete(&Collection::DEVICE_TYPES, 42)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_status_reports_version() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/status/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"netbox-version": "3.7.8"})),
        )
        .mount(&server)
        .await;

    assert_eq!(client.status().await.unwrap().as_deref(), Some("3.7.8"));
}
