use assert_matches::assert_matches;
use reqwest::Method;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_database::{DatabaseError, SupabaseClient};
use shared_utils::test_utils::TestConfig;

fn client_for(server: &MockServer) -> SupabaseClient {
    let config = TestConfig::default()
        .with_supabase_url(&format!("{}/", server.uri()))
        .to_app_config();
    SupabaseClient::new(&config)
}

#[tokio::test]
async fn test_requests_carry_key_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/things"))
        .and(header("apikey", "test-anon-key"))
        .and(header("authorization", "Bearer test-anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.get_base_url(), server.uri());

    let rows: Vec<Value> = client.request(Method::GET, "/rest/v1/things", None).await.unwrap();
    assert_eq!(rows, vec![json!({"id": 1})]);
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let server = MockServer::start().await;
    for (route, status) in [("/unauthorized", 401), ("/missing", 404), ("/conflict", 409), ("/broken", 503)] {
        Mock::given(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&server)
            .await;
    }
    let client = client_for(&server);

    let unauthorized = client.request::<Value>(Method::GET, "/unauthorized", None).await;
    let missing = client.request::<Value>(Method::GET, "/missing", None).await;
    let conflict = client.request::<Value>(Method::POST, "/conflict", Some(json!({}))).await;
    let broken = client.request::<Value>(Method::GET, "/broken", None).await;

    assert_matches!(unauthorized, Err(DatabaseError::Auth(_)));
    assert_matches!(missing, Err(DatabaseError::NotFound(_)));
    assert_matches!(conflict, Err(DatabaseError::Conflict(_)));
    assert_matches!(broken, Err(DatabaseError::Api { status: 503, .. }));
}

#[tokio::test]
async fn test_undecodable_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let result = client_for(&server).request::<Value>(Method::GET, "/rest/v1/things", None).await;
    assert_matches!(result, Err(DatabaseError::Decode(_)));
}
