//! The simple mode: positional `(request, body)` handlers, raw bodies.

use hermes_config::DispatchMode;
use hermes_test::TestClient;
use http::StatusCode;
use serde_json::json;

fn client() -> TestClient {
    TestClient::from_server(hermes_demo::server_for(DispatchMode::Simple))
}

#[tokio::test]
async fn test_some_handler_echoes() {
    let response = client()
        .post("/some_handler")
        .json(&json!({"any": ["json", 1, null]}))
        .send()
        .await;

    response.assert_status(StatusCode::OK);
    assert_eq!(response.content_type(), Some("application/json; charset=utf-8"));
    assert_eq!(response.json_value().unwrap(), json!({"any": ["json", 1, null]}));
}

#[tokio::test]
async fn test_handler500() {
    let response = client().post("/handler500").json(&json!({})).send().await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json_value().unwrap();
    assert!(body["error_type"].as_str().unwrap().ends_with("ExampleFailure"));
    assert_eq!(body["error_message"], "Example of a 500 error");
}

#[tokio::test]
async fn test_malformed_body() {
    let response = client().post("/some_handler").body("{not json").send().await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json_value().unwrap()["error_type"], "MalformedBody");
}

#[tokio::test]
async fn test_wrong_method_and_unknown_path() {
    let client = client();

    let response = client.get("/some_handler").send().await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.header("allow"), Some("POST"));

    client.post("/create").body("{}").send().await.assert_status(StatusCode::NOT_FOUND);
}
