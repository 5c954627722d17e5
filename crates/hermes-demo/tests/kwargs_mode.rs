//! The kwargs mode: arguments bound by name, raw bodies.

use hermes_config::DispatchMode;
use hermes_test::TestClient;
use http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

fn client() -> TestClient {
    TestClient::from_server(hermes_demo::server_for(DispatchMode::Kwargs))
}

#[tokio::test]
async fn test_create_then_read() {
    let client = client();

    let created = client.post("/create").json(&json!({"name": "Ivan"})).send().await;
    created.assert_status(StatusCode::OK);
    let created = created.json_value().unwrap();
    assert_eq!(created["name"], "Ivan");
    let id: Uuid = created["id"].as_str().unwrap().parse().unwrap();

    let read = client.post("/read").json(&id).send().await;
    read.assert_status(StatusCode::OK);
    assert_eq!(read.json_value().unwrap(), created);
}

#[tokio::test]
async fn test_create_many() {
    let response = client()
        .post("/create")
        .json(&json!([{"name": "Ivan"}, {"name": "Oleg"}]))
        .send()
        .await;

    response.assert_status(StatusCode::OK);
    let body = response.json_value().unwrap();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Ivan", "Oleg"]);
}

#[tokio::test]
async fn test_create_validation_errors() {
    let client = client();
    for body in [
        json!({"wrong_arg_name": "foo"}),
        json!({"name": 1111111}),
        json!([{"name": 1111111}, {"name": 2222222}]),
    ] {
        let response = client.post("/create").json(&body).send().await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error = response.json_value().unwrap();
        assert_eq!(error["error_type"], "InputDataValidationError");
        assert!(error["error_message"]
            .as_str()
            .unwrap()
            .starts_with("ValidationError - argument 'data'"));
    }
}

#[tokio::test]
async fn test_read_missing_person_is_500() {
    let id = Uuid::new_v4();
    let response = client().post("/read").json(&id).send().await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let error = response.json_value().unwrap();
    assert!(error["error_type"].as_str().unwrap().ends_with("PersonNotFound"));
    assert_eq!(error["error_message"], format!("Person with id={id} not found!"));
}

#[tokio::test]
async fn test_read_bad_uuid_is_400() {
    let response = client().post("/read").json(&"wrong_uuid").send().await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_info_binds_path_param_and_request() {
    let response = client().get("/info/5").body("{}").send().await;

    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.json_value().unwrap(),
        Value::from("info_id=5 and request=<Request GET /info/5 >")
    );
}

#[tokio::test]
async fn test_info_non_numeric_id_is_400() {
    let response = client().get("/info/five").body("{}").send().await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
