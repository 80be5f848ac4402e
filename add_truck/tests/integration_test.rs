use add_truck::{add_truck, function_handler, AddTruckError, SAVED_MESSAGE};
use lambda_http::{http, Body, Request, Response};
use runlog_store::memory::MemoryTable;
use runlog_store::model::VIN_KEY;
use serde_json::{json, Value};

fn post(body: Body) -> Request {
    http::Request::builder()
        .method("POST")
        .uri("/addtruck")
        .header("content-type", "application/json")
        .body(body)
        .unwrap()
}

fn body_json(response: &Response<Body>) -> Value {
    match response.body() {
        Body::Text(s) => serde_json::from_str(s).unwrap(),
        other => panic!("unexpected body {:?}", other),
    }
}

#[tokio::test]
async fn test_saves_payload_as_given() {
    let trucks = MemoryTable::new(VIN_KEY);
    let payload = json!({"currentVin": "E98123", "originalVin": "E98120"});

    let response = function_handler(post(Body::from(payload.to_string())), &trucks).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(body_json(&response), json!({"message": SAVED_MESSAGE}));
    assert_eq!(Value::Object(trucks.item("E98123").unwrap()), payload);
}

#[tokio::test]
async fn test_second_save_replaces_attributes() {
    let trucks = MemoryTable::new(VIN_KEY);
    let first = json!({"currentVin": "E98123", "originalVin": "E98120", "engine": "DD15"});
    let second = json!({"currentVin": "E98123", "originalVin": "E98120", "cab": "Sleeper"});

    add_truck(first, &trucks).await.unwrap();
    add_truck(second.clone(), &trucks).await.unwrap();

    assert_eq!(trucks.len(), 1);
    assert_eq!(Value::Object(trucks.item("E98123").unwrap()), second);
}

#[tokio::test]
async fn test_bad_requests() {
    let trucks = MemoryTable::new(VIN_KEY);

    let empty = function_handler(post(Body::Empty), &trucks).await.unwrap();
    assert_eq!(empty.status(), 400);

    let garbled = function_handler(post(Body::from("{not json")), &trucks).await.unwrap();
    assert_eq!(garbled.status(), 400);
    assert!(body_json(&garbled)["error"].is_string());

    let no_vin = function_handler(post(Body::from(r#"{"originalVin":"E98120"}"#)), &trucks).await.unwrap();
    assert_eq!(no_vin.status(), 400);
    assert_eq!(body_json(&no_vin), json!({"error": "missing string field currentVin"}));

    assert!(matches!(add_truck(json!(["E98123"]), &trucks).await, Err(AddTruckError::NotAnObject)));
    assert!(trucks.is_empty());
}

#[tokio::test]
async fn test_storage_fault_is_generic_failure() {
    let trucks = MemoryTable::new(VIN_KEY);
    trucks.fail_writes(true);

    let body = Body::from(r#"{"currentVin":"E98123","originalVin":"E98120"}"#);
    let response = function_handler(post(body), &trucks).await.unwrap();
    assert_eq!(response.status(), 500);
    assert!(trucks.is_empty());
}
