use std::future::Future;

use aws_lambda_events::event::s3::S3Event;
use csv_ingest::{function_handler, ingest_object, IngestOutcome};
use lambda_runtime::{Context, LambdaEvent};
use runlog_store::memory::MemoryTable;
use runlog_store::model::{FILENAME_KEY, VIN_KEY};
use runlog_store::{FilenameError, ItemStore, PipelineError};
use serde_json::{json, Value};

const KEY: &str = "E98123_2023_05_01_PQR.csv";

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

fn tables() -> (MemoryTable, MemoryTable) {
    (MemoryTable::new(VIN_KEY), MemoryTable::new(FILENAME_KEY))
}

fn upload_event(keys: &[&str]) -> LambdaEvent<S3Event> {
    let records: Vec<Value> = keys.iter().map(|key| json!({
        "eventVersion": "2.1",
        "eventSource": "aws:s3",
        "awsRegion": "us-east-1",
        "eventTime": "2023-05-02T10:15:00.000Z",
        "eventName": "ObjectCreated:Put",
        "userIdentity": {"principalId": "EXAMPLE"},
        "requestParameters": {"sourceIPAddress": "127.0.0.1"},
        "responseElements": {
            "x-amz-request-id": "EXAMPLE123456789",
            "x-amz-id-2": "EXAMPLE123/5678abcdefghijklambdaisawesome/mnopqrstuvwxyzABCDEFGH"
        },
        "s3": {
            "s3SchemaVersion": "1.0",
            "configurationId": "testConfigRule",
            "bucket": {
                "name": "incomingcsvs",
                "ownerIdentity": {"principalId": "EXAMPLE"},
                "arn": "arn:aws:s3:::incomingcsvs"
            },
            "object": {
                "key": key,
                "size": 1024,
                "eTag": "0123456789abcdef0123456789abcdef",
                "sequencer": "0A1B2C3D4E5F678901"
            }
        }
    })).collect();
    let payload: S3Event = serde_json::from_value(json!({ "Records": records })).unwrap();
    LambdaEvent::new(payload, Context::default())
}

#[test]
fn test_upload_creates_stub_and_record() {
    let (trucks, records) = tables();
    let responses = block_on(function_handler(upload_event(&[KEY]), &trucks, &records)).unwrap();

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].status_code, 200);
    assert_eq!(Value::Object(trucks.item("E98123").unwrap()), json!({"currentVin": "E98123"}));
    assert_eq!(
        Value::Object(records.item(KEY).unwrap()),
        json!({
            "currentVin": "E98123",
            "date": "2023-05-01",
            "filename": KEY,
            "data_filename": "E98123_2023_05_01.MF4"
        })
    );
}

#[test]
fn test_redelivery_is_a_no_op() {
    let (trucks, records) = tables();
    block_on(async {
        assert_eq!(ingest_object(KEY, &trucks, &records).await.unwrap(), IngestOutcome::Created);
        let before = records.item(KEY).unwrap();
        assert_eq!(ingest_object(KEY, &trucks, &records).await.unwrap(), IngestOutcome::AlreadyPresent);
        assert_eq!(records.item(KEY).unwrap(), before);
    });
    assert_eq!(records.len(), 1);
    assert_eq!(trucks.len(), 1);
}

#[test]
fn test_record_snapshots_described_truck() {
    let (trucks, records) = tables();
    let truck = json!({"currentVin": "E98123", "originalVin": "E98120", "engine": "DD15", "cab": "Sleeper"});
    block_on(async {
        trucks.put(truck.as_object().unwrap().clone()).await.unwrap();
        ingest_object(KEY, &trucks, &records).await.unwrap();
    });

    let record = records.item(KEY).unwrap();
    assert_eq!(record.get("engine"), Some(&json!("DD15")));
    assert_eq!(record.get("originalVin"), Some(&json!("E98120")));
    assert_eq!(Value::Object(trucks.item("E98123").unwrap()), truck);
}

#[test]
fn test_invalid_keys_are_handled_without_writes() {
    let (trucks, records) = tables();
    let event = upload_event(&["X98123_2023_05_01_PQR.csv", "%3Cscript%3E.csv", "E98123_2023_02_30_PQR.csv"]);
    let responses = block_on(function_handler(event, &trucks, &records)).unwrap();

    let statuses: Vec<u16> = responses.iter().map(|r| r.status_code).collect();
    assert_eq!(statuses, vec![400, 400, 400]);
    assert_eq!(responses[0].message, "Invalid VIN");
    assert_eq!(responses[1].key, "<script>.csv");
    assert_eq!(responses[2].message, "Invalid date");
    assert!(trucks.is_empty());
    assert!(records.is_empty());

    let outcome = block_on(ingest_object("<script>.csv", &trucks, &records)).unwrap();
    assert_eq!(outcome, IngestOutcome::Rejected(FilenameError::InvalidCharacters));
}

#[test]
fn test_orphan_stub_reconciles_on_redelivery() {
    let (trucks, records) = tables();
    records.fail_writes(true);

    let failed = block_on(function_handler(upload_event(&[KEY]), &trucks, &records));
    assert!(failed.is_err());
    assert_eq!(trucks.len(), 1);
    assert!(records.is_empty());

    records.fail_writes(false);
    let responses = block_on(function_handler(upload_event(&[KEY]), &trucks, &records)).unwrap();
    assert_eq!(responses[0].status_code, 200);
    assert_eq!(records.len(), 1);
    assert_eq!(trucks.len(), 1);
}

#[test]
fn test_registry_fault_stops_before_record() {
    let (trucks, records) = tables();
    trucks.fail_writes(true);

    let result = block_on(ingest_object(KEY, &trucks, &records));
    assert!(matches!(result, Err(PipelineError::Storage(_))));
    assert!(records.is_empty());
}

#[test]
fn test_concurrent_record_insert_is_already_present() {
    let (trucks, records) = tables();
    let winner = json!({"filename": KEY, "currentVin": "E98123", "date": "2023-05-01", "source": "other"});
    block_on(async {
        records.put(winner.as_object().unwrap().clone()).await.unwrap();
        // the existence check runs before the other invocation's insert lands
        records.miss_next_gets(1);
        assert_eq!(ingest_object(KEY, &trucks, &records).await.unwrap(), IngestOutcome::AlreadyPresent);
    });

    assert_eq!(records.len(), 1);
    assert_eq!(Value::Object(records.item(KEY).unwrap()), winner);
    assert_eq!(trucks.len(), 1);
}

#[test]
fn test_concurrent_truck_registration_keeps_winner() {
    let (trucks, records) = tables();
    let winner = json!({"currentVin": "E98123", "originalVin": "E98120", "engine": "DD15"});
    block_on(async {
        trucks.put(winner.as_object().unwrap().clone()).await.unwrap();
        trucks.miss_next_gets(1);
        assert_eq!(ingest_object(KEY, &trucks, &records).await.unwrap(), IngestOutcome::Created);
    });

    assert_eq!(trucks.len(), 1);
    assert_eq!(Value::Object(trucks.item("E98123").unwrap()), winner);
    assert_eq!(records.item(KEY).unwrap().get("engine"), Some(&json!("DD15")));
}
