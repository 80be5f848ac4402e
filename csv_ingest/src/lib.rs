use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{Error, LambdaEvent};
use percent_encoding::percent_decode_str;
use runlog_store::config::{self, RECORDS_TABLE_NAME, TRUCKS_TABLE_NAME};
use runlog_store::error::ConfigError;
use runlog_store::model::telemetry_record;
use runlog_store::registry::ensure_vehicle;
use runlog_store::{FilenameError, ItemStore, PipelineError, TelemetryFilename};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub trucks_table: String,
    pub records_table: String,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Ok(Config {
            trucks_table: config::required(TRUCKS_TABLE_NAME)?,
            records_table: config::required(RECORDS_TABLE_NAME)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Created,
    AlreadyPresent,
    Rejected(FilenameError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub key: String,
    pub status_code: u16,
    pub message: String,
}

impl IngestResponse {
    fn new(key: String, outcome: IngestOutcome) -> Self {
        let (status_code, message) = match outcome {
            IngestOutcome::Created => (200, String::from("Record created")),
            IngestOutcome::AlreadyPresent => (200, String::from("Record already exists")),
            IngestOutcome::Rejected(e) => (e.status_code(), e.to_string()),
        };
        IngestResponse { key, status_code, message }
    }
}

/// Registers one uploaded telemetry file. Safe to repeat for the same key:
/// the truck stub and the record are each written at most once.
pub async fn ingest_object(
    key: &str,
    trucks: &dyn ItemStore,
    records: &dyn ItemStore,
) -> Result<IngestOutcome, PipelineError> {
    let file = match TelemetryFilename::parse(key) {
        Ok(file) => file,
        Err(e) => {
            warn!(key, kind = e.kind(), "rejecting upload: {}", e);
            return Ok(IngestOutcome::Rejected(e));
        }
    };
    info!(
        vin = %file.vin,
        date = %file.date,
        data_filename = %file.data_filename,
        filename = %file.filename,
        "validated telemetry file"
    );

    let vehicle = ensure_vehicle(trucks, &file.vin).await?;

    if records.get(&file.filename).await?.is_some() {
        info!(filename = %file.filename, "record found, skipping");
        return Ok(IngestOutcome::AlreadyPresent);
    }

    info!(filename = %file.filename, "no record found, creating");
    let record = telemetry_record(&vehicle, &file);
    if records.put_if_absent(record).await? {
        Ok(IngestOutcome::Created)
    } else {
        info!(filename = %file.filename, "record created concurrently");
        Ok(IngestOutcome::AlreadyPresent)
    }
}

/// S3 delivers keys form-encoded: `+` for space, `%XX` for everything else.
pub fn decode_object_key(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

pub async fn function_handler(
    event: LambdaEvent<S3Event>,
    trucks: &dyn ItemStore,
    records: &dyn ItemStore,
) -> Result<Vec<IngestResponse>, Error> {
    let mut responses = Vec::with_capacity(event.payload.records.len());
    for record in &event.payload.records {
        let bucket = record.s3.bucket.name.as_deref().unwrap_or_default();
        let key = match record.s3.object.key.as_deref() {
            Some(raw) => decode_object_key(raw),
            None => {
                warn!(bucket, "ignoring notification without an object key");
                continue;
            }
        };
        info!(bucket, key = %key, "processing upload");

        let outcome = ingest_object(&key, trucks, records).await.map_err(|e| {
            error!(bucket, key = %key, "ingest failed: {}", e);
            e
        })?;
        responses.push(IngestResponse::new(key, outcome));
    }
    Ok(responses)
}
