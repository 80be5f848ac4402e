pub mod route;

use std::collections::HashMap;

use lambda_runtime::{Error, LambdaEvent};
use runlog_store::config::{self, CSV_BUCKET, MAPS_BUCKET, RECORDS_TABLE_NAME};
use runlog_store::error::ConfigError;
use runlog_store::filename::map_key_for;
use runlog_store::model::{FILENAME_KEY, MAP_ATTR};
use runlog_store::{ItemStore, ObjectStore, PipelineError};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::route::RouteMap;

pub const INSERT: &str = "INSERT";
const HTML_CONTENT_TYPE: &str = "text/html";

#[derive(Debug, Clone)]
pub struct Config {
    pub csv_bucket: String,
    pub maps_bucket: String,
    pub records_table: String,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Ok(Config {
            csv_bucket: config::required(CSV_BUCKET)?,
            maps_bucket: config::required(MAPS_BUCKET)?,
            records_table: config::required(RECORDS_TABLE_NAME)?,
        })
    }
}

/// The part of a DynamoDB stream batch this function reads.
#[derive(Debug, Deserialize)]
pub struct RecordStreamEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<StreamRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecord {
    pub event_name: String,
    pub dynamodb: StreamChange,
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamChange {
    /// Attributes in DynamoDB JSON, e.g. `{"filename": {"S": "..."}}`.
    #[serde(rename = "NewImage", default)]
    pub new_image: HashMap<String, Value>,
}

impl StreamChange {
    pub fn string_attr(&self, name: &str) -> Option<&str> {
        self.new_image.get(name)?.get("S")?.as_str()
    }
}

/// Where the map for a telemetry file came from and went to.
pub struct Stores<'a> {
    pub sources: &'a dyn ObjectStore,
    pub maps: &'a dyn ObjectStore,
    pub records: &'a dyn ItemStore,
}

/// Renders the route of one telemetry file and links it from its record.
/// Returns the key of the stored map.
pub async fn enrich_record(filename: &str, stores: &Stores<'_>) -> Result<String, PipelineError> {
    let data = stores.sources.get(filename).await.map_err(|e| {
        error!(filename, bucket = stores.sources.bucket(), "error reading the CSV file: {}", e);
        PipelineError::from(e)
    })?;

    let route = RouteMap::from_csv(&data).map_err(|e| {
        error!(filename, "error reading coordinates: {}", e);
        PipelineError::Render(e.to_string())
    })?;
    let html = route.render_html().map_err(|e| {
        error!(filename, "error rendering the map: {}", e);
        PipelineError::Render(e.to_string())
    })?;

    let map_key = map_key_for(filename);
    stores.maps.put(&map_key, html.into_bytes(), HTML_CONTENT_TYPE).await.map_err(|e| {
        error!(filename, bucket = stores.maps.bucket(), map_key = %map_key, "error uploading the map: {}", e);
        PipelineError::from(e)
    })?;
    info!(filename, map_key = %map_key, "uploaded the map");

    stores.records.set_attribute(filename, MAP_ATTR, Value::String(map_key.clone())).await.map_err(|e| {
        error!(filename, "could not update the record: {}", e);
        PipelineError::from(e)
    })?;
    info!(filename, map_key = %map_key, "updated record");
    Ok(map_key)
}

pub async fn function_handler(event: LambdaEvent<RecordStreamEvent>, stores: &Stores<'_>) -> Result<Vec<String>, Error> {
    let mut rendered = Vec::new();
    for record in &event.payload.records {
        if record.event_name != INSERT {
            info!(event_name = %record.event_name, "ignoring non-insert change");
            continue;
        }
        let filename = match record.dynamodb.string_attr(FILENAME_KEY) {
            Some(filename) => filename,
            None => return Err(Error::from("insert event without a filename")),
        };
        if let Some(existing) = record.dynamodb.string_attr(MAP_ATTR) {
            info!(filename, map_key = existing, "record already has a map, skipping");
            continue;
        }
        info!(filename, "processing file");
        rendered.push(enrich_record(filename, stores).await?);
    }
    Ok(rendered)
}
