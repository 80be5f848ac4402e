use lambda_http::{Body, Error, Request, Response};
use runlog_store::config::{self, TRUCKS_TABLE_NAME};
use runlog_store::error::ConfigError;
use runlog_store::model::{string_attr, VIN_KEY};
use runlog_store::{Attributes, ItemStore, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

pub const SAVED_MESSAGE: &str = "Record saved successfully";

#[derive(Debug, Clone)]
pub struct Config {
    pub trucks_table: String,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Ok(Config {
            trucks_table: config::required(TRUCKS_TABLE_NAME)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AddTruckResponse {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AddTruckError {
    #[error("expected a JSON object")]
    NotAnObject,
    #[error("missing string field currentVin")]
    MissingVin,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Stores the truck description as given, replacing any earlier one for the
/// same `currentVin`. Field formats are checked by the API Gateway model.
pub async fn add_truck(payload: Value, trucks: &dyn ItemStore) -> Result<AddTruckResponse, AddTruckError> {
    let item: Attributes = match payload {
        Value::Object(item) => item,
        _ => return Err(AddTruckError::NotAnObject),
    };
    let vin = string_attr(&item, VIN_KEY)
        .ok_or(AddTruckError::MissingVin)?
        .to_string();
    trucks.put(item).await?;
    info!(vin = %vin, "saved truck");
    Ok(AddTruckResponse {
        message: String::from(SAVED_MESSAGE),
    })
}

pub async fn function_handler(event: Request, trucks: &dyn ItemStore) -> Result<Response<Body>, Error> {
    let payload: serde_json::Result<Value> = match event.body() {
        Body::Text(s) => serde_json::from_str(s),
        Body::Binary(b) => serde_json::from_slice(b),
        Body::Empty => return Ok(
            Response::builder()
                .status(400)
                .header("content-type", "text/plain")
                .body("Expected a request body.".into())
                .map_err(Box::new)?
        )
    };

    let payload = match payload {
        Ok(payload) => payload,
        Err(e) => {
            info!("error parsing body: {}", e);
            return Ok(bad_request(&e.to_string())?);
        }
    };
    info!("received payload: {}", payload);

    match add_truck(payload, trucks).await {
        Ok(r) => Ok(
            Response::builder()
                .status(200)
                .header("content-type", "application/json")
                .body(serde_json::to_string(&r)?.into())
                .map_err(Box::new)?
        ),
        Err(AddTruckError::Store(e)) => {
            error!("error saving truck: {}", e);
            Ok(Response::builder()
                .status(500)
                .header("content-type", "text/plain")
                .body("Internal Server Error".into())
                .map_err(Box::new)?
            )
        }
        Err(e) => Ok(bad_request(&e.to_string())?),
    }
}

fn bad_request(message: &str) -> Result<Response<Body>, Error> {
    let body = serde_json::json!({ "error": message });
    Ok(Response::builder()
        .status(400)
        .header("content-type", "application/json")
        .body(body.to_string().into())
        .map_err(Box::new)?
    )
}
