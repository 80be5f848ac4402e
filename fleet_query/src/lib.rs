use lambda_http::http::Method;
use lambda_http::{Body, Error, Request, Response};
use percent_encoding::percent_decode_str;
use runlog_store::config::{self, RECORDS_TABLE_NAME, TRUCKS_TABLE_NAME};
use runlog_store::error::ConfigError;
use runlog_store::ItemStore;
use serde_json::Value;
use tracing::{debug, info};

const ALL_TRUCKS: &str = "alltrucks";
const ALL_RECORDS: &str = "allrecords";

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

pub struct Tables<'a> {
    pub trucks: &'a dyn ItemStore,
    pub records: &'a dyn ItemStore,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Route {
    AllTrucks,
    AllRecords,
    DeleteRecord(String),
    MethodNotAllowed,
    NotFound,
}

impl Route {
    /// Only the last path segment matters, so stage prefixes such as
    /// `/prod/alltrucks` route the same as `/alltrucks`.
    pub fn resolve(method: &Method, path: &str) -> Route {
        let segment = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
        if segment.is_empty() {
            return Route::NotFound;
        }
        match segment {
            ALL_TRUCKS | ALL_RECORDS if *method != Method::GET => Route::MethodNotAllowed,
            ALL_TRUCKS => Route::AllTrucks,
            ALL_RECORDS => Route::AllRecords,
            filename if *method == Method::DELETE => {
                Route::DeleteRecord(percent_decode_str(filename).decode_utf8_lossy().into_owned())
            }
            _ if *method == Method::GET => Route::NotFound,
            _ => Route::MethodNotAllowed,
        }
    }
}

pub async fn function_handler(event: Request, tables: &Tables<'_>) -> Result<Response<Body>, Error> {
    let route = Route::resolve(event.method(), event.uri().path());
    debug!("{} {} -> {:?}", event.method(), event.uri().path(), route);
    match route {
        Route::AllTrucks => scan(tables.trucks).await,
        Route::AllRecords => scan(tables.records).await,
        Route::DeleteRecord(filename) => {
            tables.records.delete(&filename).await?;
            info!(filename = %filename, "deleted record");
            Ok(Response::builder()
                .status(200)
                .header("content-type", "application/json")
                .body("{}".into())
                .map_err(Box::new)?)
        }
        Route::MethodNotAllowed => plain(405, "Method Not Allowed"),
        Route::NotFound => plain(404, "Not Found"),
    }
}

async fn scan(table: &dyn ItemStore) -> Result<Response<Body>, Error> {
    let items: Vec<Value> = table.scan().await?
        .into_iter()
        .map(Value::Object)
        .collect();
    info!("returning {} items", items.len());
    Ok(Response::builder()
        .status(200)
        .header("content-type", "application/json")
        .body(serde_json::to_string(&items)?.into())
        .map_err(Box::new)?)
}

fn plain(status: u16, message: &str) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("content-type", "text/plain")
        .body(message.to_string().into())
        .map_err(Box::new)?)
}
