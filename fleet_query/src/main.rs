use fleet_query::{function_handler, Config, Tables};
use lambda_http::{run, service_fn, Error, Request};
use runlog_store::config::{dynamodb_client, load_sdk_config};
use runlog_store::dynamo::DynamoTable;
use runlog_store::model::{FILENAME_KEY, VIN_KEY};

const TRACE_DEBUG: &str = "TRACE_DEBUG";

/// Serves `GET /alltrucks`, `GET /allrecords` and `DELETE /{filename}`.
#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(match std::env::var(TRACE_DEBUG) {
            Ok(_) => tracing::Level::DEBUG,
            Err(_) => tracing::Level::INFO
        })
        // disable printing the name of the module in every log line.
        .with_target(false)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();

    let config = Config::from_env()?;
    let sdk_config = load_sdk_config().await;
    let ddb_client = dynamodb_client(&sdk_config);
    let trucks = DynamoTable::new(ddb_client.clone(), config.trucks_table, VIN_KEY);
    let records = DynamoTable::new(ddb_client, config.records_table, FILENAME_KEY);
    let tables = Tables {
        trucks: &trucks,
        records: &records,
    };

    run(service_fn(|event: Request| function_handler(event, &tables))).await
}
